pub mod attribute_extractor;
pub mod domain_advisor;
pub mod product_filter;
pub mod ranker;

pub use attribute_extractor::*;
pub use domain_advisor::*;
pub use product_filter::*;
pub use ranker::*;
