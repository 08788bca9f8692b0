pub mod concierge_config;
pub mod credentials;

pub use concierge_config::*;
pub use credentials::Credentials;
