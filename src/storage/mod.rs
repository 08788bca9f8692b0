pub mod csv_sink;
pub mod export_sink;
pub mod preference_store;
pub mod sheets_client;

pub use csv_sink::CsvSink;
pub use export_sink::*;
pub use preference_store::*;
pub use sheets_client::GoogleSheetsSink;
