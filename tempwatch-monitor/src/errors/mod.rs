pub mod monitor;
pub mod source;
pub mod store;

pub use monitor::MonitorError;
pub use source::SourceError;
pub use store::StoreError;
pub use tempwatch_api::models::ThresholdError;
