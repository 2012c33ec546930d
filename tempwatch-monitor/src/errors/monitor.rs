#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Monitor must be started from within a tokio runtime")]
    NoRuntime,
}
