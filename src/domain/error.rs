use thiserror::Error;

/// Top-level error type for the fan-out pipeline.
#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Sender error: {0}")]
    Sender(#[from] crate::sender::SendError),

    #[error("Queue error: {0}")]
    Queue(#[from] crate::reliability::QueueError),

    #[error("Pipeline closed")]
    PipelineClosed,

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}
