use crate::domain::RemoteEvent;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SendError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Event rejected with HTTP {status}")]
    Rejected { status: u16 },
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Sender panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Other(String),
}

/// The single operation the pipeline needs from the error-tracking service.
///
/// `Ok(())` means the service acknowledged the event; any `Err` leaves the
/// event with the retry queue. Implementations should fail fast: the uploader
/// applies no timeout of its own and waits for each attempt to return.
pub trait RemoteSender: Send + Sync + 'static {
    fn send(&self, event: &RemoteEvent) -> impl Future<Output = Result<(), SendError>> + Send;
}

impl<T: RemoteSender> RemoteSender for Arc<T> {
    fn send(&self, event: &RemoteEvent) -> impl Future<Output = Result<(), SendError>> + Send {
        (**self).send(event)
    }
}
