//! Delivery of remote events to the error-tracking service.
//!
//! The pipeline only depends on [`RemoteSender`]; [`HttpEventSender`] is the
//! production implementation.

pub mod client;
pub mod remote;

pub use client::{ClientConfig, ClientStats, HttpEventSender, SenderStats};
pub use remote::{RemoteSender, SendError};
