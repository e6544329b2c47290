//! Domain layer for rask-log-fanout.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: One structured logging event handed to the pipeline
//! - `LogLevel`: Ordered record severity (Trace..Fatal)
//! - `ErrorInfo`: Opaque error attached to a record (type name + display form)
//! - `RemoteEvent` / `UserContext`: Payload delivered to the error-tracking service
//! - `FanoutError`: Top-level error type

pub mod error;
pub mod event;
pub mod log_level;
pub mod record;

pub use error::FanoutError;
pub use event::{RemoteEvent, Severity, UserContext};
pub use log_level::LogLevel;
pub use record::{ErrorInfo, LogRecord};
