// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Millisecond counters fit in u64
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. StorageError in storage module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

//! Log fan-out pipeline: one ordered stream of records delivered to the
//! console, a rotating set of daily files, and a remote error-tracking
//! service with at-least-once retry.

pub mod app;
pub mod domain;
pub mod format;
pub mod reliability;
pub mod sender;
pub mod storage;

// Re-export main types for easy access
pub use app::{App, Config, Pipeline, PipelineHandle};
pub use domain::{ErrorInfo, LogLevel, LogRecord, RemoteEvent, UserContext};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
