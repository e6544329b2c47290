//! Text rendering for the console and file sinks.
//!
//! Both pieces are pure: no I/O and no failure modes.

pub mod chunk;
pub mod formatter;

pub use chunk::{Chunks, DEFAULT_CHUNK_SIZE, chunk};
pub use formatter::{TIMESTAMP_FORMAT, format_record, record_header};
