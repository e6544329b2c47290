pub mod date_pattern;
pub mod error;
pub mod rotating;

pub use date_pattern::DatePattern;
pub use error::StorageError;
pub use rotating::{DatedFile, RotatingFileStore, RotationConfig, RotationReport};
