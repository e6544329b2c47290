//! At-least-once delivery of remote events.
//!
//! [`RetryQueue`] is the producer-side handle: enqueue never blocks. A single
//! [`Uploader`] drains the queue, one send at a time; a failed event is put
//! back after a fixed delay by an independent timer task, so one failing
//! event never stalls the rest of the queue. Events are retried until they
//! are delivered or the process stops.

pub mod queue;
pub mod uploader;

pub use queue::{QueueError, QueuePolicy, QueueReceiver, QueueSnapshot, QueueStats, RetryQueue};
pub use uploader::{DEFAULT_RETRY_DELAY, Uploader};
