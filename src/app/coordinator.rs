use super::console::ConsoleSink;
use super::context::{ContextProvider, render_context};
use crate::domain::{LogRecord, RemoteEvent, UserContext};
use crate::format::{DEFAULT_CHUNK_SIZE, chunk, format_record};
use crate::reliability::RetryQueue;
use crate::storage::RotatingFileStore;
use std::sync::Arc;
use tracing::warn;

/// Predicate deciding which records are reported to the remote service.
pub type RecordFilter = Arc<dyn Fn(&LogRecord) -> bool + Send + Sync>;

/// Default remote filter: only records that carry an error.
pub fn default_remote_filter() -> RecordFilter {
    Arc::new(|record: &LogRecord| record.has_error())
}

/// Which sinks besides the console run for this process. Decided once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkPolicy {
    pub file_enabled: bool,
    pub remote_enabled: bool,
}

impl SinkPolicy {
    pub fn decide(
        release_mode: bool,
        log_directory_configured: bool,
        remote_endpoint_configured: bool,
    ) -> Self {
        Self {
            file_enabled: release_mode && log_directory_configured,
            remote_enabled: release_mode && remote_endpoint_configured,
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordOutcome {
    pub console_chunks: usize,
    pub file_written: bool,
    pub remote_enqueued: bool,
}

/// Routes each record to the console, file and remote sinks, in that order.
///
/// Owns the only mutable pipeline state: the file store, the current user and
/// the last emitted context block. Records must be fed one at a time.
pub struct Coordinator {
    console: Arc<dyn ConsoleSink>,
    chunk_size: usize,
    context: Arc<dyn ContextProvider>,
    file_store: Option<RotatingFileStore>,
    retry_queue: Option<RetryQueue>,
    remote_filter: RecordFilter,
    user: UserContext,
    last_context: Option<String>,
}

impl Coordinator {
    /// A console-only coordinator.
    pub fn new(console: Arc<dyn ConsoleSink>, context: Arc<dyn ContextProvider>) -> Self {
        Self {
            console,
            chunk_size: DEFAULT_CHUNK_SIZE,
            context,
            file_store: None,
            retry_queue: None,
            remote_filter: default_remote_filter(),
            user: UserContext::default(),
            last_context: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_file_store(mut self, file_store: RotatingFileStore) -> Self {
        self.file_store = Some(file_store);
        self
    }

    pub fn with_retry_queue(mut self, retry_queue: RetryQueue) -> Self {
        self.retry_queue = Some(retry_queue);
        self
    }

    pub fn with_remote_filter(mut self, remote_filter: RecordFilter) -> Self {
        self.remote_filter = remote_filter;
        self
    }

    pub fn sinks(&self) -> SinkPolicy {
        SinkPolicy {
            file_enabled: self.file_store.is_some(),
            remote_enabled: self.retry_queue.is_some(),
        }
    }

    pub fn file_store(&self) -> Option<&RotatingFileStore> {
        self.file_store.as_ref()
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }

    /// Replace the current user. Applies to every record handled afterwards.
    pub fn set_user(&mut self, user: UserContext) {
        self.user = user;
    }

    /// The context block, if it differs from the one emitted last.
    fn changed_context(&mut self) -> Option<String> {
        let current = render_context(&self.context.context_info(), &self.user);
        if self.last_context.as_deref() == Some(current.as_str()) {
            return None;
        }
        self.last_context = Some(current.clone());
        Some(current)
    }

    pub async fn on_record(&mut self, record: &LogRecord) -> RecordOutcome {
        let mut outcome = RecordOutcome::default();

        let extra_lines = self.changed_context();
        let text = format_record(record, extra_lines.as_deref());

        for piece in chunk(&text, self.chunk_size) {
            self.console.write_chunk(piece);
            outcome.console_chunks += 1;
        }

        if let Some(store) = self.file_store.as_mut() {
            let mut line = text;
            line.push('\n');
            match store.append(&line).await {
                Ok(()) => outcome.file_written = true,
                Err(e) => warn!("Failed to write record to log file: {}", e),
            }
        }

        if let Some(queue) = &self.retry_queue
            && (self.remote_filter)(record)
        {
            let event =
                RemoteEvent::from_record(record, &self.context.app_version(), self.user.clone());
            match queue.enqueue(event) {
                Ok(()) => outcome.remote_enqueued = true,
                Err(e) => warn!("Failed to queue record for remote delivery: {}", e),
            }
        }

        outcome
    }
}
