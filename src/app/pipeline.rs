use super::Config;
use super::console::{ConsoleSink, StdoutConsole};
use super::context::{ContextProvider, StaticContext};
use super::coordinator::{Coordinator, RecordFilter, SinkPolicy, default_remote_filter};
use crate::domain::{FanoutError, LogRecord, UserContext};
use crate::reliability::{QueuePolicy, QueueStats, RetryQueue, Uploader};
use crate::sender::{ClientConfig, HttpEventSender, RemoteSender};
use crate::storage::RotatingFileStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Capability to hand records to the pipeline.
///
/// Producers receive a sink instead of reaching for a process-wide logger.
pub trait LogSink: Send + Sync {
    fn submit(&self, record: LogRecord) -> Result<(), FanoutError>;
}

enum Command {
    Record(LogRecord),
    SetUser(UserContext),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Cloneable producer handle of a running pipeline.
///
/// Commands are applied strictly in submission order, so a user change only
/// affects records submitted after it.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl PipelineHandle {
    pub fn log(&self, record: LogRecord) -> Result<(), FanoutError> {
        self.send(Command::Record(record))
    }

    pub fn set_user(&self, user: UserContext) -> Result<(), FanoutError> {
        self.send(Command::SetUser(user))
    }

    pub fn clear_user(&self) -> Result<(), FanoutError> {
        self.set_user(UserContext::default())
    }

    /// Wait until every command submitted before this call has been handled.
    pub async fn flush(&self) -> Result<(), FanoutError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Command::Flush(done_tx))?;
        done_rx.await.map_err(|_| FanoutError::PipelineClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, command: Command) -> Result<(), FanoutError> {
        self.tx.send(command).map_err(|_| FanoutError::PipelineClosed)
    }
}

impl LogSink for PipelineHandle {
    fn submit(&self, record: LogRecord) -> Result<(), FanoutError> {
        self.log(record)
    }
}

pub struct PipelineBuilder<S = HttpEventSender> {
    config: Config,
    console: Arc<dyn ConsoleSink>,
    context: Option<Arc<dyn ContextProvider>>,
    remote_filter: RecordFilter,
    sender: Option<S>,
}

impl PipelineBuilder<HttpEventSender> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            console: Arc::new(StdoutConsole),
            context: None,
            remote_filter: default_remote_filter(),
            sender: None,
        }
    }
}

impl<S: RemoteSender> PipelineBuilder<S> {
    pub fn console(mut self, console: Arc<dyn ConsoleSink>) -> Self {
        self.console = console;
        self
    }

    pub fn context_provider(mut self, context: Arc<dyn ContextProvider>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn remote_filter(mut self, remote_filter: RecordFilter) -> Self {
        self.remote_filter = remote_filter;
        self
    }

    /// Deliver remote events through `sender` instead of the HTTP sender
    /// built from the configured endpoint.
    pub fn remote_sender<T: RemoteSender>(self, sender: T) -> PipelineBuilder<T> {
        PipelineBuilder {
            config: self.config,
            console: self.console,
            context: self.context,
            remote_filter: self.remote_filter,
            sender: Some(sender),
        }
    }

    /// Decide the sink policy, prepare the enabled sinks and spawn the
    /// record loop and, if remote delivery is on, the uploader.
    ///
    /// A log directory that cannot be prepared disables the file sink for the
    /// lifetime of the pipeline instead of failing startup.
    pub async fn start(self) -> Result<Pipeline, FanoutError> {
        let config = self.config;
        let policy = SinkPolicy::decide(
            config.release_mode(),
            config.log_directory.is_some(),
            config.remote_endpoint.is_some(),
        );
        let context = self
            .context
            .unwrap_or_else(|| Arc::new(StaticContext::detect(config.app_version())));

        let mut coordinator = Coordinator::new(self.console, context)
            .with_chunk_size(config.console_chunk_size)
            .with_remote_filter(self.remote_filter);

        if policy.file_enabled
            && let Some(rotation) = config.rotation_config()?
        {
            match RotatingFileStore::setup(rotation).await {
                Ok(store) => coordinator = coordinator.with_file_store(store),
                Err(e) => warn!("File logging disabled: {}", e),
            }
        }

        let cancel = CancellationToken::new();
        let mut uploader_task = None;
        let mut queue_stats = None;

        if policy.remote_enabled {
            let (queue, receiver) =
                RetryQueue::new(QueuePolicy::from_capacity(config.retry_queue_capacity));
            queue_stats = Some(queue.stats());

            let task = match self.sender {
                Some(sender) => {
                    Uploader::new(sender, queue.clone(), receiver, config.retry_delay)
                        .spawn(cancel.clone())
                }
                None => {
                    let endpoint = config.remote_endpoint.clone().unwrap_or_default();
                    let sender = HttpEventSender::new(ClientConfig::new(endpoint))?;
                    Uploader::new(sender, queue.clone(), receiver, config.retry_delay)
                        .spawn(cancel.clone())
                }
            };
            uploader_task = Some(task);
            coordinator = coordinator.with_retry_queue(queue);
        }

        let sinks = coordinator.sinks();
        info!(
            "Log pipeline started (file={}, remote={}, release_mode={})",
            sinks.file_enabled,
            sinks.remote_enabled,
            config.release_mode()
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let record_task = tokio::spawn(run_record_loop(coordinator, rx));

        Ok(Pipeline {
            handle: PipelineHandle { tx },
            sinks,
            record_task,
            uploader_task,
            queue_stats,
            cancel,
        })
    }
}

/// Handle records one at a time, in arrival order, until shutdown.
///
/// Shutdown closes the channel, so later submissions fail with
/// `PipelineClosed`; commands already queued are still handled.
async fn run_record_loop(mut coordinator: Coordinator, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Record(record) => {
                coordinator.on_record(&record).await;
            }
            Command::SetUser(user) => coordinator.set_user(user),
            Command::Flush(done) => {
                let _ = done.send(());
            }
            Command::Shutdown => rx.close(),
        }
    }
    info!("Record loop stopped");
}

/// A running pipeline: the record loop plus the optional uploader.
pub struct Pipeline {
    handle: PipelineHandle,
    sinks: SinkPolicy,
    record_task: JoinHandle<()>,
    uploader_task: Option<JoinHandle<()>>,
    queue_stats: Option<Arc<QueueStats>>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn builder(config: Config) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    pub fn sinks(&self) -> SinkPolicy {
        self.sinks
    }

    /// Retry queue counters, when remote delivery is enabled.
    pub fn queue_stats(&self) -> Option<Arc<QueueStats>> {
        self.queue_stats.clone()
    }

    /// Stop accepting records after those already submitted, give the
    /// uploader up to `grace` to empty the retry queue, then stop it.
    ///
    /// Events still undelivered after the grace period are abandoned.
    pub async fn shutdown(self, grace: Duration) -> Result<(), FanoutError> {
        info!("Initiating pipeline shutdown...");

        if self.handle.send(Command::Shutdown).is_err() {
            warn!("Record loop already stopped");
        }
        self.record_task
            .await
            .map_err(|e| FanoutError::Shutdown(format!("Record loop failed: {e}")))?;

        if let Some(stats) = &self.queue_stats {
            let start = Instant::now();
            while stats.outstanding() > 0 && start.elapsed() < grace {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            let outstanding = stats.outstanding();
            if outstanding > 0 {
                error!(
                    "Abandoning {} undelivered remote events at shutdown",
                    outstanding
                );
            }
        }

        self.cancel.cancel();
        if let Some(task) = self.uploader_task {
            task.await
                .map_err(|e| FanoutError::Shutdown(format!("Uploader failed: {e}")))?;
        }

        info!("Pipeline shutdown completed");
        Ok(())
    }
}
