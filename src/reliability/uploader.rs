use super::queue::{QueueReceiver, QueueStats, RetryQueue};
use crate::domain::{ErrorInfo, RemoteEvent};
use crate::sender::{RemoteSender, SendError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delay before a failed event is put back on the queue.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(15);

/// Single consumer of the retry queue.
///
/// Sends are strictly serialized. A failed event is handed to its own timer
/// task, which re-inserts it at the tail after `retry_delay`; the uploader moves
/// straight on to the next queued event. There is no attempt limit.
pub struct Uploader<S> {
    sender: S,
    queue: RetryQueue,
    receiver: QueueReceiver,
    retry_delay: Duration,
    stats: Arc<QueueStats>,
}

impl<S: RemoteSender> Uploader<S> {
    pub fn new(
        sender: S,
        queue: RetryQueue,
        receiver: QueueReceiver,
        retry_delay: Duration,
    ) -> Self {
        let stats = queue.stats();
        Self {
            sender,
            queue,
            receiver,
            retry_delay,
            stats,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Drain the queue until `cancel` fires. Pending retry timers are
    /// cancelled with it.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Starting remote uploader (retry_delay={:?})",
            self.retry_delay
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    break;
                }

                next = self.receiver.recv() => {
                    match next {
                        Some(event) => self.deliver(event, &cancel).await,
                        None => break,
                    }
                }
            }
        }

        let snapshot = self.stats.snapshot();
        info!(
            "Remote uploader stopped ({} delivered, {} outstanding)",
            snapshot.delivered, snapshot.outstanding
        );
    }

    async fn deliver(&self, event: RemoteEvent, cancel: &CancellationToken) {
        self.stats.record_attempt();

        let outcome = AssertUnwindSafe(self.sender.send(&event))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(SendError::Panicked(ErrorInfo::from_panic(&*payload).message))
            });

        match outcome {
            Ok(()) => {
                self.stats.record_delivered();
                debug!("Remote event {} delivered", event.event_id);
            }
            Err(e) => {
                warn!(
                    "Remote upload of event {} failed, retrying in {:?}: {}",
                    event.event_id, self.retry_delay, e
                );
                self.stats.record_failure();
                self.schedule_retry(event, cancel.clone());
            }
        }
    }

    fn schedule_retry(&self, event: RemoteEvent, cancel: CancellationToken) {
        let queue = self.queue.clone();
        let stats = self.stats.clone();
        let delay = self.retry_delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    stats.record_retry_released();
                    stats.record_abandoned();
                }
                _ = tokio::time::sleep(delay) => {
                    let event_id = event.event_id;
                    let result = queue.reinsert(event).await;
                    stats.record_retry_released();
                    if let Err(e) = result {
                        warn!("Dropping event {} on closed queue: {}", event_id, e);
                        stats.record_abandoned();
                    }
                }
            }
        });
    }
}
