use crate::domain::RemoteEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Retry queue is full (capacity {capacity})")]
    Full { capacity: usize },
    #[error("Retry queue is closed")]
    Closed,
}

/// Capacity policy of the retry queue.
///
/// `Unbounded` keeps every pending event in memory. With `Bounded`, a fresh
/// enqueue on a full queue is rejected; re-insertions of failed events wait
/// for space instead of being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueuePolicy {
    #[default]
    Unbounded,
    Bounded(usize),
}

impl QueuePolicy {
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(capacity) => QueuePolicy::Bounded(capacity.max(1)),
            None => QueuePolicy::Unbounded,
        }
    }
}

/// Counters shared by the queue handle, the uploader and retry timers.
#[derive(Debug, Default)]
pub struct QueueStats {
    outstanding: AtomicUsize,
    scheduled_retries: AtomicUsize,
    enqueued: AtomicU64,
    delivered: AtomicU64,
    attempts: AtomicU64,
    failures: AtomicU64,
    rejected: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueSnapshot {
    /// Events accepted but not yet delivered (queued, in flight or waiting to retry).
    pub outstanding: usize,
    /// Failed events currently waiting for their retry delay.
    pub scheduled_retries: usize,
    pub enqueued: u64,
    pub delivered: u64,
    pub attempts: u64,
    pub failures: u64,
    pub rejected: u64,
}

impl QueueStats {
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            outstanding: self.outstanding.load(Ordering::Acquire),
            scheduled_retries: self.scheduled_retries.load(Ordering::Acquire),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.scheduled_retries.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_retry_released(&self) {
        self.scheduled_retries.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn record_abandoned(&self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone)]
enum QueueTx {
    Unbounded(mpsc::UnboundedSender<RemoteEvent>),
    Bounded(mpsc::Sender<RemoteEvent>, usize),
}

#[derive(Debug)]
enum QueueRx {
    Unbounded(mpsc::UnboundedReceiver<RemoteEvent>),
    Bounded(mpsc::Receiver<RemoteEvent>),
}

/// Consumer end of the retry queue, owned by exactly one [`super::Uploader`].
#[derive(Debug)]
pub struct QueueReceiver {
    rx: QueueRx,
}

impl QueueReceiver {
    /// Next event in FIFO order, or `None` once every handle is dropped.
    pub async fn recv(&mut self) -> Option<RemoteEvent> {
        match &mut self.rx {
            QueueRx::Unbounded(rx) => rx.recv().await,
            QueueRx::Bounded(rx) => rx.recv().await,
        }
    }
}

/// Producer handle of the retry queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RetryQueue {
    tx: QueueTx,
    stats: Arc<QueueStats>,
}

impl RetryQueue {
    pub fn new(policy: QueuePolicy) -> (Self, QueueReceiver) {
        let (tx, rx) = match policy {
            QueuePolicy::Unbounded => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueTx::Unbounded(tx), QueueRx::Unbounded(rx))
            }
            QueuePolicy::Bounded(capacity) => {
                let capacity = capacity.max(1);
                let (tx, rx) = mpsc::channel(capacity);
                (QueueTx::Bounded(tx, capacity), QueueRx::Bounded(rx))
            }
        };

        let queue = Self {
            tx,
            stats: Arc::new(QueueStats::default()),
        };
        (queue, QueueReceiver { rx })
    }

    pub fn unbounded() -> (Self, QueueReceiver) {
        Self::new(QueuePolicy::Unbounded)
    }

    /// Append an event to the tail of the queue without waiting.
    pub fn enqueue(&self, event: RemoteEvent) -> Result<(), QueueError> {
        let result = match &self.tx {
            QueueTx::Unbounded(tx) => tx.send(event).map_err(|_| QueueError::Closed),
            QueueTx::Bounded(tx, capacity) => tx.try_send(event).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => QueueError::Full {
                    capacity: *capacity,
                },
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            }),
        };

        match result {
            Ok(()) => {
                self.stats.record_enqueued();
                Ok(())
            }
            Err(e) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Put a previously accepted event back at the tail, waiting for space on
    /// a bounded queue.
    pub(crate) async fn reinsert(&self, event: RemoteEvent) -> Result<(), QueueError> {
        match &self.tx {
            QueueTx::Unbounded(tx) => tx.send(event).map_err(|_| QueueError::Closed),
            QueueTx::Bounded(tx, _) => tx.send(event).await.map_err(|_| QueueError::Closed),
        }
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        self.stats.clone()
    }

    pub fn outstanding(&self) -> usize {
        self.stats.outstanding()
    }
}
