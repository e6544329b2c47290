#![allow(dead_code)]

use rask_log_fanout::domain::{ErrorInfo, LogLevel, LogRecord, RemoteEvent, UserContext};
use rask_log_fanout::sender::{RemoteSender, SendError};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Remote sender that fails a fixed number of attempts, then succeeds.
///
/// Events whose culprit is listed in `always_failing` never succeed.
#[derive(Default)]
pub struct ScriptedSender {
    failures_before_success: usize,
    always_failing: Vec<String>,
    panic_first: bool,
    calls: AtomicUsize,
    attempts: Mutex<Vec<RemoteEvent>>,
    delivered: Mutex<Vec<RemoteEvent>>,
}

impl ScriptedSender {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_times(failures: usize) -> Self {
        Self {
            failures_before_success: failures,
            ..Self::default()
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_times(usize::MAX)
    }

    pub fn failing_culprit(culprit: &str) -> Self {
        Self {
            always_failing: vec![culprit.to_string()],
            ..Self::default()
        }
    }

    pub fn panicking_once() -> Self {
        Self {
            panic_first: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> Vec<RemoteEvent> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<RemoteEvent> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_culprits(&self) -> Vec<String> {
        self.delivered()
            .into_iter()
            .map(|event| event.culprit)
            .collect()
    }
}

impl RemoteSender for ScriptedSender {
    async fn send(&self, event: &RemoteEvent) -> Result<(), SendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.attempts.lock().unwrap().push(event.clone());

        if self.panic_first && call == 1 {
            panic!("sender exploded");
        }
        if self.always_failing.contains(&event.culprit) || call <= self.failures_before_success {
            return Err(SendError::Other("simulated outage".to_string()));
        }

        self.delivered.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn event(culprit: &str) -> RemoteEvent {
    let record = error_record(culprit);
    RemoteEvent::from_record(&record, "1.0.0", UserContext::default())
}

pub fn error_record(message: &str) -> LogRecord {
    LogRecord::new("worker", LogLevel::Error, message)
        .with_error(ErrorInfo::new("IoError", "disk unplugged"))
        .with_stack_trace("at worker::run\nat main")
}

pub fn info_record(message: &str) -> LogRecord {
    LogRecord::new("worker", LogLevel::Info, message)
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
