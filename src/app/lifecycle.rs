use super::pipeline::LogSink;
use crate::domain::{ErrorInfo, LogLevel, LogRecord};
use futures::FutureExt;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::Arc;
use tracing::warn;

type PanicHook = Arc<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

thread_local! {
    /// Location and backtrace of the latest panic raised on this thread.
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Panic hook installed for the duration of a guarded body.
///
/// Records the location and backtrace of each panic in the panicking thread's
/// slot, then defers to the previously installed hook. The previous hook is
/// restored on drop.
struct PanicCapture {
    previous: PanicHook,
}

impl PanicCapture {
    fn install() -> Self {
        let previous: PanicHook = Arc::from(panic::take_hook());
        let _ = LAST_PANIC.try_with(|slot| slot.borrow_mut().take());

        let hook_previous = previous.clone();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("panicked at {}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "panicked at unknown location".to_string());
            let stack = format!("{location}\n{}", Backtrace::force_capture());
            let _ = LAST_PANIC.try_with(|slot| *slot.borrow_mut() = Some(stack));
            hook_previous(info);
        }));

        Self { previous }
    }

    /// The unwinding panic was raised on the thread polling the body, so the
    /// latest entry in this thread's slot belongs to it.
    fn take_stack(&self) -> Option<String> {
        LAST_PANIC.try_with(|slot| slot.borrow_mut().take()).ok().flatten()
    }
}

impl Drop for PanicCapture {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let _ = panic::take_hook();
        let previous = self.previous.clone();
        panic::set_hook(Box::new(move |info| previous(info)));
    }
}

/// Run `body`, routing an uncaught error or panic through the pipeline.
///
/// A returned `Err` becomes an `Error` record and a panic becomes a `Fatal`
/// record; both carry the error and a stack trace and go to every enabled
/// sink. Returns `None` when the body failed. The panic hook is process-wide,
/// so only one guarded body should run at a time.
pub async fn run_guarded<F, T, E>(sink: &dyn LogSink, logger_name: &str, body: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let capture = PanicCapture::install();
    let outcome = AssertUnwindSafe(body).catch_unwind().await;
    let panic_stack = if outcome.is_err() {
        capture.take_stack()
    } else {
        None
    };
    drop(capture);

    let record = match outcome {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(e)) => LogRecord::new(logger_name, LogLevel::Error, format!("Uncaught error: {e}"))
            .with_error(ErrorInfo::from_error(&e))
            .with_stack_trace(Backtrace::force_capture().to_string()),
        Err(payload) => {
            let error = ErrorInfo::from_panic(&*payload);
            let mut record = LogRecord::new(
                logger_name,
                LogLevel::Fatal,
                format!("Uncaught panic: {}", error.message),
            )
            .with_error(error);
            record.stack_trace = panic_stack;
            record
        }
    };

    if let Err(e) = sink.submit(record) {
        warn!("Could not report uncaught failure: {}", e);
    }
    None
}
