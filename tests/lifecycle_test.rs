use rask_log_fanout::app::{
    Config, ConsoleSink, LogSink, MemoryConsole, Pipeline, run_guarded,
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

static BODY_PANIC_LINE: AtomicU32 = AtomicU32::new(0);
static BACKGROUND_PANIC_LINE: AtomicU32 = AtomicU32::new(0);

fn load_settings() -> Result<u32, io::Error> {
    Err(io::Error::other("config missing"))
}

fn explode() -> Result<u32, io::Error> {
    BODY_PANIC_LINE.store(line!() + 1, Ordering::SeqCst);
    panic!("worker lost its mind");
}

fn background_job() -> u32 {
    BACKGROUND_PANIC_LINE.store(line!() + 1, Ordering::SeqCst);
    panic!("background job crashed");
}

// The panic hook is process-wide, so every guarded run lives in this one test.
#[tokio::test]
async fn test_guarded_runs_report_uncaught_failures() {
    let console = Arc::new(MemoryConsole::new());
    let pipeline = Pipeline::builder(Config::default())
        .console(console.clone() as Arc<dyn ConsoleSink>)
        .start()
        .await
        .unwrap();
    let handle = pipeline.handle();
    let sink: &dyn LogSink = &handle;

    let value = run_guarded(sink, "main", async { Ok::<_, io::Error>(7) }).await;
    assert_eq!(value, Some(7));
    handle.flush().await.unwrap();
    assert!(console.text().is_empty());

    let value = run_guarded(sink, "main", async { load_settings() }).await;
    assert!(value.is_none());
    handle.flush().await.unwrap();
    let text = console.text();
    assert!(text.contains("[main] [ERROR]"));
    assert!(text.contains("Uncaught error: config missing"));
    assert!(text.contains("Error: config missing"));

    console.clear();
    let value = run_guarded(sink, "main", async { explode() }).await;
    assert!(value.is_none());
    handle.flush().await.unwrap();
    let text = console.text();
    assert!(text.contains("[main] [FATAL]"));
    assert!(text.contains("Uncaught panic: worker lost its mind"));
    assert!(text.contains("Panic: worker lost its mind"));
    assert!(text.contains("panicked at"));

    // A panic in another task must not leak into the body's record.
    console.clear();
    let value = run_guarded(sink, "main", async {
        let joined = tokio::spawn(async { background_job() }).await;
        assert!(joined.is_err());
        explode()
    })
    .await;
    assert!(value.is_none());
    handle.flush().await.unwrap();
    let text = console.text();
    assert!(text.contains("Uncaught panic: worker lost its mind"));
    assert!(!text.contains("background job crashed"));
    let body_line = BODY_PANIC_LINE.load(Ordering::SeqCst);
    let background_line = BACKGROUND_PANIC_LINE.load(Ordering::SeqCst);
    assert!(text.contains(&format!("lifecycle_test.rs:{body_line}:")));
    assert!(!text.contains(&format!("lifecycle_test.rs:{background_line}:")));

    pipeline.shutdown(Duration::from_millis(50)).await.unwrap();
}
