pub mod config;
pub mod console;
pub mod context;
pub mod coordinator;
pub mod lifecycle;
pub mod logging_system;
pub mod pipeline;
pub mod shutdown;

pub use config::{Config, ConfigError, LogFormat, LogLevel, RuntimeMode};
pub use console::{ConsoleSink, MemoryConsole, StdoutConsole};
pub use context::{ContextProvider, StaticContext};
pub use coordinator::{Coordinator, RecordFilter, RecordOutcome, SinkPolicy, default_remote_filter};
pub use lifecycle::run_guarded;
pub use logging_system::{InitializationError, LoggingSystem, setup_logging_safe};
pub use pipeline::{LogSink, Pipeline, PipelineBuilder, PipelineHandle};

use crate::domain::{LogLevel as RecordLevel, LogRecord};
use anyhow::Context as _;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// How long shutdown waits for the retry queue to drain.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(4);

/// Logger name given to plain-text stdin lines.
const STDIN_LOGGER: &str = "stdin";

pub struct App {
    config: Config,
    pipeline: Pipeline,
}

impl App {
    pub async fn from_args<I, T>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::load(args).context("Failed to load configuration")?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        if let Err(e) = setup_logging_safe(&config) {
            eprintln!("Warning: diagnostics unavailable: {e}");
        }

        info!("Starting rask-log-fanout v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Configuration: remote_endpoint={:?}, log_directory={:?}, max_log_files={}, retry_delay={:?}",
            config.remote_endpoint, config.log_directory, config.max_log_files, config.retry_delay
        );

        let pipeline = Pipeline::builder(config.clone())
            .start()
            .await
            .context("Failed to start log pipeline")?;

        Ok(Self { config, pipeline })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Feed stdin lines into the pipeline until EOF or a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let handle = self.pipeline.handle();

        tokio::select! {
            _ = run_guarded(&handle, "rask-log-fanout", forward_stdin(&handle)) => {
                info!("Input closed");
            }
            _ = shutdown::wait_for_signal() => {}
        }

        self.pipeline.shutdown(SHUTDOWN_GRACE).await?;
        info!("rask-log-fanout stopped.");
        Ok(())
    }
}

async fn forward_stdin(handle: &PipelineHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        handle.log(parse_line(&line))?;
    }
    Ok(())
}

/// A JSON `LogRecord` per line; anything else becomes an `Info` message.
pub fn parse_line(line: &str) -> LogRecord {
    serde_json::from_str(line).unwrap_or_else(|_| LogRecord::new(STDIN_LOGGER, RecordLevel::Info, line))
}

// Main entry point for the application
pub async fn main() -> anyhow::Result<()> {
    let app = match App::from_args(std::env::args()).await {
        Ok(app) => app,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            eprintln!("rask-log-fanout: {e:#}");
            std::process::exit(1);
        }
    };

    app.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_json_record() {
        let record = parse_line(
            r#"{"logger_name":"api","level":"error","message":"boom","error":{"type_name":"IoError","message":"reset"}}"#,
        );
        assert_eq!(record.logger_name, "api");
        assert_eq!(record.level, RecordLevel::Error);
        assert!(record.has_error());
    }

    #[test]
    fn test_parse_line_plain_text() {
        let record = parse_line("service started");
        assert_eq!(record.logger_name, STDIN_LOGGER);
        assert_eq!(record.level, RecordLevel::Info);
        assert_eq!(record.message, "service started");
        assert!(!record.has_error());
    }
}
