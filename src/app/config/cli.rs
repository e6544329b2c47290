use super::{ConfigError, LogFormat, LogLevel, RuntimeMode};
use crate::format::DEFAULT_CHUNK_SIZE;
use crate::storage::date_pattern::DEFAULT_DATE_PATTERN;
use crate::storage::rotating::DEFAULT_MAX_LOG_FILES;
use crate::storage::{DatePattern, RotationConfig};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory used when the log directory is configured as an empty string.
pub const DEFAULT_LOG_SUBDIRECTORY: &str = "rask-log-fanout";

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Error-tracking endpoint URL (remote delivery is disabled when absent)
    #[arg(long, env = "FANOUT_REMOTE_ENDPOINT")]
    pub remote_endpoint: Option<String>,

    /// Delay before a failed remote delivery is retried, in seconds
    #[arg(long, env = "FANOUT_RETRY_DELAY_SECS", default_value = "15")]
    pub retry_delay_secs: u64,

    /// Maximum number of events waiting for remote delivery (unbounded when absent)
    #[arg(long, env = "FANOUT_RETRY_QUEUE_CAPACITY")]
    pub retry_queue_capacity: Option<usize>,

    /// Directory for daily log files; empty selects the platform temp directory
    /// (file logging is disabled when absent)
    #[arg(long, env = "FANOUT_LOG_DIRECTORY")]
    pub log_directory: Option<String>,

    /// Number of dated log files kept on disk
    #[arg(long, env = "FANOUT_MAX_LOG_FILES", default_value = "10")]
    pub max_log_files: usize,

    /// Date pattern used to name log files (y, M and d fields)
    #[arg(long, env = "FANOUT_DATE_FORMAT", default_value = DEFAULT_DATE_PATTERN)]
    pub date_format: String,

    /// Extension appended to log file names; empty for none
    #[arg(long, env = "FANOUT_FILE_EXTENSION", default_value = "log")]
    pub file_extension: String,

    /// Maximum characters per console write
    #[arg(long, env = "FANOUT_CONSOLE_CHUNK_SIZE", default_value = "800")]
    pub console_chunk_size: usize,

    /// Run file and remote sinks even in debug mode
    #[arg(long, env = "FANOUT_ENABLE_IN_DEBUG_MODE")]
    pub enable_in_debug_mode: bool,

    /// Debug/release mode of the host
    #[arg(long, env = "FANOUT_RUNTIME_MODE", default_value = "auto")]
    pub runtime_mode: RuntimeMode,

    /// Release version reported with remote events (defaults to the crate version)
    #[arg(long, env = "FANOUT_APP_VERSION")]
    pub app_version: Option<String>,

    /// Diagnostic log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Diagnostic output format
    #[arg(long, env = "FANOUT_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Extra diagnostic filter directives, e.g. `rask_log_fanout::storage=debug`
    #[arg(long, env = "FANOUT_LOG_FILTER", value_delimiter = ',')]
    pub log_filter: Vec<String>,

    /// Configuration file path (optional). Its values only fill settings left
    /// at their defaults by the command line and environment.
    #[arg(long, env = "FANOUT_CONFIG_FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_endpoint: None,
            retry_delay_secs: 15,
            retry_queue_capacity: None,
            log_directory: None,
            max_log_files: DEFAULT_MAX_LOG_FILES,
            date_format: DEFAULT_DATE_PATTERN.to_string(),
            file_extension: "log".to_string(),
            console_chunk_size: DEFAULT_CHUNK_SIZE,
            enable_in_debug_mode: false,
            runtime_mode: RuntimeMode::Auto,
            app_version: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            log_filter: Vec::new(),
            config_file: None,
            retry_delay: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse arguments and environment, then fill the settings they left
    /// unset from the config file, if one is named.
    pub fn load<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);

        if let Some(path) = config.config_file.clone() {
            let file_config = Self::from_file(&path)?;
            config.merge_unset(file_config);
        }

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Take `base` values for fields still at their default.
    fn merge_unset(&mut self, base: Config) {
        let defaults = Config::default();

        if self.remote_endpoint.is_none() {
            self.remote_endpoint = base.remote_endpoint;
        }
        fill_default(&mut self.retry_delay_secs, base.retry_delay_secs, defaults.retry_delay_secs);
        if self.retry_queue_capacity.is_none() {
            self.retry_queue_capacity = base.retry_queue_capacity;
        }
        if self.log_directory.is_none() {
            self.log_directory = base.log_directory;
        }
        fill_default(&mut self.max_log_files, base.max_log_files, defaults.max_log_files);
        fill_default(&mut self.date_format, base.date_format, defaults.date_format);
        fill_default(&mut self.file_extension, base.file_extension, defaults.file_extension);
        fill_default(
            &mut self.console_chunk_size,
            base.console_chunk_size,
            defaults.console_chunk_size,
        );
        self.enable_in_debug_mode |= base.enable_in_debug_mode;
        fill_default(&mut self.runtime_mode, base.runtime_mode, defaults.runtime_mode);
        if self.app_version.is_none() {
            self.app_version = base.app_version;
        }
        fill_default(&mut self.log_level, base.log_level, defaults.log_level);
        fill_default(&mut self.log_format, base.log_format, defaults.log_format);
        fill_default(&mut self.log_filter, base.log_filter, defaults.log_filter);
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.retry_delay = Duration::from_secs(self.retry_delay_secs);
        Ok(())
    }

    /// Release mode as seen by the sink policy.
    pub fn release_mode(&self) -> bool {
        self.runtime_mode.is_release() || self.enable_in_debug_mode
    }

    pub fn app_version(&self) -> String {
        self.app_version
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }

    /// `None` disables file logging; an empty setting selects the platform
    /// temp directory.
    pub fn resolved_log_directory(&self) -> Option<PathBuf> {
        match self.log_directory.as_deref() {
            None => None,
            Some("") => Some(std::env::temp_dir().join(DEFAULT_LOG_SUBDIRECTORY)),
            Some(dir) => Some(PathBuf::from(dir)),
        }
    }

    pub fn rotation_config(&self) -> Result<Option<RotationConfig>, ConfigError> {
        let Some(directory) = self.resolved_log_directory() else {
            return Ok(None);
        };

        let date_pattern = DatePattern::new(&self.date_format)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        let extension = match self.file_extension.trim_start_matches('.') {
            "" => None,
            ext => Some(ext.to_string()),
        };

        Ok(Some(RotationConfig {
            directory,
            max_files: self.max_log_files,
            date_pattern,
            extension,
        }))
    }
}

fn fill_default<T: PartialEq>(value: &mut T, base: T, default: T) {
    if *value == default && base != default {
        *value = base;
    }
}
