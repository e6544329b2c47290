use super::{Config, ConfigError};
use crate::app::logging_system::LogDirective;
use crate::storage::DatePattern;
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate remote endpoint URL
        if let Some(endpoint) = &self.remote_endpoint {
            Url::parse(endpoint).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid remote endpoint URL '{endpoint}': {e}"))
            })?;
        }

        if self.retry_delay_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Retry delay must be greater than 0".to_string(),
            ));
        }

        if self.retry_queue_capacity == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "Retry queue capacity must be greater than 0".to_string(),
            ));
        }

        if self.console_chunk_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Console chunk size must be greater than 0".to_string(),
            ));
        }

        DatePattern::new(&self.date_format)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        if self.file_extension.contains(['/', '\\']) {
            return Err(ConfigError::InvalidConfig(format!(
                "File extension must not contain path separators: {}",
                self.file_extension
            )));
        }

        for directive in &self.log_filter {
            LogDirective::parse(directive)
                .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        }

        Ok(())
    }
}
