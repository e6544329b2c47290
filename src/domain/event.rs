use super::log_level::LogLevel;
use super::record::{ErrorInfo, LogRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Severity understood by the error-tracking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace | LogLevel::Debug => Severity::Debug,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warning,
            LogLevel::Error => Severity::Error,
            LogLevel::Fatal => Severity::Fatal,
        }
    }
}

/// The user attached to every remote event created after it was last set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub extra_attributes: BTreeMap<String, String>,
}

impl UserContext {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.extra_attributes.is_empty()
    }

    /// Single-line summary used in the context metadata block.
    pub fn describe(&self) -> String {
        let mut parts = Vec::with_capacity(3 + self.extra_attributes.len());
        if let Some(id) = &self.id {
            parts.push(format!("id={id}"));
        }
        if let Some(username) = &self.username {
            parts.push(format!("username={username}"));
        }
        if let Some(email) = &self.email {
            parts.push(format!("email={email}"));
        }
        for (key, value) in &self.extra_attributes {
            parts.push(format!("{key}={value}"));
        }
        parts.join(", ")
    }
}

/// Payload delivered to the error-tracking service for one accepted record.
///
/// Owned by the retry queue from enqueue until delivery; moved (never
/// shared) between the uploader and any pending retry timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub event_id: Uuid,
    pub release_version: String,
    pub severity: Severity,
    pub culprit: String,
    pub logger_name: String,
    pub error: Option<ErrorInfo>,
    pub stack_trace: Option<String>,
    pub user: UserContext,
}

impl RemoteEvent {
    pub fn from_record(record: &LogRecord, release_version: &str, user: UserContext) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            release_version: release_version.to_string(),
            severity: record.level.into(),
            culprit: record.message.clone(),
            logger_name: record.logger_name.clone(),
            error: record.error.clone(),
            stack_trace: record.stack_trace.clone(),
            user,
        }
    }
}
