use crate::domain::UserContext;
use std::collections::BTreeMap;

/// Source of the static metadata attached to records.
pub trait ContextProvider: Send + Sync {
    /// Version reported as the release of every remote event.
    fn app_version(&self) -> String;

    /// Key/value metadata about the running application and host.
    fn context_info(&self) -> BTreeMap<String, String>;
}

/// Context captured once at startup.
#[derive(Debug, Clone)]
pub struct StaticContext {
    app_version: String,
    info: BTreeMap<String, String>,
}

impl StaticContext {
    pub fn new(app_version: impl Into<String>) -> Self {
        let app_version = app_version.into();
        let mut info = BTreeMap::new();
        info.insert("app_version".to_string(), app_version.clone());
        Self { app_version, info }
    }

    /// App version plus host name, OS and architecture of this machine.
    pub fn detect(app_version: impl Into<String>) -> Self {
        let mut context = Self::new(app_version);
        if let Ok(host) = hostname::get() {
            context
                .info
                .insert("host".to_string(), host.to_string_lossy().into_owned());
        }
        context
            .info
            .insert("os".to_string(), std::env::consts::OS.to_string());
        context
            .info
            .insert("arch".to_string(), std::env::consts::ARCH.to_string());
        context
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }
}

impl ContextProvider for StaticContext {
    fn app_version(&self) -> String {
        self.app_version.clone()
    }

    fn context_info(&self) -> BTreeMap<String, String> {
        self.info.clone()
    }
}

/// Render the metadata block compared between records: one `key: value`
/// line per context entry, then the current user if one is set.
pub fn render_context(info: &BTreeMap<String, String>, user: &UserContext) -> String {
    let mut lines: Vec<String> = info
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    if !user.is_empty() {
        lines.push(format!("user: {}", user.describe()));
    }
    lines.join("\n")
}
