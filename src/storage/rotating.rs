use super::{DatePattern, StorageError};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Default number of dated files kept in the log directory.
pub const DEFAULT_MAX_LOG_FILES: usize = 10;

#[derive(Debug, Clone)]
pub struct RotationConfig {
    pub directory: PathBuf,
    pub max_files: usize,
    pub date_pattern: DatePattern,
    /// File extension without the leading dot. `None` means bare date names.
    pub extension: Option<String>,
}

impl RotationConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            max_files: DEFAULT_MAX_LOG_FILES,
            date_pattern: DatePattern::default(),
            extension: Some("log".to_string()),
        }
    }

    pub fn file_name_for(&self, date: NaiveDate) -> String {
        let stem = self.date_pattern.format(date);
        match &self.extension {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        }
    }

    /// Parse a directory entry name back to its date. Names without the
    /// configured extension, or whose stem does not match the pattern, yield `None`.
    pub fn date_of(&self, file_name: &str) -> Option<NaiveDate> {
        let stem = match &self.extension {
            Some(ext) => file_name.strip_suffix(ext.as_str())?.strip_suffix('.')?,
            None => file_name,
        };
        self.date_pattern.parse(stem)
    }
}

/// A log file whose name parsed as a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedFile {
    pub path: PathBuf,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    pub kept: usize,
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Directory of date-named log files with a retention bound.
///
/// At most `max_files` dated files survive a rotation pass (oldest deleted
/// first); files whose names do not parse are never counted or touched.
/// Appends open, write, flush and close the active file on every call, so no
/// descriptor is held across calls.
#[derive(Debug)]
pub struct RotatingFileStore {
    config: RotationConfig,
    active_date: NaiveDate,
    active_path: PathBuf,
}

impl RotatingFileStore {
    /// Prepare the directory for today's date.
    pub async fn setup(config: RotationConfig) -> Result<Self, StorageError> {
        Self::setup_for_date(config, Local::now().date_naive()).await
    }

    /// Prepare the directory, treating `today` as the current date.
    ///
    /// Creates the directory (and parents) if needed, enforces the retention
    /// bound, and computes the active file path. The active file itself is not
    /// created here; the first append does that.
    pub async fn setup_for_date(
        config: RotationConfig,
        today: NaiveDate,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.directory)
            .await
            .map_err(|source| StorageError::CreateDirectory {
                path: config.directory.clone(),
                source,
            })?;

        let active_path = config.directory.join(config.file_name_for(today));
        let store = Self {
            config,
            active_date: today,
            active_path,
        };

        let report = store.rotate().await?;
        info!(
            "Log directory {} ready: {} dated files kept, {} deleted, active file {}",
            store.config.directory.display(),
            report.kept,
            report.deleted.len(),
            store.active_path.display()
        );

        Ok(store)
    }

    /// Enumerate the dated files in the directory, oldest first.
    pub async fn list_dated_files(&self) -> Result<Vec<DatedFile>, StorageError> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.config.directory).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(file_name) = entry.file_name().to_str()
                && let Some(date) = self.config.date_of(file_name)
            {
                files.push(DatedFile {
                    path: entry.path(),
                    date,
                });
            }
        }

        files.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
        Ok(files)
    }

    /// Delete the oldest dated files until at most `max_files` remain.
    ///
    /// A file that cannot be deleted is reported and skipped; the pass carries
    /// on with the rest.
    pub async fn rotate(&self) -> Result<RotationReport, StorageError> {
        let files = self.list_dated_files().await?;
        let excess = files.len().saturating_sub(self.config.max_files);
        let mut report = RotationReport {
            kept: files.len() - excess,
            ..RotationReport::default()
        };

        for file in files.into_iter().take(excess) {
            match fs::remove_file(&file.path).await {
                Ok(()) => {
                    debug!("Deleted old log file {}", file.path.display());
                    report.deleted.push(file.path);
                }
                Err(e) => {
                    warn!("Failed to delete old log file {}: {}", file.path.display(), e);
                    report.failed.push(file.path);
                }
            }
        }

        Ok(report)
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    pub fn active_date(&self) -> NaiveDate {
        self.active_date
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Append `text` to today's file.
    pub async fn append(&mut self, text: &str) -> Result<(), StorageError> {
        self.append_on(text, Local::now().date_naive()).await
    }

    /// Append `text`, switching to a new active file first if `today` is a
    /// different day than the current one.
    pub async fn append_on(&mut self, text: &str, today: NaiveDate) -> Result<(), StorageError> {
        if today != self.active_date {
            self.roll_over(today).await;
        }

        let path = self.active_path.clone();
        let append_err = |source| StorageError::Append {
            path: path.clone(),
            source,
        };

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(append_err)?;
        file.write_all(text.as_bytes()).await.map_err(append_err)?;
        file.flush().await.map_err(append_err)?;

        Ok(())
    }

    async fn roll_over(&mut self, today: NaiveDate) {
        self.active_date = today;
        self.active_path = self.config.directory.join(self.config.file_name_for(today));
        info!("Rolling log file over to {}", self.active_path.display());

        if let Err(e) = fs::create_dir_all(&self.config.directory).await {
            warn!(
                "Failed to recreate log directory {}: {}",
                self.config.directory.display(),
                e
            );
            return;
        }
        if let Err(e) = self.rotate().await {
            warn!("Log rotation failed: {}", e);
        }
    }
}
