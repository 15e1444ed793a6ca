use std::{
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::emotion::{LabelScore, RankedScores};

pub const LOG_HEADER: [&str; 6] = [
    "timestamp",
    "text",
    "language",
    "top_label",
    "top_score",
    "all_scores",
];

/// One saved prediction. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub timestamp: String,
    pub text: String,
    pub language: String,
    pub top_label: String,
    pub top_score: f32,
    /// JSON array of `{label, score}` objects, best first.
    pub all_scores: String,
}

impl LogRow {
    pub fn new(text: &str, language: &str, ranked: &RankedScores) -> Result<Self> {
        let top = ranked
            .top()
            .ok_or_else(|| anyhow!("cannot log a prediction without scores"))?;

        Ok(Self {
            timestamp: Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            text: text.to_string(),
            language: language.to_string(),
            top_label: top.label.clone(),
            top_score: top.score,
            all_scores: serde_json::to_string(ranked)?,
        })
    }

    pub fn scores(&self) -> Result<Vec<LabelScore>> {
        serde_json::from_str(&self.all_scores).context("all_scores is not a JSON score list")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Removed,
    Missing,
}

impl ClearOutcome {
    pub fn message(self) -> &'static str {
        match self {
            ClearOutcome::Removed => "Log cleared.",
            ClearOutcome::Missing => "No log file found.",
        }
    }
}

/// What the actions panel shows about the log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSummary {
    Missing,
    Rows(usize),
    Unreadable(String),
}

/// Append-only CSV log of predictions.
///
/// Every file operation holds `lock`, so the exists-check, header write and
/// row append happen as one step for all requests in this process. Other
/// processes writing the same path are not coordinated.
pub struct PredictionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("predictions_log.csv")
            .to_string()
    }

    pub fn append(&self, row: &LogRow) -> Result<()> {
        let _guard = self.guard()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log dir {}", parent.display()))?;
        }

        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(err) if err.kind() == ErrorKind::NotFound => true,
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to stat {}", self.path.display()))
            }
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", self.path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;

        debug!(path = %self.path.display(), header = needs_header, "prediction row appended");
        Ok(())
    }

    pub fn clear(&self) -> Result<ClearOutcome> {
        let _guard = self.guard()?;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "prediction log cleared");
                Ok(ClearOutcome::Removed)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(ClearOutcome::Missing),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to remove {}", self.path.display()))
            }
        }
    }

    pub fn read_rows(&self) -> Result<Vec<LogRow>> {
        let _guard = self.guard()?;
        self.read_rows_locked()
    }

    /// Raw file contents for download; `None` when nothing has been saved.
    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        let _guard = self.guard()?;
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    pub fn summary(&self) -> LogSummary {
        let _guard = match self.guard() {
            Ok(guard) => guard,
            Err(err) => return LogSummary::Unreadable(err.to_string()),
        };
        if !self.path.exists() {
            return LogSummary::Missing;
        }
        match self.read_rows_locked() {
            Ok(rows) => LogSummary::Rows(rows.len()),
            Err(err) => LogSummary::Unreadable(format!("{err:#}")),
        }
    }

    // Async entry points for request handlers. The log grows without bound, so
    // file work and lock waits run on the blocking pool.

    pub async fn append_async(self: &Arc<Self>, row: LogRow) -> Result<()> {
        self.on_blocking_pool(move |log| log.append(&row)).await
    }

    pub async fn clear_async(self: &Arc<Self>) -> Result<ClearOutcome> {
        self.on_blocking_pool(|log| log.clear()).await
    }

    pub async fn read_bytes_async(self: &Arc<Self>) -> Result<Option<Vec<u8>>> {
        self.on_blocking_pool(|log| log.read_bytes()).await
    }

    pub async fn summary_async(self: &Arc<Self>) -> LogSummary {
        match self.on_blocking_pool(|log| Ok(log.summary())).await {
            Ok(summary) => summary,
            Err(err) => LogSummary::Unreadable(format!("{err:#}")),
        }
    }

    async fn on_blocking_pool<T, F>(self: &Arc<Self>, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&PredictionLog) -> Result<T> + Send + 'static,
    {
        let log = Arc::clone(self);
        tokio::task::spawn_blocking(move || work(&log))
            .await
            .context("prediction log task panicked")?
    }

    fn read_rows_locked(&self) -> Result<Vec<LogRow>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let headers = reader.headers()?.clone();
        if headers.iter().ne(LOG_HEADER.iter().copied()) {
            return Err(anyhow!(
                "unexpected header in {}: {}",
                self.path.display(),
                headers.iter().collect::<Vec<_>>().join(",")
            ));
        }

        reader
            .deserialize()
            .collect::<Result<Vec<LogRow>, _>>()
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| anyhow!("prediction log lock poisoned"))
    }
}
