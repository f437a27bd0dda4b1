//! Journal of cache events
//!
//! Writes JSON lines to `<cache root>/journal.log` when `cache.journal` is set.

use crate::cache::CacheOutcome;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name of the journal inside the cache root
pub const JOURNAL_FILE: &str = "journal.log";

/// File-based journal that appends JSON lines
pub struct Journal {
    enabled: bool,
    path: PathBuf,
}

impl Journal {
    /// Create a journal for the given cache root
    pub fn new(cache_root: &Path, enabled: bool) -> Self {
        Self {
            enabled,
            path: cache_root.join(JOURNAL_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the outcome of a cache resolution
    pub fn record(&self, outcome: &CacheOutcome) {
        let mut data = serde_json::json!({
            "key": outcome.key().as_str(),
            "entry": outcome.entry().display().to_string(),
        });
        match outcome {
            CacheOutcome::Copied { finalized, .. } => {
                data["finalized"] = serde_json::Value::Bool(*finalized);
            }
            CacheOutcome::Linked { link, .. } => {
                data["link"] = serde_json::Value::String(link.display().to_string());
            }
            CacheOutcome::Populated { .. } => {}
        }
        self.log(outcome.event(), &data);
    }

    /// Log an event as a JSON line
    ///
    /// IO failures are only warned about; the journal never fails a run.
    pub fn log(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line) {
            warn!("Failed to write journal {}: {}", self.path.display(), e);
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.write_all(line.as_bytes())?;
        file.flush()
    }
}
