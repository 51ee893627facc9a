//! Activity log
//!
//! Appends one JSON line per session operation (connects, disconnects,
//! network changes, transfers). Write failures are logged and never fail the
//! operation being recorded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Entry in the activity log
#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
    pub event: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActivityEntry {
    pub fn new(session_id: Uuid, event: &'static str, status: &'static str) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id,
            event,
            status,
            account: None,
            chain_id: None,
            tx_hash: None,
            error: None,
        }
    }

    pub fn account(mut self, account: impl ToString) -> Self {
        self.account = Some(account.to_string());
        self
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn tx_hash(mut self, hash: impl ToString) -> Self {
        self.tx_hash = Some(hash.to_string());
        self
    }

    pub fn error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// JSONL activity log writer
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    /// # Arguments
    /// * `path` - Path to the log file, created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entry: &ActivityEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Append an entry, logging instead of failing
    pub fn record(&self, entry: ActivityEntry) {
        if let Err(e) = self.write(&entry) {
            tracing::warn!(
                error = %e,
                path = %self.path.display(),
                "Failed to write activity log entry"
            );
        }
    }
}
