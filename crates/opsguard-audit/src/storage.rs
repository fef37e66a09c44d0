//! Audit sinks: an append-only JSON-Lines log and an in-memory log.
//!
//! Each record is serialized to a single line and written with one
//! `write_all` on a file opened in append mode. Concurrent writers rely on
//! the operating system's atomic append; there is no lock file and no
//! writer thread. A crash can at worst leave a partial trailing line, which
//! [`read_records`] skips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::entry::ApprovalRecord;
use crate::error::{AuditError, AuditResult};

/// Destination for approval records.
///
/// Implementations must be thread-safe and must never modify a record
/// once it has been appended.
pub trait AuditSink: Send + Sync {
    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    fn append(&self, record: &ApprovalRecord) -> AuditResult<()>;
}

/// How records are grouped into files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditPeriod {
    /// One file per UTC day: `{prefix}-YYYY-MM-DD.jsonl`.
    #[default]
    Daily,
    /// One file per UTC month: `{prefix}-YYYY-MM.jsonl`.
    Monthly,
    /// A single file: `{prefix}.jsonl`.
    None,
}

/// Append-only JSON-Lines log grouped by period.
#[derive(Debug, Clone)]
pub struct JsonlAuditLog {
    dir: PathBuf,
    prefix: String,
    period: AuditPeriod,
}

impl JsonlAuditLog {
    /// Create a log writing to `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, period: AuditPeriod) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            period,
        }
    }

    /// Directory holding the log files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a record written at `at` lands in.
    #[must_use]
    pub fn path_for(&self, at: DateTime<Utc>) -> PathBuf {
        let name = match self.period {
            AuditPeriod::Daily => format!("{}-{}.jsonl", self.prefix, at.format("%Y-%m-%d")),
            AuditPeriod::Monthly => format!("{}-{}.jsonl", self.prefix, at.format("%Y-%m")),
            AuditPeriod::None => format!("{}.jsonl", self.prefix),
        };
        self.dir.join(name)
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, record: &ApprovalRecord) -> AuditResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| AuditError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(record.timestamp.0);
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Io {
                path: path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .map_err(|source| AuditError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), id = %record.id, "Audit record appended");
        Ok(())
    }
}

/// In-memory log, for tests and embedders that ship records elsewhere.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<ApprovalRecord>>,
}

impl MemoryAuditLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every record appended so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn records(&self) -> AuditResult<Vec<ApprovalRecord>> {
        self.records
            .lock()
            .map(|r| r.clone())
            .map_err(|_| AuditError::StorageError("audit log lock poisoned".to_owned()))
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &ApprovalRecord) -> AuditResult<()> {
        self.records
            .lock()
            .map_err(|_| AuditError::StorageError("audit log lock poisoned".to_owned()))?
            .push(record.clone());
        Ok(())
    }
}

/// Read every decodable line of a JSON-Lines file.
///
/// Blank lines are ignored; malformed lines (such as a partially written
/// trailing line) are skipped with a warning.
///
/// # Errors
///
/// Returns an error only if the file cannot be read.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> AuditResult<Vec<T>> {
    let content = fs::read_to_string(path).map_err(|source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(item) => out.push(item),
            Err(e) => warn!(
                path = %path.display(),
                line = idx.saturating_add(1),
                error = %e,
                "Skipping malformed audit line"
            ),
        }
    }
    Ok(out)
}

/// Read the approval records of one log file.
///
/// # Errors
///
/// Returns an error only if the file cannot be read.
pub fn read_records(path: &Path) -> AuditResult<Vec<ApprovalRecord>> {
    read_jsonl(path)
}
