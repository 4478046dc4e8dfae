use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::errors::DigestError;

/// The persisted form of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub processed_ids: Vec<String>,
    /// When each ID was recorded. Older ledgers lack it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recorded_at: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Whole-blob storage for the ledger.
pub trait LedgerStore {
    /// `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> Result<Option<LedgerSnapshot>, DigestError>;

    /// Replaces the stored blob. Must leave the previous blob intact on failure.
    fn write(&self, snapshot: &LedgerSnapshot) -> Result<(), DigestError>;
}

/// JSON file store. Writes go to a temp file in the same directory and are
/// renamed over the target.
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for FileLedgerStore {
    fn read(&self) -> Result<Option<LedgerSnapshot>, DigestError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DigestError::LedgerError(format!(
                    "read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content).map(Some).map_err(|e| {
            DigestError::LedgerError(format!("parse {}: {e}", self.path.display()))
        })
    }

    fn write(&self, snapshot: &LedgerSnapshot) -> Result<(), DigestError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| DigestError::LedgerError(format!("create {}: {e}", dir.display())))?;

        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| DigestError::LedgerError(format!("serialize: {e}")))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| DigestError::LedgerError(format!("temp file: {e}")))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| DigestError::LedgerError(format!("write temp file: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            DigestError::LedgerError(format!("replace {}: {}", self.path.display(), e.error))
        })?;
        Ok(())
    }
}
