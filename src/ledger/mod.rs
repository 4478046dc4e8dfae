//! Processed-ID ledger
//!
//! Records which message IDs have already gone out in a digest so a later run
//! never includes them again. The ledger is read once at the start of a run and
//! written at most once, after the digest has been delivered.
//!
//! With a retention set, IDs recorded longer ago than the retention are pruned
//! on commit. The retention must cover the mailbox lookback window, so a
//! pruned message can no longer be listed.

pub mod store;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::errors::DigestError;

pub use store::{FileLedgerStore, LedgerSnapshot, LedgerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    /// Not yet loaded from the store.
    Empty,
    Loaded,
    /// This run's IDs have been written.
    Updated,
}

#[derive(Debug, Clone)]
pub struct ProcessedLedger {
    /// ID to the time it was recorded.
    ids: BTreeMap<String, DateTime<Utc>>,
    retention: Option<Duration>,
    state: LedgerState,
}

impl Default for ProcessedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessedLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: BTreeMap::new(),
            retention: None,
            state: LedgerState::Empty,
        }
    }

    /// Loads the ledger; a store with nothing in it yields an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the store exists but cannot be read or parsed.
    pub fn load(store: &dyn LedgerStore) -> Result<Self, DigestError> {
        let ids = store.read()?.map(Self::timestamps).unwrap_or_default();
        info!(count = ids.len(), "Loaded processed-ID ledger");
        Ok(Self {
            ids,
            retention: None,
            state: LedgerState::Loaded,
        })
    }

    /// IDs without their own timestamp count as recorded at the snapshot's
    /// `updated_at`, or now when that is missing too.
    fn timestamps(snapshot: LedgerSnapshot) -> BTreeMap<String, DateTime<Utc>> {
        let fallback = snapshot.updated_at.unwrap_or_else(Utc::now);
        snapshot
            .processed_ids
            .into_iter()
            .map(|id| {
                let at = snapshot.recorded_at.get(&id).copied().unwrap_or(fallback);
                (id, at)
            })
            .collect()
    }

    /// Prune IDs older than `retention` on the next commit.
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> LedgerState {
        self.state
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }

    /// Adds `new_ids`, prunes expired IDs and persists the whole ledger in
    /// one write.
    ///
    /// Nothing changes in memory unless the write succeeds. Returns the number
    /// of IDs that were not already present.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the ledger is not in the `Loaded` state or the
    /// store write fails.
    pub fn commit<I, S>(&mut self, store: &dyn LedgerStore, new_ids: I) -> Result<usize, DigestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.state != LedgerState::Loaded {
            return Err(DigestError::LedgerError(format!(
                "commit requires a loaded ledger, state is {:?}",
                self.state
            )));
        }

        let now = Utc::now();
        let mut next = self.ids.clone();
        let mut added = 0;
        for id in new_ids {
            let id: String = id.into();
            if !next.contains_key(&id) {
                next.insert(id, now);
                added += 1;
            }
        }

        let before = next.len();
        if let Some(retention) = self.retention {
            let cutoff = now - retention;
            next.retain(|_, recorded_at| *recorded_at >= cutoff);
        }
        let pruned = before - next.len();

        if added == 0 && pruned == 0 {
            debug!("No new IDs to record");
            self.state = LedgerState::Updated;
            return Ok(0);
        }

        let snapshot = LedgerSnapshot {
            processed_ids: next.keys().cloned().collect(),
            recorded_at: next.clone(),
            updated_at: Some(now),
        };
        store.write(&snapshot)?;

        self.ids = next;
        self.state = LedgerState::Updated;
        info!(added, pruned, total = self.ids.len(), "Recorded processed IDs");
        Ok(added)
    }
}
