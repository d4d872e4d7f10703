//! Snapshot persistence shared by every store.
//!
//! # Responsibility
//! - Load one JSON blob per store with explicit outcomes.
//! - Provide the single write path (`mutate`) that changes and saves as one
//!   step.
//!
//! # Invariants
//! - A missing key means "no prior data"; an undecodable blob is an error,
//!   never an empty store.
//! - In-memory state only changes after the new snapshot was written.
//! - Quarantine copies the raw blob verbatim to the first free backup slot
//!   (`<key>.corrupt`, then `<key>.corrupt.1`, ...) before the store starts
//!   empty. Earlier backups are never overwritten.

use crate::repo::kv_repo::{KvRepository, RepoError};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const QUARANTINE_SUFFIX: &str = ".corrupt";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error covering persistence and input validation.
#[derive(Debug)]
pub enum StoreError {
    /// Key-value backend failure.
    Repo(RepoError),
    /// In-memory state could not be encoded.
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },
    /// Persisted blob exists but does not decode.
    CorruptData {
        key: &'static str,
        source: serde_json::Error,
    },
    /// Category name is empty after normalization.
    InvalidCategory(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Encode { key, source } => write!(f, "failed to encode `{key}`: {source}"),
            Self::CorruptData { key, source } => {
                write!(f, "persisted data under `{key}` is corrupt: {source}")
            }
            Self::InvalidCategory(value) => write!(f, "invalid category name: `{value}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Encode { source, .. } | Self::CorruptData { source, .. } => Some(source),
            Self::InvalidCategory(_) => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// What `open` found in the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenStatus {
    /// Key was never written; the store starts empty.
    Fresh,
    /// Snapshot decoded successfully.
    Restored,
    /// Snapshot was corrupt; raw blob moved to `backup_key`, store is empty.
    Quarantined { backup_key: String },
}

impl OpenStatus {
    fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Restored => "restored",
            Self::Quarantined { .. } => "quarantined",
        }
    }
}

/// Returns backup slot `slot` for a corrupt blob under `key`.
///
/// Slot 0 is `<key>.corrupt`; later slots append `.<slot>`.
pub fn quarantine_key(key: &str, slot: u32) -> String {
    if slot == 0 {
        format!("{key}{QUARANTINE_SUFFIX}")
    } else {
        format!("{key}{QUARANTINE_SUFFIX}.{slot}")
    }
}

fn free_quarantine_key<R: KvRepository>(repo: &R, key: &str) -> StoreResult<String> {
    let mut slot = 0;
    loop {
        let candidate = quarantine_key(key, slot);
        if repo.get_value(&candidate)?.is_none() {
            return Ok(candidate);
        }
        slot += 1;
    }
}

/// One store's in-memory value bound to its key-value slot.
pub(crate) struct Persisted<R, T> {
    repo: R,
    key: &'static str,
    value: T,
}

impl<R, T> Persisted<R, T>
where
    R: KvRepository,
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Loads the snapshot, failing on corrupt data.
    pub(crate) fn open(repo: R, key: &'static str) -> StoreResult<(Self, OpenStatus)> {
        let (value, status) = match load(&repo, key)? {
            Loaded::Missing => (T::default(), OpenStatus::Fresh),
            Loaded::Found(value) => (value, OpenStatus::Restored),
            Loaded::Corrupt { source, .. } => {
                error!(
                    "event=store_open module=store status=error key={} error_code=corrupt_data error={}",
                    key, source
                );
                return Err(StoreError::CorruptData { key, source });
            }
        };
        info!(
            "event=store_open module=store status=ok key={} outcome={}",
            key,
            status.label()
        );
        Ok((Self { repo, key, value }, status))
    }

    /// Loads the snapshot, quarantining corrupt data instead of failing.
    pub(crate) fn open_recovering(repo: R, key: &'static str) -> StoreResult<(Self, OpenStatus)> {
        let (value, status) = match load(&repo, key)? {
            Loaded::Missing => (T::default(), OpenStatus::Fresh),
            Loaded::Found(value) => (value, OpenStatus::Restored),
            Loaded::Corrupt { raw, source } => {
                let backup_key = free_quarantine_key(&repo, key)?;
                repo.set_value(&backup_key, &raw)?;
                repo.remove_value(key)?;
                warn!(
                    "event=store_quarantine module=store status=ok key={} backup_key={} bytes={} error={}",
                    key,
                    backup_key,
                    raw.len(),
                    source
                );
                (T::default(), OpenStatus::Quarantined { backup_key })
            }
        };
        info!(
            "event=store_open module=store status=ok key={} outcome={}",
            key,
            status.label()
        );
        Ok((Self { repo, key, value }, status))
    }

    pub(crate) fn get(&self) -> &T {
        &self.value
    }

    /// Applies `f` to a working copy, saves it, then commits it.
    pub(crate) fn mutate<O>(&mut self, f: impl FnOnce(&mut T) -> O) -> StoreResult<O> {
        let mut working = self.value.clone();
        let output = f(&mut working);
        self.save(&working)?;
        self.value = working;
        Ok(output)
    }

    /// Like `mutate`, but `f` returning `None` discards the working copy and
    /// skips the write.
    pub(crate) fn mutate_if_changed<O>(
        &mut self,
        f: impl FnOnce(&mut T) -> Option<O>,
    ) -> StoreResult<Option<O>> {
        let mut working = self.value.clone();
        let Some(output) = f(&mut working) else {
            return Ok(None);
        };
        self.save(&working)?;
        self.value = working;
        Ok(Some(output))
    }

    /// Writes the current value unconditionally.
    pub(crate) fn flush(&self) -> StoreResult<()> {
        self.save(&self.value)
    }

    fn save(&self, value: &T) -> StoreResult<()> {
        let started_at = Instant::now();
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: self.key,
            source,
        })?;
        match self.repo.set_value(self.key, &encoded) {
            Ok(()) => {
                debug!(
                    "event=store_save module=store status=ok key={} bytes={} duration_ms={}",
                    self.key,
                    encoded.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=store status=error key={} duration_ms={} error_code=store_save_failed error={}",
                    self.key,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

enum Loaded<T> {
    Missing,
    Found(T),
    Corrupt {
        raw: String,
        source: serde_json::Error,
    },
}

fn load<R: KvRepository, T: DeserializeOwned>(repo: &R, key: &str) -> StoreResult<Loaded<T>> {
    let Some(raw) = repo.get_value(key)? else {
        return Ok(Loaded::Missing);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Loaded::Found(value)),
        Err(source) => Ok(Loaded::Corrupt { raw, source }),
    }
}
