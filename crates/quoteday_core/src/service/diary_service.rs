//! Diary store: persisted reflections grouped per quote.
//!
//! # Responsibility
//! - Expose diary CRUD with persist-on-every-mutation semantics.
//! - Stamp new reflections with wall-clock epoch milliseconds.
//!
//! # Invariants
//! - Every successful mutation rewrites the whole list under
//!   `diary_entries`.
//! - Unknown entry/reflection ids are silent no-ops and write nothing.

use crate::model::diary::{Diary, DiaryEntry, DiaryGroup, EntryId, Reflection, ReflectionId};
use crate::model::favorites::FavoritesCollection;
use crate::model::quote::Quote;
use crate::repo::kv_repo::KvRepository;
use crate::service::persist::{OpenStatus, Persisted, StoreResult};
use log::{debug, info};
use std::time::{SystemTime, UNIX_EPOCH};

/// Key-value slot holding the diary entry list.
pub const DIARY_KEY: &str = "diary_entries";

/// Diary store bound to one key-value repository.
pub struct DiaryStore<R: KvRepository> {
    state: Persisted<R, Diary>,
}

impl<R: KvRepository> DiaryStore<R> {
    /// Loads persisted entries; corrupt data is an error.
    pub fn open(repo: R) -> StoreResult<Self> {
        let (state, _) = Persisted::open(repo, DIARY_KEY)?;
        Ok(Self { state })
    }

    /// Loads persisted entries, quarantining corrupt data.
    pub fn open_recovering(repo: R) -> StoreResult<(Self, OpenStatus)> {
        let (state, status) = Persisted::open_recovering(repo, DIARY_KEY)?;
        Ok((Self { state }, status))
    }

    pub fn diary(&self) -> &Diary {
        self.state.get()
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        self.diary().entries()
    }

    /// Records a reflection on `quote`, stamped now.
    pub fn add_entry(
        &mut self,
        quote: &Quote,
        text: impl Into<String>,
    ) -> StoreResult<(EntryId, ReflectionId)> {
        let now_ms = now_epoch_ms();
        let ids = self
            .state
            .mutate(|diary| diary.add_entry(quote, text, now_ms))?;
        info!(
            "event=diary_add module=diary status=ok entries={}",
            self.entries().len()
        );
        Ok(ids)
    }

    /// Replaces a reflection's text; `false` when either id is unknown.
    pub fn update_reflection(
        &mut self,
        entry_id: EntryId,
        reflection_id: ReflectionId,
        new_text: impl Into<String>,
    ) -> StoreResult<bool> {
        let updated = self.state.mutate_if_changed(|diary| {
            diary
                .update_reflection(entry_id, reflection_id, new_text)
                .then_some(())
        })?;
        if updated.is_none() {
            debug!("event=diary_update module=diary status=skipped reason=not_found");
        }
        Ok(updated.is_some())
    }

    /// Deletes a reflection, dropping its entry once empty.
    pub fn delete_reflection(
        &mut self,
        entry_id: EntryId,
        reflection_id: ReflectionId,
    ) -> StoreResult<bool> {
        let deleted = self.state.mutate_if_changed(|diary| {
            diary
                .delete_reflection(entry_id, reflection_id)
                .then_some(())
        })?;
        if deleted.is_none() {
            debug!("event=diary_delete module=diary status=skipped reason=not_found");
        }
        Ok(deleted.is_some())
    }

    pub fn reflections_for(&self, quote: &Quote) -> Vec<&Reflection> {
        self.diary().reflections_for(quote).collect()
    }

    pub fn grouped(&self) -> Vec<DiaryGroup> {
        self.diary().grouped()
    }

    pub fn search(&self, query: &str, favorites: &FavoritesCollection) -> Vec<&DiaryEntry> {
        self.diary().search(query, favorites)
    }

    /// Applies an arbitrary change and persists it as one step.
    pub fn mutate<O>(&mut self, f: impl FnOnce(&mut Diary) -> O) -> StoreResult<O> {
        self.state.mutate(f)
    }

    /// Writes the current entry list; call on shutdown.
    pub fn flush(&self) -> StoreResult<()> {
        self.state.flush()
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// A clock set before 1970 reads as `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
