//! Quote notes store: one persisted free-text note per quote.
//!
//! # Invariants
//! - Every successful change rewrites the whole note list under
//!   `quoteNotes`.
//! - Setting a blank note removes it.

use crate::model::note::QuoteNotes;
use crate::model::quote::Quote;
use crate::repo::kv_repo::KvRepository;
use crate::service::persist::{OpenStatus, Persisted, StoreResult};

/// Key-value slot holding the note list.
pub const QUOTE_NOTES_KEY: &str = "quoteNotes";

pub struct QuoteNoteStore<R: KvRepository> {
    state: Persisted<R, QuoteNotes>,
}

impl<R: KvRepository> QuoteNoteStore<R> {
    pub fn open(repo: R) -> StoreResult<Self> {
        let (state, _) = Persisted::open(repo, QUOTE_NOTES_KEY)?;
        Ok(Self { state })
    }

    pub fn open_recovering(repo: R) -> StoreResult<(Self, OpenStatus)> {
        let (state, status) = Persisted::open_recovering(repo, QUOTE_NOTES_KEY)?;
        Ok((Self { state }, status))
    }

    pub fn notes(&self) -> &QuoteNotes {
        self.state.get()
    }

    pub fn note_for(&self, quote: &Quote) -> Option<&str> {
        self.notes().note_for(quote)
    }

    /// Stores the note; writes only when the stored state changes.
    pub fn set_note(&mut self, quote: &Quote, text: &str) -> StoreResult<bool> {
        let changed = self
            .state
            .mutate_if_changed(|notes| notes.set_note(quote, text).then_some(()))?;
        Ok(changed.is_some())
    }

    pub fn remove_note(&mut self, quote: &Quote) -> StoreResult<bool> {
        let removed = self
            .state
            .mutate_if_changed(|notes| notes.remove_note(quote).then_some(()))?;
        Ok(removed.is_some())
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.state.flush()
    }
}
