//! Per-quote free-text notes.
//!
//! A single note per logical quote, independent of diary reflections.

use crate::model::quote::{Quote, QuoteKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// On-disk record; one per annotated quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteNoteRecord {
    pub quote: String,
    pub author: String,
    pub note: String,
}

/// Notes keyed by logical quote identity.
///
/// Serialized as a JSON array of `{quote, author, note}` records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<QuoteNoteRecord>", into = "Vec<QuoteNoteRecord>")]
pub struct QuoteNotes {
    notes: BTreeMap<QuoteKey, String>,
}

impl From<Vec<QuoteNoteRecord>> for QuoteNotes {
    fn from(records: Vec<QuoteNoteRecord>) -> Self {
        let notes = records
            .into_iter()
            .map(|record| (QuoteKey::new(record.quote, record.author), record.note))
            .collect();
        Self { notes }
    }
}

impl From<QuoteNotes> for Vec<QuoteNoteRecord> {
    fn from(value: QuoteNotes) -> Self {
        value
            .notes
            .into_iter()
            .map(|(key, note)| QuoteNoteRecord {
                quote: key.text,
                author: key.author,
                note,
            })
            .collect()
    }
}

impl QuoteNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn note_for(&self, quote: &Quote) -> Option<&str> {
        self.notes.get(&quote.key()).map(String::as_str)
    }

    /// Stores `text` as the quote's note. Blank text removes the note.
    ///
    /// Returns whether the stored state changed.
    pub fn set_note(&mut self, quote: &Quote, text: &str) -> bool {
        if text.trim().is_empty() {
            return self.remove_note(quote);
        }
        let key = quote.key();
        if self.notes.get(&key).map(String::as_str) == Some(text) {
            return false;
        }
        self.notes.insert(key, text.to_string());
        true
    }

    pub fn remove_note(&mut self, quote: &Quote) -> bool {
        self.notes.remove(&quote.key()).is_some()
    }
}
