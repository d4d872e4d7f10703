//! Diary entry and reflection value types.
//!
//! # Invariants
//! - One `DiaryEntry` per logical quote (enforced by the diary store).
//! - `Reflection::id` and `Reflection::timestamp_ms` never change after
//!   creation; only `text` is editable.
//! - Reflection timestamps within one entry are strictly increasing.

use crate::model::favorites::FavoritesCollection;
use crate::model::quote::{Quote, QuoteKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type EntryId = Uuid;
pub type ReflectionId = Uuid;

/// One timestamped free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub id: ReflectionId,
    pub text: String,
    /// Unix epoch milliseconds.
    pub timestamp_ms: i64,
}

impl Reflection {
    pub fn new(text: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp_ms,
        }
    }
}

/// All reflections written against one quote snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: EntryId,
    /// Snapshot taken when the entry was created.
    pub quote: Quote,
    pub reflections: Vec<Reflection>,
}

impl DiaryEntry {
    /// Creates an entry holding a single first reflection.
    pub fn new(quote: Quote, first: Reflection) -> Self {
        Self {
            id: Uuid::new_v4(),
            quote,
            reflections: vec![first],
        }
    }

    pub fn matches(&self, key: &QuoteKey) -> bool {
        self.quote.matches(key)
    }

    /// Appends a reflection stamped no earlier than `now_ms`.
    ///
    /// The stamp is bumped past the last reflection when the clock has not
    /// advanced, so ordering by timestamp always agrees with append order.
    pub fn append(&mut self, text: impl Into<String>, now_ms: i64) -> ReflectionId {
        let timestamp_ms = match self.last_timestamp_ms() {
            Some(last) if now_ms <= last => last.saturating_add(1),
            _ => now_ms,
        };
        let reflection = Reflection::new(text, timestamp_ms);
        let id = reflection.id;
        self.reflections.push(reflection);
        id
    }

    pub fn reflection_mut(&mut self, id: ReflectionId) -> Option<&mut Reflection> {
        self.reflections.iter_mut().find(|item| item.id == id)
    }

    fn last_timestamp_ms(&self) -> Option<i64> {
        self.reflections.iter().map(|item| item.timestamp_ms).max()
    }
}

/// Reflections of one logical quote merged across entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryGroup {
    pub key: QuoteKey,
    /// Snapshot from the first entry seen for this quote.
    pub quote: Quote,
    /// Newest first.
    pub reflections: Vec<Reflection>,
}

/// Ordered list of diary entries.
///
/// Serialized as a plain JSON array of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diary {
    entries: Vec<DiaryEntry>,
}

impl Diary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn entry(&self, entry_id: EntryId) -> Option<&DiaryEntry> {
        self.entries.iter().find(|entry| entry.id == entry_id)
    }

    /// Appends a reflection to the quote's entry, creating the entry if the
    /// quote was never journaled.
    pub fn add_entry(
        &mut self,
        quote: &Quote,
        text: impl Into<String>,
        now_ms: i64,
    ) -> (EntryId, ReflectionId) {
        let key = quote.key();
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.matches(&key)) {
            let reflection_id = entry.append(text, now_ms);
            return (entry.id, reflection_id);
        }

        let first = Reflection::new(text, now_ms);
        let reflection_id = first.id;
        let entry = DiaryEntry::new(quote.clone(), first);
        let entry_id = entry.id;
        self.entries.push(entry);
        (entry_id, reflection_id)
    }

    /// Replaces one reflection's text. Returns `false` when either id is
    /// unknown.
    pub fn update_reflection(
        &mut self,
        entry_id: EntryId,
        reflection_id: ReflectionId,
        new_text: impl Into<String>,
    ) -> bool {
        let Some(reflection) = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .and_then(|entry| entry.reflection_mut(reflection_id))
        else {
            return false;
        };
        reflection.text = new_text.into();
        true
    }

    /// Removes one reflection, and its entry once the entry is empty.
    /// Returns `false` when either id is unknown.
    pub fn delete_reflection(&mut self, entry_id: EntryId, reflection_id: ReflectionId) -> bool {
        let Some(entry_index) = self.entries.iter().position(|entry| entry.id == entry_id) else {
            return false;
        };
        let entry = &mut self.entries[entry_index];
        let before = entry.reflections.len();
        entry.reflections.retain(|item| item.id != reflection_id);
        if entry.reflections.len() == before {
            return false;
        }
        if entry.reflections.is_empty() {
            self.entries.remove(entry_index);
        }
        true
    }

    /// All reflections on the logical quote, in stored order.
    ///
    /// Scans every entry, so duplicate entries in loaded data still report
    /// all their reflections.
    pub fn reflections_for<'a>(&'a self, quote: &Quote) -> impl Iterator<Item = &'a Reflection> {
        let key = quote.key();
        self.entries
            .iter()
            .filter(move |entry| entry.matches(&key))
            .flat_map(|entry| entry.reflections.iter())
    }

    /// One group per logical quote, sorted by quote text, reflections newest
    /// first.
    pub fn grouped(&self) -> Vec<DiaryGroup> {
        let mut groups: BTreeMap<QuoteKey, DiaryGroup> = BTreeMap::new();
        for entry in &self.entries {
            groups
                .entry(entry.quote.key())
                .or_insert_with(|| DiaryGroup {
                    key: entry.quote.key(),
                    quote: entry.quote.clone(),
                    reflections: Vec::new(),
                })
                .reflections
                .extend(entry.reflections.iter().cloned());
        }
        groups
            .into_values()
            .map(|mut group| {
                group
                    .reflections
                    .sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
                group
            })
            .collect()
    }

    /// Entries whose reflections mention `query`, or whose quote is filed in
    /// a favorites category whose name mentions it. Case-insensitive; an
    /// empty query matches everything.
    pub fn search<'a>(&'a self, query: &str, favorites: &FavoritesCollection) -> Vec<&'a DiaryEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|entry| {
                let in_reflections = entry
                    .reflections
                    .iter()
                    .any(|item| item.text.to_lowercase().contains(&needle));
                in_reflections
                    || favorites
                        .categories_for(&entry.quote)
                        .iter()
                        .any(|name| name.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
