//! Favorites store: persisted category → quotes mapping.
//!
//! # Responsibility
//! - Expose favorites CRUD with persist-on-every-mutation semantics.
//! - Normalize user-entered category names.
//!
//! # Invariants
//! - Every successful mutation rewrites the whole mapping under
//!   `favorite_quotes_by_category`.
//! - Failed writes leave the in-memory mapping untouched.
//! - Category names are trimmed and inner whitespace collapsed; case is kept.

use crate::model::favorites::FavoritesCollection;
use crate::model::quote::Quote;
use crate::repo::kv_repo::KvRepository;
use crate::service::persist::{OpenStatus, Persisted, StoreError, StoreResult};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Key-value slot holding the favorites mapping.
pub const FAVORITES_KEY: &str = "favorite_quotes_by_category";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Normalizes a user-entered category name.
///
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_category_name(name: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(name.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

fn require_category(name: &str) -> StoreResult<String> {
    normalize_category_name(name).ok_or_else(|| StoreError::InvalidCategory(name.to_string()))
}

/// Favorites store bound to one key-value repository.
pub struct FavoritesStore<R: KvRepository> {
    state: Persisted<R, FavoritesCollection>,
}

impl<R: KvRepository> FavoritesStore<R> {
    /// Loads persisted favorites; corrupt data is an error.
    pub fn open(repo: R) -> StoreResult<Self> {
        let (state, _) = Persisted::open(repo, FAVORITES_KEY)?;
        Ok(Self { state })
    }

    /// Loads persisted favorites, quarantining corrupt data.
    pub fn open_recovering(repo: R) -> StoreResult<(Self, OpenStatus)> {
        let (state, status) = Persisted::open_recovering(repo, FAVORITES_KEY)?;
        Ok((Self { state }, status))
    }

    pub fn collection(&self) -> &FavoritesCollection {
        self.state.get()
    }

    /// Files `quote` under `category`, replacing any earlier filing.
    pub fn add(&mut self, quote: &Quote, category: &str) -> StoreResult<()> {
        let category = require_category(category)?;
        self.state.mutate(|favorites| favorites.add(quote, &category))?;
        info!(
            "event=favorites_add module=favorites status=ok categories={}",
            self.collection().len()
        );
        Ok(())
    }

    /// Removes the first occurrence of the logical quote.
    ///
    /// Nothing is written when the quote was not a favorite.
    pub fn remove(&mut self, quote: &Quote) -> StoreResult<bool> {
        let removed = self
            .state
            .mutate_if_changed(|favorites| favorites.remove(quote).then_some(()))?;
        Ok(removed.is_some())
    }

    pub fn contains(&self, quote: &Quote) -> bool {
        self.collection().contains(quote)
    }

    /// Removes quotes by position within `category`; returns the count removed.
    pub fn remove_at(&mut self, indices: &[usize], category: &str) -> StoreResult<usize> {
        let Some(category) = normalize_category_name(category) else {
            return Ok(0);
        };
        let removed = self.state.mutate_if_changed(|favorites| {
            let count = favorites.remove_at(indices, &category);
            (count > 0).then_some(count)
        })?;
        Ok(removed.unwrap_or(0))
    }

    pub fn categories_for(&self, quote: &Quote) -> BTreeSet<String> {
        self.collection().categories_for(quote)
    }

    pub fn move_quote(&mut self, quote: &Quote, to_category: &str) -> StoreResult<()> {
        let category = require_category(to_category)?;
        self.state
            .mutate(|favorites| favorites.move_quote(quote, &category))
    }

    pub fn remove_category(&mut self, name: &str) -> StoreResult<bool> {
        let Some(name) = normalize_category_name(name) else {
            return Ok(false);
        };
        let removed = self
            .state
            .mutate_if_changed(|favorites| favorites.remove_category(&name).then_some(()))?;
        if removed.is_some() {
            info!(
                "event=favorites_remove_category module=favorites status=ok categories={}",
                self.collection().len()
            );
        }
        Ok(removed.is_some())
    }

    /// Renames `old` to `new`, merging when `new` exists. Both names are
    /// normalized.
    ///
    /// Returns `false` (and writes nothing) for the no-op cases.
    pub fn rename_category(&mut self, old: &str, new: &str) -> StoreResult<bool> {
        let new = require_category(new)?;
        let Some(old) = normalize_category_name(old) else {
            return Ok(false);
        };
        let renamed = self
            .state
            .mutate_if_changed(|favorites| favorites.rename_category(&old, &new).then_some(()))?;
        Ok(renamed.is_some())
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.collection().category_names()
    }

    pub fn quotes_in(&self, category: &str) -> &[Quote] {
        match normalize_category_name(category) {
            Some(name) => self.collection().quotes_in(&name),
            None => &[],
        }
    }

    /// Every favorite, walking categories in name order.
    pub fn all_quotes(&self) -> impl Iterator<Item = &Quote> {
        self.collection().all_quotes()
    }

    /// Applies an arbitrary change and persists it as one step.
    pub fn mutate<O>(&mut self, f: impl FnOnce(&mut FavoritesCollection) -> O) -> StoreResult<O> {
        self.state.mutate(f)
    }

    /// Writes the current mapping; call on shutdown.
    pub fn flush(&self) -> StoreResult<()> {
        self.state.flush()
    }
}
