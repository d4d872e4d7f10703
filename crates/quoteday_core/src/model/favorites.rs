//! Favorites collection: category name to ordered quotes.
//!
//! # Invariants
//! - A logical quote appears in at most one category after `add`.
//! - No category with zero quotes survives a mutation or a load.
//! - Per-category quote order is insertion order.

use crate::model::quote::{Quote, QuoteKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

type CategoryMap = BTreeMap<String, Vec<Quote>>;

/// Mapping from category name to the quotes filed under it.
///
/// Serialized as a plain JSON object `{ "<category>": [quote, ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CategoryMap", into = "CategoryMap")]
pub struct FavoritesCollection {
    categories: CategoryMap,
}

impl From<CategoryMap> for FavoritesCollection {
    fn from(mut categories: CategoryMap) -> Self {
        categories.retain(|_, quotes| !quotes.is_empty());
        Self { categories }
    }
}

impl From<FavoritesCollection> for CategoryMap {
    fn from(value: FavoritesCollection) -> Self {
        value.categories
    }
}

impl FavoritesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Files `quote` under `category`, replacing any earlier filing.
    ///
    /// Every occurrence of the logical quote is removed first, then the copy
    /// is appended at the end of `category` with its `category` field set.
    pub fn add(&mut self, quote: &Quote, category: &str) {
        let mut filed = quote.clone();
        filed.category = Some(category.to_string());
        self.remove_all(&quote.key());
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(filed);
    }

    /// Removes the first occurrence of the logical quote.
    pub fn remove(&mut self, quote: &Quote) -> bool {
        let key = quote.key();
        let found = self.categories.iter().find_map(|(name, quotes)| {
            quotes
                .iter()
                .position(|item| item.matches(&key))
                .map(|index| (name.clone(), index))
        });
        let Some((name, index)) = found else {
            return false;
        };
        if let Some(quotes) = self.categories.get_mut(&name) {
            quotes.remove(index);
        }
        self.prune(&name);
        true
    }

    pub fn contains(&self, quote: &Quote) -> bool {
        let key = quote.key();
        self.categories
            .values()
            .any(|quotes| quotes.iter().any(|item| item.matches(&key)))
    }

    /// Removes quotes by position within one category.
    ///
    /// Out-of-range and repeated indices are ignored. Returns how many quotes
    /// were removed.
    pub fn remove_at(&mut self, indices: &[usize], category: &str) -> usize {
        let Some(quotes) = self.categories.get_mut(category) else {
            return 0;
        };
        let positions: BTreeSet<usize> = indices
            .iter()
            .copied()
            .filter(|index| *index < quotes.len())
            .collect();
        for index in positions.iter().rev() {
            quotes.remove(*index);
        }
        self.prune(category);
        positions.len()
    }

    /// Every category holding the logical quote.
    ///
    /// At most one after `add`, but loaded data is not trusted to hold the
    /// invariant.
    pub fn categories_for(&self, quote: &Quote) -> BTreeSet<String> {
        let key = quote.key();
        self.categories
            .iter()
            .filter(|(_, quotes)| quotes.iter().any(|item| item.matches(&key)))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Moves the logical quote from wherever it is filed into `to_category`.
    pub fn move_quote(&mut self, quote: &Quote, to_category: &str) {
        self.remove_all(&quote.key());
        self.add(quote, to_category);
    }

    pub fn remove_category(&mut self, name: &str) -> bool {
        self.categories.remove(name).is_some()
    }

    /// Renames `old` to `new`, merging into `new` when it already exists.
    ///
    /// Merged quotes go after `new`'s own quotes; a logical quote already in
    /// `new` is not duplicated. Returns `false` for the no-op cases
    /// (`old == new`, or `old` absent).
    pub fn rename_category(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return false;
        }
        let Some(moved) = self.categories.remove(old) else {
            return false;
        };
        let target = self.categories.entry(new.to_string()).or_default();
        for mut quote in moved {
            if target.iter().any(|item| item.same_as(&quote)) {
                continue;
            }
            quote.category = Some(new.to_string());
            target.push(quote);
        }
        self.prune(new);
        true
    }

    /// Category names in sorted order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    /// Quotes of one category in insertion order; empty when absent.
    pub fn quotes_in(&self, category: &str) -> &[Quote] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every favorited quote, grouped by category in name order.
    pub fn all_quotes(&self) -> impl Iterator<Item = &Quote> {
        self.categories.values().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Quote])> {
        self.categories
            .iter()
            .map(|(name, quotes)| (name.as_str(), quotes.as_slice()))
    }

    fn remove_all(&mut self, key: &QuoteKey) {
        for quotes in self.categories.values_mut() {
            quotes.retain(|item| !item.matches(key));
        }
        self.categories.retain(|_, quotes| !quotes.is_empty());
    }

    fn prune(&mut self, category: &str) {
        if self
            .categories
            .get(category)
            .is_some_and(|quotes| quotes.is_empty())
        {
            self.categories.remove(category);
        }
    }
}
