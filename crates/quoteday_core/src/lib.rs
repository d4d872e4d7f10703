//! Core domain logic for QuoteDay.
//! This crate is the single source of truth for favorites, diary and quote
//! note invariants.

pub mod config;
pub mod db;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use fetch::coordinator::{FetchState, QuoteFetchCoordinator, RequestTicket, DEFAULT_CATEGORY};
pub use fetch::source::{decode_quote_response, HttpQuoteSource, QuoteSource};
pub use fetch::{FetchError, FetchResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::diary::{Diary, DiaryEntry, DiaryGroup, EntryId, Reflection, ReflectionId};
pub use model::favorites::FavoritesCollection;
pub use model::note::QuoteNotes;
pub use model::quote::{Quote, QuoteId, QuoteKey};
pub use repo::kv_repo::{KvRepository, RepoError, RepoResult, SqliteKvRepository};
pub use service::diary_service::{DiaryStore, DIARY_KEY};
pub use service::favorites_service::{normalize_category_name, FavoritesStore, FAVORITES_KEY};
pub use service::note_service::{QuoteNoteStore, QUOTE_NOTES_KEY};
pub use service::persist::{quarantine_key, OpenStatus, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
