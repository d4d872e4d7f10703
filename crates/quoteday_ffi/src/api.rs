//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate core errors into response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens its own connection; stores are not cached between
//!   calls.
//! - Only the latest `quote_fetch` call may update fetch state.

use log::warn;
use once_cell::sync::{Lazy, OnceCell};
use quoteday_core::db::open_db;
use quoteday_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, DiaryEntry, DiaryStore, FavoritesStore, FetchState, HttpQuoteSource, OpenStatus,
    Quote, QuoteFetchCoordinator, QuoteNoteStore, QuoteSource, Reflection, SqliteKvRepository,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

static CONFIG: OnceCell<CoreConfig> = OnceCell::new();
static FETCH: Lazy<Mutex<QuoteFetchCoordinator>> =
    Lazy::new(|| Mutex::new(QuoteFetchCoordinator::default()));

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Quote as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteItem {
    pub text: String,
    pub author: String,
    pub category: Option<String>,
}

/// One favorites category with its quotes in stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteCategoryItem {
    pub name: String,
    pub quotes: Vec<QuoteItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesResponse {
    pub ok: bool,
    /// Sorted by category name.
    pub categories: Vec<FavoriteCategoryItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionItem {
    pub reflection_id: String,
    pub text: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryEntryItem {
    pub entry_id: String,
    pub quote: QuoteItem,
    /// Newest first.
    pub reflections: Vec<ReflectionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryResponse {
    pub ok: bool,
    pub entries: Vec<DiaryEntryItem>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Whether stored state changed (`false` for no-op calls).
    pub changed: bool,
    /// Ids created by the call, when any (`entry_id`, `reflection_id`).
    pub ids: Vec<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, changed: bool) -> Self {
        Self {
            ok: true,
            changed,
            ids: Vec::new(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            ids: Vec::new(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteFetchResponse {
    /// `false` when this call's result was superseded by a newer call.
    pub applied: bool,
    pub is_loading: bool,
    pub quote: Option<QuoteItem>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteResponse {
    pub ok: bool,
    pub note: Option<String>,
    pub message: String,
}

#[flutter_rust_bridge::frb(sync)]
pub fn favorites_list() -> FavoritesResponse {
    match with_favorites(|store| {
        let categories = store
            .collection()
            .iter()
            .map(|(name, quotes)| FavoriteCategoryItem {
                name: name.to_string(),
                quotes: quotes.iter().map(to_quote_item).collect(),
            })
            .collect::<Vec<_>>();
        Ok((categories, store.all_quotes().count()))
    }) {
        Ok((categories, total)) => FavoritesResponse {
            ok: true,
            message: format!("{total} quote(s) in {} categor(ies).", categories.len()),
            categories,
        },
        Err(err) => FavoritesResponse {
            ok: false,
            categories: Vec::new(),
            message: format!("favorites_list failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn favorites_add(text: String, author: String, category: String) -> ActionResponse {
    let quote = Quote::new(text, author);
    match with_favorites(|store| store.add(&quote, &category).map_err(|err| err.to_string())) {
        Ok(()) => ActionResponse::success("Quote added to favorites.", true),
        Err(err) => ActionResponse::failure(format!("favorites_add failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn favorites_remove(text: String, author: String) -> ActionResponse {
    let quote = Quote::new(text, author);
    match with_favorites(|store| store.remove(&quote).map_err(|err| err.to_string())) {
        Ok(changed) => ActionResponse::success("Quote removed from favorites.", changed),
        Err(err) => ActionResponse::failure(format!("favorites_remove failed: {err}")),
    }
}

/// Returns whether the quote is a favorite; `false` when the store is
/// unreadable.
#[flutter_rust_bridge::frb(sync)]
pub fn favorites_contains(text: String, author: String) -> bool {
    let quote = Quote::new(text, author);
    with_favorites(|store| Ok(store.contains(&quote))).unwrap_or(false)
}

#[flutter_rust_bridge::frb(sync)]
pub fn favorites_move(text: String, author: String, to_category: String) -> ActionResponse {
    let quote = Quote::new(text, author);
    match with_favorites(|store| {
        store
            .move_quote(&quote, &to_category)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Quote moved.", true),
        Err(err) => ActionResponse::failure(format!("favorites_move failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn favorites_remove_at(category: String, indices: Vec<u32>) -> ActionResponse {
    let indices = indices
        .into_iter()
        .filter_map(|index| usize::try_from(index).ok())
        .collect::<Vec<_>>();
    match with_favorites(|store| {
        store
            .remove_at(&indices, &category)
            .map_err(|err| err.to_string())
    }) {
        Ok(count) => ActionResponse::success(format!("Removed {count} quote(s)."), count > 0),
        Err(err) => ActionResponse::failure(format!("favorites_remove_at failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn favorites_remove_category(name: String) -> ActionResponse {
    match with_favorites(|store| store.remove_category(&name).map_err(|err| err.to_string())) {
        Ok(changed) => ActionResponse::success("Category removed.", changed),
        Err(err) => ActionResponse::failure(format!("favorites_remove_category failed: {err}")),
    }
}

/// Renames a category; renaming onto an existing one merges both.
#[flutter_rust_bridge::frb(sync)]
pub fn favorites_rename_category(old_name: String, new_name: String) -> ActionResponse {
    match with_favorites(|store| {
        store
            .rename_category(&old_name, &new_name)
            .map_err(|err| err.to_string())
    }) {
        Ok(changed) => ActionResponse::success("Category renamed.", changed),
        Err(err) => ActionResponse::failure(format!("favorites_rename_category failed: {err}")),
    }
}

/// Lists diary entries, optionally filtered by a search query.
#[flutter_rust_bridge::frb(sync)]
pub fn diary_list(query: Option<String>) -> DiaryResponse {
    let query = query.unwrap_or_default();
    let result = with_connection(|repo| {
        let favorites = FavoritesStore::open(&repo).map_err(|err| err.to_string())?;
        let diary = DiaryStore::open(&repo).map_err(|err| err.to_string())?;
        Ok(diary
            .search(&query, favorites.collection())
            .into_iter()
            .map(to_diary_item)
            .collect::<Vec<_>>())
    });
    match result {
        Ok(entries) => DiaryResponse {
            ok: true,
            message: format!("{} entr(ies).", entries.len()),
            entries,
        },
        Err(err) => DiaryResponse {
            ok: false,
            entries: Vec::new(),
            message: format!("diary_list failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn diary_add(text: String, author: String, reflection: String) -> ActionResponse {
    if reflection.trim().is_empty() {
        return ActionResponse::failure("diary_add failed: reflection cannot be empty");
    }
    let quote = Quote::new(text, author);
    match with_diary(|store| {
        store
            .add_entry(&quote, reflection)
            .map_err(|err| err.to_string())
    }) {
        Ok((entry_id, reflection_id)) => {
            let mut response = ActionResponse::success("Reflection saved.", true);
            response.ids = vec![entry_id.to_string(), reflection_id.to_string()];
            response
        }
        Err(err) => ActionResponse::failure(format!("diary_add failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn diary_update(entry_id: String, reflection_id: String, text: String) -> ActionResponse {
    let ids = match parse_ids(&entry_id, &reflection_id) {
        Ok(ids) => ids,
        Err(err) => return ActionResponse::failure(format!("diary_update failed: {err}")),
    };
    match with_diary(|store| {
        store
            .update_reflection(ids.0, ids.1, text)
            .map_err(|err| err.to_string())
    }) {
        Ok(changed) => ActionResponse::success("Reflection updated.", changed),
        Err(err) => ActionResponse::failure(format!("diary_update failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn diary_delete(entry_id: String, reflection_id: String) -> ActionResponse {
    let ids = match parse_ids(&entry_id, &reflection_id) {
        Ok(ids) => ids,
        Err(err) => return ActionResponse::failure(format!("diary_delete failed: {err}")),
    };
    match with_diary(|store| {
        store
            .delete_reflection(ids.0, ids.1)
            .map_err(|err| err.to_string())
    }) {
        Ok(changed) => ActionResponse::success("Reflection deleted.", changed),
        Err(err) => ActionResponse::failure(format!("diary_delete failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_get(text: String, author: String) -> NoteResponse {
    let quote = Quote::new(text, author);
    let result = with_connection(|repo| {
        let store = QuoteNoteStore::open(&repo).map_err(|err| err.to_string())?;
        Ok(store.note_for(&quote).map(str::to_string))
    });
    match result {
        Ok(note) => NoteResponse {
            ok: true,
            note,
            message: String::new(),
        },
        Err(err) => NoteResponse {
            ok: false,
            note: None,
            message: format!("note_get failed: {err}"),
        },
    }
}

/// Saves the quote's note; blank text deletes it.
#[flutter_rust_bridge::frb(sync)]
pub fn note_set(text: String, author: String, note: String) -> ActionResponse {
    let quote = Quote::new(text, author);
    let result = with_connection(|repo| {
        let mut store = QuoteNoteStore::open(&repo).map_err(|err| err.to_string())?;
        store.set_note(&quote, &note).map_err(|err| err.to_string())
    });
    match result {
        Ok(changed) => ActionResponse::success("Note saved.", changed),
        Err(err) => ActionResponse::failure(format!("note_set failed: {err}")),
    }
}

/// Opens every store in recovering mode, quarantining corrupt blobs.
///
/// Intended for an explicit "repair data" action after a store reported
/// corrupt data.
#[flutter_rust_bridge::frb(sync)]
pub fn store_recover() -> ActionResponse {
    let result = with_connection(|repo| {
        let statuses = [
            FavoritesStore::open_recovering(&repo).map(|(_, status)| status),
            DiaryStore::open_recovering(&repo).map(|(_, status)| status),
            QuoteNoteStore::open_recovering(&repo).map(|(_, status)| status),
        ];
        let mut quarantined = Vec::new();
        for status in statuses {
            if let OpenStatus::Quarantined { backup_key } = status.map_err(|err| err.to_string())? {
                quarantined.push(backup_key);
            }
        }
        Ok(quarantined)
    });
    match result {
        Ok(quarantined) if quarantined.is_empty() => {
            ActionResponse::success("All stores are readable.", false)
        }
        Ok(quarantined) => {
            let mut response = ActionResponse::success(
                format!("Moved {} corrupt store(s) aside.", quarantined.len()),
                true,
            );
            response.ids = quarantined;
            response
        }
        Err(err) => ActionResponse::failure(format!("store_recover failed: {err}")),
    }
}

/// Fetches a new quote.
///
/// A blank `category` uses the configured default. When calls overlap, only
/// the latest one updates shared fetch state; earlier calls return
/// `applied = false` with the state the latest call produced.
pub async fn quote_fetch(category: String) -> QuoteFetchResponse {
    let config = match resolve_config() {
        Ok(config) => config,
        Err(err) => return fetch_failure(format!("quote_fetch failed: {err}")),
    };
    let source = match HttpQuoteSource::from_config(config) {
        Ok(source) => source,
        Err(err) => return fetch_failure(format!("quote_fetch failed: {err}")),
    };

    let (ticket, category) = {
        let mut coordinator = lock_fetch();
        let category = category.trim();
        coordinator.set_category(if category.is_empty() {
            config.category.as_str()
        } else {
            category
        });
        (coordinator.begin(), coordinator.category().to_string())
    };

    let result = source.fetch(&category).await;

    let mut coordinator = lock_fetch();
    let applied = coordinator.complete(ticket, result);
    to_fetch_response(coordinator.state(), applied)
}

/// Returns the current shared fetch state without starting a request.
#[flutter_rust_bridge::frb(sync)]
pub fn quote_fetch_state() -> QuoteFetchResponse {
    to_fetch_response(lock_fetch().state(), true)
}

fn resolve_config() -> Result<&'static CoreConfig, String> {
    CONFIG
        .get_or_try_init(CoreConfig::from_env)
        .map_err(|err| err.to_string())
}

fn lock_fetch() -> MutexGuard<'static, QuoteFetchCoordinator> {
    FETCH.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_connection<T>(
    f: impl FnOnce(SqliteKvRepository<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let config = resolve_config()?;
    let conn = open_db(&config.db_path).map_err(|err| format!("store open failed: {err}"))?;
    let repo = SqliteKvRepository::try_new(&conn)
        .map_err(|err| format!("store repo init failed: {err}"))?;
    f(repo)
}

fn with_favorites<T>(
    f: impl FnOnce(&mut FavoritesStore<SqliteKvRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    with_connection(|repo| {
        let mut store = FavoritesStore::open(repo).map_err(|err| {
            warn!("event=ffi_store_open module=ffi status=error store=favorites error={err}");
            err.to_string()
        })?;
        f(&mut store)
    })
}

fn with_diary<T>(
    f: impl FnOnce(&mut DiaryStore<SqliteKvRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    with_connection(|repo| {
        let mut store = DiaryStore::open(repo).map_err(|err| {
            warn!("event=ffi_store_open module=ffi status=error store=diary error={err}");
            err.to_string()
        })?;
        f(&mut store)
    })
}

fn parse_ids(entry_id: &str, reflection_id: &str) -> Result<(Uuid, Uuid), String> {
    let entry = Uuid::parse_str(entry_id.trim())
        .map_err(|_| format!("invalid entry_id `{entry_id}`"))?;
    let reflection = Uuid::parse_str(reflection_id.trim())
        .map_err(|_| format!("invalid reflection_id `{reflection_id}`"))?;
    Ok((entry, reflection))
}

fn fetch_failure(message: String) -> QuoteFetchResponse {
    QuoteFetchResponse {
        applied: false,
        is_loading: false,
        quote: None,
        error_message: Some(message),
    }
}

fn to_fetch_response(state: &FetchState, applied: bool) -> QuoteFetchResponse {
    QuoteFetchResponse {
        applied,
        is_loading: state.is_loading,
        quote: state.quote.as_ref().map(to_quote_item),
        error_message: state.error_message.clone(),
    }
}

fn to_quote_item(quote: &Quote) -> QuoteItem {
    QuoteItem {
        text: quote.text.clone(),
        author: quote.author.clone(),
        category: quote.category.clone(),
    }
}

fn to_reflection_item(reflection: &Reflection) -> ReflectionItem {
    ReflectionItem {
        reflection_id: reflection.id.to_string(),
        text: reflection.text.clone(),
        timestamp_ms: reflection.timestamp_ms,
    }
}

fn to_diary_item(entry: &DiaryEntry) -> DiaryEntryItem {
    let mut reflections = entry
        .reflections
        .iter()
        .map(to_reflection_item)
        .collect::<Vec<_>>();
    reflections.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    DiaryEntryItem {
        entry_id: entry.id.to_string(),
        quote: to_quote_item(&entry.quote),
        reflections,
    }
}
