use quoteday_core::db::{open_db, open_db_in_memory};
use quoteday_core::{
    FavoritesCollection, FavoritesStore, KvRepository, Quote, SqliteKvRepository, StoreError,
    FAVORITES_KEY,
};
use std::collections::BTreeSet;

fn set_of(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn add_files_quote_under_single_category() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("Stay hungry.", "S. Jobs");

    store.add(&quote, "x").unwrap();

    assert!(store.contains(&quote));
    assert_eq!(store.categories_for(&quote), set_of(&["x"]));
}

#[test]
fn add_into_other_category_moves_and_drops_emptied_one() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("Stay hungry.", "S. Jobs");

    store.add(&quote, "x").unwrap();
    store.add(&quote, "y").unwrap();

    assert_eq!(store.categories_for(&quote), set_of(&["y"]));
    assert_eq!(store.category_names(), vec!["y"]);
    assert_eq!(store.quotes_in("y")[0].category.as_deref(), Some("y"));
}

#[test]
fn add_matches_logical_identity_not_id() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();

    store.add(&Quote::new("Q", "A"), "x").unwrap();
    store.add(&Quote::new("Q", "A"), "x").unwrap();

    assert_eq!(store.quotes_in("x").len(), 1);
}

#[test]
fn remove_then_contains_is_false_and_empty_category_is_dropped() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("Q", "A");
    store.add(&quote, "x").unwrap();

    assert!(store.remove(&quote).unwrap());
    assert!(!store.contains(&quote));
    assert!(store.collection().is_empty());
    assert!(!store.remove(&quote).unwrap());
}

#[test]
fn remove_at_and_remove_category() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    for text in ["a", "b", "c"] {
        store.add(&Quote::new(text, "A"), "letters").unwrap();
    }
    store.add(&Quote::new("1", "N"), "numbers").unwrap();

    assert_eq!(store.remove_at(&[0, 2], "letters").unwrap(), 2);
    let texts: Vec<&str> = store
        .quotes_in("letters")
        .iter()
        .map(|quote| quote.text.as_str())
        .collect();
    assert_eq!(texts, vec!["b"]);

    assert!(store.remove_category("numbers").unwrap());
    assert!(!store.remove_category("numbers").unwrap());
    assert_eq!(store.category_names(), vec!["letters"]);
}

#[test]
fn rename_moves_quotes_and_removes_old_key() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    store.add(&Quote::new("one", "A"), "a").unwrap();
    store.add(&Quote::new("two", "A"), "a").unwrap();

    assert!(store.rename_category("a", "b").unwrap());

    assert_eq!(store.category_names(), vec!["b"]);
    let texts: Vec<&str> = store
        .quotes_in("b")
        .iter()
        .map(|quote| quote.text.as_str())
        .collect();
    assert_eq!(texts, vec!["one", "two"]);
    assert!(store
        .quotes_in("b")
        .iter()
        .all(|quote| quote.category.as_deref() == Some("b")));
}

#[test]
fn rename_onto_existing_category_merges_after_existing_quotes() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    store.add(&Quote::new("from a", "A"), "a").unwrap();
    store.add(&Quote::new("from b", "B"), "b").unwrap();

    assert!(store.rename_category("a", "b").unwrap());

    assert_eq!(store.category_names(), vec!["b"]);
    let texts: Vec<&str> = store
        .quotes_in("b")
        .iter()
        .map(|quote| quote.text.as_str())
        .collect();
    assert_eq!(texts, vec!["from b", "from a"]);
}

#[test]
fn rename_no_op_cases_return_false() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    store.add(&Quote::new("q", "A"), "a").unwrap();

    assert!(!store.rename_category("a", "a").unwrap());
    assert!(!store.rename_category("missing", "b").unwrap());
    assert_eq!(store.category_names(), vec!["a"]);
}

#[test]
fn blank_category_is_rejected_and_names_are_normalized() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("q", "A");

    let err = store.add(&quote, "   ").unwrap_err();
    assert!(matches!(err, StoreError::InvalidCategory(_)));
    assert!(!store.contains(&quote));

    store.add(&quote, "  Deep   Thoughts ").unwrap();
    assert_eq!(store.category_names(), vec!["Deep Thoughts"]);
}

#[test]
fn lookup_and_removal_names_are_normalized_like_add() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    store.add(&Quote::new("one", "A"), "Deep Thoughts").unwrap();
    store.add(&Quote::new("two", "A"), "Deep Thoughts").unwrap();
    store.add(&Quote::new("three", "A"), "Wisdom").unwrap();

    assert_eq!(store.quotes_in("  Deep \t Thoughts ").len(), 2);
    assert_eq!(store.remove_at(&[0], " Deep  Thoughts").unwrap(), 1);
    assert!(store.rename_category("  Deep Thoughts  ", "Musings").unwrap());
    assert!(store.remove_category(" Wisdom ").unwrap());
    assert!(!store.remove_category("   ").unwrap());
    assert!(!store.rename_category("   ", "Other").unwrap());

    assert_eq!(store.category_names(), vec!["Musings"]);
    assert_eq!(store.quotes_in("Musings")[0].text, "two");
    assert!(store.quotes_in("  ").is_empty());
}

#[test]
fn all_quotes_walks_categories_in_name_order() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    store.add(&Quote::new("z1", "A"), "zeta").unwrap();
    store.add(&Quote::new("a1", "A"), "alpha").unwrap();
    store.add(&Quote::new("a2", "A"), "alpha").unwrap();

    let texts: Vec<&str> = store.all_quotes().map(|quote| quote.text.as_str()).collect();
    assert_eq!(texts, vec!["a1", "a2", "z1"]);
}

#[test]
fn every_mutation_is_persisted_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.sqlite3");
    let quote = Quote::new("Be yourself.", "R. Emerson");

    {
        let conn = open_db(&path).unwrap();
        let mut store =
            FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
        store.add(&quote, "Motivation").unwrap();
        store.add(&Quote::new("Other", "B"), "Motivation").unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let texts: Vec<&str> = store
        .quotes_in("Motivation")
        .iter()
        .map(|item| item.text.as_str())
        .collect();
    assert_eq!(texts, vec!["Be yourself.", "Other"]);
    assert!(store.contains(&quote));
}

#[test]
fn persisted_blob_round_trips_to_equal_collection() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = FavoritesStore::open(&repo).unwrap();
    store.add(&Quote::new("z", "A"), "b").unwrap();
    store.add(&Quote::new("y", "A"), "b").unwrap();
    store.add(&Quote::new("x", "A"), "a").unwrap();

    let raw = repo.get_value(FAVORITES_KEY).unwrap().unwrap();
    let decoded: FavoritesCollection = serde_json::from_str(&raw).unwrap();
    assert_eq!(&decoded, store.collection());
}

#[test]
fn failed_write_leaves_memory_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let mut store = FavoritesStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let kept = Quote::new("kept", "A");
    store.add(&kept, "x").unwrap();

    conn.execute_batch("DROP TABLE kv_entries;").unwrap();

    let err = store.add(&Quote::new("lost", "A"), "y").unwrap_err();
    assert!(matches!(err, StoreError::Repo(_)));
    assert_eq!(store.category_names(), vec!["x"]);
    assert!(store.contains(&kept));
    assert!(store.remove(&kept).is_err());
    assert!(store.contains(&kept));
}

#[test]
fn mutate_applies_and_persists_in_one_step() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = FavoritesStore::open(&repo).unwrap();

    let count = store
        .mutate(|favorites| {
            favorites.add(&Quote::new("a", "A"), "x");
            favorites.add(&Quote::new("b", "A"), "x");
            favorites.quotes_in("x").len()
        })
        .unwrap();
    assert_eq!(count, 2);

    let reopened = FavoritesStore::open(&repo).unwrap();
    assert_eq!(reopened.quotes_in("x").len(), 2);
}
