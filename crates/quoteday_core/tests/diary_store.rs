use quoteday_core::db::open_db_in_memory;
use quoteday_core::{
    Diary, DiaryStore, FavoritesStore, KvRepository, Quote, SqliteKvRepository, DIARY_KEY,
};
use uuid::Uuid;

#[test]
fn second_reflection_appends_to_existing_entry() {
    let conn = open_db_in_memory().unwrap();
    let mut store = DiaryStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("Know thyself.", "Socrates");

    let (first_entry, first_reflection) = store.add_entry(&quote, "note1").unwrap();
    let (second_entry, second_reflection) =
        store.add_entry(&Quote::new("Know thyself.", "Socrates"), "note2").unwrap();

    assert_eq!(first_entry, second_entry);
    assert_ne!(first_reflection, second_reflection);
    assert_eq!(store.entries().len(), 1);

    let reflections = &store.entries()[0].reflections;
    assert_eq!(reflections.len(), 2);
    assert_eq!(reflections[0].text, "note1");
    assert_eq!(reflections[1].text, "note2");
    assert!(reflections[1].timestamp_ms > reflections[0].timestamp_ms);
}

#[test]
fn entry_is_found_by_id_until_its_last_reflection_is_deleted() {
    let conn = open_db_in_memory().unwrap();
    let mut store = DiaryStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();

    let (entry_id, reflection_id) = store.add_entry(&Quote::new("Q", "A"), "only").unwrap();
    let entry = store.diary().entry(entry_id).expect("entry exists");
    assert_eq!(entry.quote.text, "Q");
    assert_eq!(entry.reflections[0].id, reflection_id);
    assert!(store.diary().entry(Uuid::new_v4()).is_none());

    assert!(store.delete_reflection(entry_id, reflection_id).unwrap());
    assert!(store.diary().entry(entry_id).is_none());
}

#[test]
fn distinct_quotes_get_distinct_entries() {
    let conn = open_db_in_memory().unwrap();
    let mut store = DiaryStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();

    store.add_entry(&Quote::new("Q", "A"), "one").unwrap();
    store.add_entry(&Quote::new("Q", "B"), "two").unwrap();

    assert_eq!(store.entries().len(), 2);
}

#[test]
fn update_reflection_replaces_text_and_ignores_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let mut store = DiaryStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("Q", "A");
    let (entry_id, reflection_id) = store.add_entry(&quote, "draft").unwrap();
    let stamp = store.entries()[0].reflections[0].timestamp_ms;

    assert!(store
        .update_reflection(entry_id, reflection_id, "final")
        .unwrap());
    assert!(!store
        .update_reflection(Uuid::new_v4(), reflection_id, "x")
        .unwrap());
    assert!(!store
        .update_reflection(entry_id, Uuid::new_v4(), "x")
        .unwrap());

    let reflections = store.reflections_for(&quote);
    assert_eq!(reflections.len(), 1);
    assert_eq!(reflections[0].text, "final");
    assert_eq!(reflections[0].id, reflection_id);
    assert_eq!(reflections[0].timestamp_ms, stamp);
}

#[test]
fn deleting_only_reflection_removes_entry() {
    let conn = open_db_in_memory().unwrap();
    let mut store = DiaryStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("Q", "A");
    let (entry_id, reflection_id) = store.add_entry(&quote, "only").unwrap();

    assert!(store.delete_reflection(entry_id, reflection_id).unwrap());

    assert!(store.entries().is_empty());
    assert!(store.reflections_for(&quote).is_empty());
    assert!(!store.delete_reflection(entry_id, reflection_id).unwrap());
}

#[test]
fn deleting_one_of_two_reflections_keeps_entry() {
    let conn = open_db_in_memory().unwrap();
    let mut store = DiaryStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("Q", "A");
    let (entry_id, first) = store.add_entry(&quote, "one").unwrap();
    store.add_entry(&quote, "two").unwrap();

    assert!(store.delete_reflection(entry_id, first).unwrap());

    let texts: Vec<&str> = store
        .reflections_for(&quote)
        .iter()
        .map(|reflection| reflection.text.as_str())
        .collect();
    assert_eq!(texts, vec!["two"]);
}

#[test]
fn diary_snapshot_is_independent_of_favorites() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut favorites = FavoritesStore::open(&repo).unwrap();
    let mut diary = DiaryStore::open(&repo).unwrap();
    let quote = Quote::new("Q", "A");

    favorites.add(&quote, "First").unwrap();
    diary.add_entry(&favorites.quotes_in("First")[0], "thought").unwrap();
    favorites.move_quote(&quote, "Second").unwrap();

    assert_eq!(diary.entries()[0].quote.category.as_deref(), Some("First"));
    assert_eq!(
        favorites.quotes_in("Second")[0].category.as_deref(),
        Some("Second")
    );
}

#[test]
fn search_uses_reflections_and_favorite_categories() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut favorites = FavoritesStore::open(&repo).unwrap();
    let mut diary = DiaryStore::open(&repo).unwrap();
    let filed = Quote::new("Filed", "A");
    let loose = Quote::new("Loose", "B");

    favorites.add(&filed, "Gratitude").unwrap();
    diary.add_entry(&filed, "morning pages").unwrap();
    diary.add_entry(&loose, "Grateful for coffee").unwrap();

    let hits: Vec<&str> = diary
        .search("GRAT", favorites.collection())
        .iter()
        .map(|entry| entry.quote.text.as_str())
        .collect();
    assert_eq!(hits, vec!["Filed", "Loose"]);
}

#[test]
fn persisted_entries_round_trip_with_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut store = DiaryStore::open(&repo).unwrap();
    store.add_entry(&Quote::new("b", "A"), "1").unwrap();
    store.add_entry(&Quote::new("a", "A"), "2").unwrap();
    store.add_entry(&Quote::new("b", "A"), "3").unwrap();

    let raw = repo.get_value(DIARY_KEY).unwrap().unwrap();
    let decoded: Diary = serde_json::from_str(&raw).unwrap();
    assert_eq!(&decoded, store.diary());

    let reopened = DiaryStore::open(&repo).unwrap();
    assert_eq!(reopened.diary(), store.diary());
    let texts: Vec<&str> = reopened.entries()[0]
        .reflections
        .iter()
        .map(|reflection| reflection.text.as_str())
        .collect();
    assert_eq!(texts, vec!["1", "3"]);
}

#[test]
fn grouped_lists_newest_reflection_first() {
    let conn = open_db_in_memory().unwrap();
    let mut store = DiaryStore::open(SqliteKvRepository::try_new(&conn).unwrap()).unwrap();
    let quote = Quote::new("Q", "A");
    store.add_entry(&quote, "older").unwrap();
    store.add_entry(&quote, "newer").unwrap();

    let groups = store.grouped();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].reflections[0].text, "newer");
}
