use quoteday_core::{FetchError, FetchResult, Quote, QuoteFetchCoordinator, QuoteSource};
use std::sync::Mutex;

/// Replays canned results and records requested categories.
struct ScriptedSource {
    results: Mutex<Vec<FetchResult<Quote>>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(mut results: Vec<FetchResult<Quote>>) -> Self {
        results.reverse();
        Self {
            results: Mutex::new(results),
            requested: Mutex::new(Vec::new()),
        }
    }
}

impl QuoteSource for ScriptedSource {
    async fn fetch(&self, category: &str) -> FetchResult<Quote> {
        self.requested.lock().unwrap().push(category.to_string());
        self.results.lock().unwrap().pop().unwrap_or(Err(FetchError::Empty))
    }
}

#[tokio::test]
async fn fetch_stores_quote_for_current_category() {
    let source = ScriptedSource::new(vec![Ok(Quote::new("Carpe diem.", "Horace"))]);
    let mut coordinator = QuoteFetchCoordinator::new("happiness");

    assert!(coordinator.fetch(&source).await);

    let state = coordinator.state();
    assert!(!state.is_loading);
    assert_eq!(state.error_message, None);
    assert_eq!(
        state.quote.as_ref().map(|quote| quote.text.as_str()),
        Some("Carpe diem.")
    );
    assert_eq!(*source.requested.lock().unwrap(), vec!["happiness".to_string()]);
}

#[tokio::test]
async fn failed_fetch_is_recoverable_by_retrying() {
    let source = ScriptedSource::new(vec![
        Err(FetchError::Status(503)),
        Ok(Quote::new("Try again.", "Anon")),
    ]);
    let mut coordinator = QuoteFetchCoordinator::default();

    coordinator.fetch(&source).await;
    assert!(coordinator.state().quote.is_none());
    assert!(coordinator.state().error_message.is_some());

    coordinator.set_category("courage");
    coordinator.fetch(&source).await;
    assert_eq!(coordinator.state().error_message, None);
    assert!(coordinator.state().quote.is_some());
    assert_eq!(
        *source.requested.lock().unwrap(),
        vec!["life".to_string(), "courage".to_string()]
    );
}

#[tokio::test]
async fn late_response_from_earlier_request_is_discarded() {
    let source = ScriptedSource::new(vec![
        Ok(Quote::new("early", "A")),
        Ok(Quote::new("late", "B")),
    ]);
    let mut coordinator = QuoteFetchCoordinator::default();

    let first = coordinator.begin();
    let early = source.fetch(coordinator.category()).await;
    let second = coordinator.begin();
    let late = source.fetch(coordinator.category()).await;

    assert!(coordinator.complete(second, late));
    assert!(!coordinator.complete(first, early));
    assert_eq!(
        coordinator.state().quote.as_ref().map(|quote| quote.text.as_str()),
        Some("late")
    );
    assert!(second.id() > first.id());
}
