//! Fetch coordinator: loading/error/result state for one quote view.
//!
//! # Invariants
//! - `begin` issues strictly increasing request ids.
//! - `complete` with anything but the latest ticket is dropped, so a slow
//!   earlier response can never overwrite a later one.

use crate::fetch::source::QuoteSource;
use crate::fetch::FetchResult;
use crate::model::quote::Quote;
use log::{debug, info, warn};

/// Category requested when the user has not picked one.
pub const DEFAULT_CATEGORY: &str = "life";

/// Proof of one issued request; hand it back to `complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket {
    id: u64,
}

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Presentation-facing fetch state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    pub quote: Option<Quote>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

pub struct QuoteFetchCoordinator {
    state: FetchState,
    category: String,
    latest_request: u64,
}

impl Default for QuoteFetchCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY)
    }
}

impl QuoteFetchCoordinator {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            state: FetchState::default(),
            category: category.into(),
            latest_request: 0,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    /// Starts a request: clears quote and error, raises the loading flag.
    pub fn begin(&mut self) -> RequestTicket {
        self.latest_request += 1;
        self.state = FetchState {
            quote: None,
            is_loading: true,
            error_message: None,
        };
        debug!(
            "event=quote_fetch module=fetch status=start request_id={}",
            self.latest_request
        );
        RequestTicket {
            id: self.latest_request,
        }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.id == self.latest_request
    }

    /// Applies a finished request. Returns `false` when the ticket is stale
    /// and the result was dropped.
    pub fn complete(&mut self, ticket: RequestTicket, result: FetchResult<Quote>) -> bool {
        if !self.is_current(ticket) {
            warn!(
                "event=quote_fetch module=fetch status=stale request_id={} latest_request_id={}",
                ticket.id, self.latest_request
            );
            return false;
        }

        self.state.is_loading = false;
        match result {
            Ok(quote) => {
                info!(
                    "event=quote_fetch module=fetch status=ok request_id={}",
                    ticket.id
                );
                self.state.quote = Some(quote);
            }
            Err(err) => {
                warn!(
                    "event=quote_fetch module=fetch status=error request_id={} error_code={} error={}",
                    ticket.id,
                    err.code(),
                    err
                );
                self.state.error_message = Some(err.to_string());
            }
        }
        true
    }

    /// Issues one request against `source` for the current category.
    pub async fn fetch<S: QuoteSource>(&mut self, source: &S) -> bool {
        let ticket = self.begin();
        let category = self.category.clone();
        let result = source.fetch(&category).await;
        self.complete(ticket, result)
    }
}
