//! Quote source seam and the HTTP implementation.

use crate::config::CoreConfig;
use crate::fetch::{FetchError, FetchResult};
use crate::model::quote::Quote;
use reqwest::{Client, Url};
use std::future::Future;
use std::time::Duration;

/// Header carrying the upstream API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can produce one quote for a category.
pub trait QuoteSource {
    fn fetch(&self, category: &str) -> impl Future<Output = FetchResult<Quote>> + Send;
}

/// Fetches quotes with `GET <endpoint>?category=<category>`.
pub struct HttpQuoteSource {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpQuoteSource {
    /// Builds a source for `endpoint`.
    ///
    /// # Errors
    /// - `InvalidEndpoint` when `endpoint` is not an http(s) URL.
    /// - `Transport` when the HTTP client cannot be constructed.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> FetchResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &CoreConfig) -> FetchResult<Self> {
        Self::new(&config.quote_endpoint, config.api_key.clone())
    }

    /// Full request URL for `category`; a blank category sends no filter.
    pub fn request_url(&self, category: &str) -> Url {
        let mut url = self.endpoint.clone();
        let category = category.trim();
        if !category.is_empty() {
            url.query_pairs_mut().append_pair("category", category);
        }
        url
    }
}

impl QuoteSource for HttpQuoteSource {
    async fn fetch(&self, category: &str) -> FetchResult<Quote> {
        let response = self
            .client
            .get(self.request_url(category))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        decode_quote_response(&body)
    }
}

/// Decodes an upstream payload and keeps its first quote.
pub fn decode_quote_response(body: &str) -> FetchResult<Quote> {
    let quotes: Vec<Quote> = serde_json::from_str(body)?;
    quotes.into_iter().next().ok_or(FetchError::Empty)
}

/// Parses and checks a quote endpoint URL.
pub fn parse_endpoint(endpoint: &str) -> FetchResult<Url> {
    let url = Url::parse(endpoint.trim())
        .map_err(|_| FetchError::InvalidEndpoint(endpoint.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FetchError::InvalidEndpoint(endpoint.to_string())),
    }
}
