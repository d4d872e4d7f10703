//! Quote value type and logical identity.
//!
//! # Invariants
//! - `QuoteKey` is the only equality used for deduplication.
//! - `id` is opaque: network payloads never carry one, so decoding generates
//!   a fresh UUID. Persisted quotes keep theirs.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque per-instance identifier for a quote value.
pub type QuoteId = Uuid;

/// One quote as shown to the user.
///
/// Field names on the wire and on disk follow the quote API payload
/// (`quote`, `author`, `category`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default = "Uuid::new_v4")]
    pub id: QuoteId,
    /// Serialized as `quote` to match the upstream payload.
    #[serde(rename = "quote")]
    pub text: String,
    pub author: String,
    /// Set by the favorites store when filed. Upstream fills it with its own
    /// topic label, which the store overwrites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Quote {
    /// Creates an uncategorized quote with a generated id.
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author: author.into(),
            category: None,
        }
    }

    /// Returns the owned logical identity of this quote.
    pub fn key(&self) -> QuoteKey {
        QuoteKey::new(self.text.as_str(), self.author.as_str())
    }

    /// Returns whether both values denote the same logical quote.
    pub fn same_as(&self, other: &Quote) -> bool {
        self.text == other.text && self.author == other.author
    }

    /// Returns whether this quote has the given logical identity.
    pub fn matches(&self, key: &QuoteKey) -> bool {
        self.text == key.text && self.author == key.author
    }
}

/// Logical quote identity: the `(text, author)` pair.
///
/// A struct instead of a joined string, so a text that ends with the
/// author's name can never collide with another pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuoteKey {
    pub text: String,
    pub author: String,
}

impl QuoteKey {
    pub fn new<'a>(text: impl Into<Cow<'a, str>>, author: impl Into<Cow<'a, str>>) -> Self {
        Self {
            text: text.into().into_owned(),
            author: author.into().into_owned(),
        }
    }
}

impl From<&Quote> for QuoteKey {
    fn from(value: &Quote) -> Self {
        value.key()
    }
}

impl Display for QuoteKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\u{201c}{}\u{201d} - {}", self.text, self.author)
    }
}

#[cfg(test)]
mod tests {
    use super::{Quote, QuoteKey};

    #[test]
    fn identity_ignores_id_and_category() {
        let mut first = Quote::new("Be yourself.", "R. Emerson");
        let second = Quote::new("Be yourself.", "R. Emerson");
        first.category = Some("Motivation".to_string());

        assert_ne!(first.id, second.id);
        assert!(first.same_as(&second));
        assert_eq!(first.key(), second.key());
    }

    #[test]
    fn key_does_not_collide_on_shifted_boundary() {
        let left = QuoteKey::new("Stay hungry_Steve", "Jobs");
        let right = QuoteKey::new("Stay hungry", "Steve_Jobs");
        assert_ne!(left, right);
    }

    #[test]
    fn decoding_payload_without_id_generates_one() {
        let first: Quote =
            serde_json::from_str(r#"{"quote":"Q","author":"A","category":"life"}"#).unwrap();
        let second: Quote = serde_json::from_str(r#"{"quote":"Q","author":"A"}"#).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.category.as_deref(), Some("life"));
        assert_eq!(second.category, None);
    }

    #[test]
    fn persisted_quote_keeps_its_id() {
        let quote = Quote::new("Q", "A");
        let encoded = serde_json::to_string(&quote).unwrap();
        assert!(encoded.contains("\"quote\":\"Q\""));
        let decoded: Quote = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, quote);
    }
}
