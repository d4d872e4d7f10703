//! Flutter-facing bindings for QuoteDay core.

pub mod api;
