//! Domain model shared by favorites, diary and quote notes.
//!
//! # Responsibility
//! - Define the value types every store copies and persists.
//! - Define logical quote identity (`QuoteKey`).
//! - Hold the pure collection logic; persistence lives in `service`.
//!
//! # Invariants
//! - Quote identity is the `(text, author)` pair, never the generated `id`.
//! - Stores own their own copies; no value is shared by reference.

pub mod diary;
pub mod favorites;
pub mod note;
pub mod quote;
