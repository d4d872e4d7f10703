//! Repository layer over the durable key-value blob store.
//!
//! # Responsibility
//! - Define the get/set/remove contract the stores persist through.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Every write replaces one whole value; there are no cross-key
//!   transactions.

pub mod kv_repo;
