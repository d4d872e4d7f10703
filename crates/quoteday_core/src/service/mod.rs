//! Persisted stores composed by the shell.
//!
//! # Responsibility
//! - Bind each collection to its key-value slot.
//! - Keep FFI/CLI layers decoupled from storage details.
//!
//! # Invariants
//! - Stores are constructed explicitly; there are no process-wide
//!   singletons.
//! - The only write path is change-then-save through `persist::Persisted`.

pub mod diary_service;
pub mod favorites_service;
pub mod note_service;
pub mod persist;
