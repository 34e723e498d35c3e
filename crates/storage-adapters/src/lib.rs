//! # storage-adapters
//!
//! Implementations of the `domains` repository ports.
//!
//! Only the in-memory backend exists today. It keeps every entity keyed by id
//! and gives each mutation a single-entry atomic unit, which is what the
//! services rely on for per-entity serializability.

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;
