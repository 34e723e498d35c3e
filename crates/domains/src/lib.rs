//! inkwell/crates/domains/src/lib.rs
//!
//! The central domain model and port definitions for the Inkwell
//! engagement engine. No I/O happens here.

pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
