//! Common types and utilities shared by the kava crates.
//!
//! - String interning (`Atom`, `ShardedInterner`) for class names, annotation
//!   names and member names
//! - Centralized limits for the recursive type walkers

// String interning for qualified-name deduplication
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Centralized limits and thresholds
pub mod limits;
