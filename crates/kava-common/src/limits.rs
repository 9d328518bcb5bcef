//! Centralized capacity constants for the type walkers.
//!
//! Inline capacities are tuned for the common shape of imported signatures:
//! most generic types carry one or two arguments and most signature parts have
//! fewer than a dozen nodes.

/// Inline capacity for type-argument lists.
pub const TYPE_ARGS_INLINE: usize = 2;

/// Inline capacity for per-call node tables (subtree sizes, qualifier tables).
pub const NODE_TABLE_INLINE: usize = 8;
