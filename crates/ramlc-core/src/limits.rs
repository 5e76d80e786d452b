//! # Recursion Limits
//!
//! Every recursive point of the engine is bounded by one shared constant per
//! recursion class. These bounds stand in for cancellation: they guarantee
//! termination on malformed or cyclic input.

use serde::{Deserialize, Serialize};

/// Maximum number of whole-text `!include` expansion passes.
pub const MAX_INCLUDE_PASSES: usize = 10;

/// Maximum depth of type-to-type expansion.
pub const MAX_TYPE_DEPTH: usize = 10;

/// Maximum depth of nested `uses:` library imports.
pub const MAX_LIBRARY_DEPTH: usize = 10;

/// Maximum depth of schema validation recursion.
pub const MAX_VALIDATION_DEPTH: usize = 100;

/// Configurable recursion bounds. Defaults are the constants above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Limits {
    /// Bound on `!include` passes (and on nested include depth).
    pub include_passes: usize,
    /// Bound on type expansion depth.
    pub type_depth: usize,
    /// Bound on nested library imports.
    pub library_depth: usize,
    /// Bound on validation recursion depth.
    pub validation_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            include_passes: MAX_INCLUDE_PASSES,
            type_depth: MAX_TYPE_DEPTH,
            library_depth: MAX_LIBRARY_DEPTH,
            validation_depth: MAX_VALIDATION_DEPTH,
        }
    }
}
