//! # Error Types
//!
//! Domain-specific error types for appshelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  appshelf-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Record / snapshot validation failures          │
//! │                                                                         │
//! │  appshelf-data errors (separate crate)                                 │
//! │  ├── FetchError       - What a fetch hook surfaces in its state        │
//! │  └── ConfigError      - Configuration load/save failures               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record kind string did not name a known collection.
    ///
    /// ## When This Occurs
    /// - Parsing a kind from a CLI flag or config value
    /// - A snapshot file uses a collection name we do not serve
    #[error("Unknown record kind: {0}")]
    UnknownRecordKind(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Record and input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Duplicate value (e.g., two records sharing one id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
