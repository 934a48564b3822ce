//! # Data Layer Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  RemoteCatalogSource failure                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FetchError (this module) ← Network / NotFound / Unauthenticated       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FetchState.error ← hooks never return errors across their boundary    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UI decides: "not found" page, error banner, or a manual retry         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Fetch Error
// =============================================================================

/// Failure of a fetch, toggle or tracking call.
///
/// `Clone + PartialEq` because it is stored inside [`crate::FetchState`] and
/// broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    /// The remote call failed or was rejected.
    ///
    /// ## When This Occurs
    /// - Transport failure
    /// - Backend rejected the query
    /// - The source could not decode its response
    #[error("Network error: {0}")]
    Network(String),

    /// A single-record fetch found nothing.
    ///
    /// Kept apart from `Network` so callers can render a dedicated
    /// "not found" state instead of a generic error banner.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// A per-user operation was attempted without an identity.
    #[error("Sign in required")]
    Unauthenticated,
}

impl FetchError {
    /// Creates a NotFound error for a given kind and id.
    pub fn not_found(kind: impl ToString, id: impl Into<String>) -> Self {
        FetchError::NotFound {
            kind: kind.to_string(),
            id: id.into(),
        }
    }

    /// Creates a Network error from anything displayable.
    pub fn network(message: impl ToString) -> Self {
        FetchError::Network(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, FetchError::Unauthenticated)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Network(format!("malformed payload: {}", err))
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

// =============================================================================
// Config Error
// =============================================================================

/// Configuration load/save/validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The snapshot named by the config could not be used.
    #[error("Invalid snapshot {path}: {reason}")]
    Snapshot { path: String, reason: String },
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            FetchError::not_found("post", "p-9").to_string(),
            "post not found: p-9"
        );
        assert_eq!(
            FetchError::network("connection reset").to_string(),
            "Network error: connection reset"
        );
    }

    #[test]
    fn test_categories() {
        assert!(FetchError::not_found("application", "x").is_not_found());
        assert!(!FetchError::network("x").is_not_found());
        assert!(FetchError::Unauthenticated.is_unauthenticated());
    }

    #[test]
    fn test_serializes_with_code() {
        let json = serde_json::to_value(FetchError::not_found("post", "p-1")).unwrap();
        assert_eq!(json["code"], "not_found");
        assert_eq!(json["detail"]["id"], "p-1");

        let json = serde_json::to_value(FetchError::Unauthenticated).unwrap();
        assert_eq!(json["code"], "unauthenticated");
    }

    #[test]
    fn test_toml_error_converts() {
        let err: ConfigError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert!(matches!(err, ConfigError::LoadFailed(_)));
    }
}
