//! # Validation Module
//!
//! Checks applied to data coming from outside the core: record collections
//! loaded from a snapshot and identifiers passed in by callers.
//!
//! ## Usage
//! ```rust
//! use appshelf_core::validation::{validate_collection, validate_record_id};
//! use appshelf_core::{CatalogRecord, RecordKind};
//!
//! validate_record_id("app-1").unwrap();
//! assert!(validate_record_id("  ").is_err());
//!
//! let records = vec![CatalogRecord::new("a", "A"), CatalogRecord::new("a", "B")];
//! assert!(validate_collection(RecordKind::Application, &records).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{CatalogRecord, RecordKind};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest id we accept from callers.
const MAX_ID_LEN: usize = 128;

/// Validates a record id passed to a single-record fetch.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 128 characters
pub fn validate_record_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates the collection invariant: every record has a non-empty id and
/// ids are unique within the kind.
pub fn validate_collection(kind: RecordKind, records: &[CatalogRecord]) -> ValidationResult<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());

    for record in records {
        validate_record_id(&record.id)?;

        if !seen.insert(record.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: format!("{} id", kind),
                value: record.id.clone(),
            });
        }
    }

    Ok(())
}
