//! # appshelf-core: Pure Catalog Logic for AppShelf
//!
//! This crate holds the catalog domain types and the two pure engines that
//! run over a loaded collection: the query engine (search / filter / sort)
//! and the aggregation engine (statistics). It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        AppShelf Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI (out of scope)                            │   │
//! │  │    Browse page ──► Detail page ──► Favorites ──► Dashboard      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ subscribe / read                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             appshelf-data (fetch hooks + TTL cache)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ appshelf-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   query   │  │   stats   │  │ validation│  │   │
//! │  │   │  Record   │  │ derive_   │  │ compute_  │  │   ids     │  │   │
//! │  │   │  Filter   │  │   view    │  │   stats   │  │ uniqueness│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCKS • NO NETWORK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogRecord, FilterSpec, QueryState, ...)
//! - [`query`] - Search, filter and sort
//! - [`stats`] - Collection statistics
//! - [`money`] - Integer-cent money for the revenue estimate
//! - [`error`] - Domain error types
//! - [`validation`] - Record and id validation
//!
//! ## Example Usage
//!
//! ```rust
//! use appshelf_core::{compute_stats, derive_view, CatalogRecord, QueryState, SortKey};
//!
//! let records = vec![
//!     CatalogRecord { download_count: Some(5), ..CatalogRecord::new("1", "Notes") },
//!     CatalogRecord { download_count: Some(9), ..CatalogRecord::new("2", "Ledger") },
//! ];
//!
//! let state = QueryState::default().with_sort(SortKey::Downloads);
//! let view = derive_view(&records, &state);
//! assert_eq!(view[0].id, "2");
//!
//! assert_eq!(compute_stats(&records).total_downloads, 14);
//! ```

pub mod error;
pub mod money;
pub mod query;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use query::{derive_view, matches_filter, matches_query, sort_records};
pub use stats::{compute_stats, Stats};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sentinel meaning "do not filter" for category and app type selectors.
pub const ALL_FILTER: &str = "all";
