//! # Query Engine
//!
//! Search, filter and sort over an in-memory record collection.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    derive_view(records, state)                          │
//! │                                                                         │
//! │  records (as loaded, never mutated)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FILTER  search_term  → name | description | any tag (case-insensitive)│
//! │          category     → "all" or exact match                           │
//! │          app_type     → None / "all" or exact match                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SORT    stable, comparator chosen by state.sort_by                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<CatalogRecord> (the derived view)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure: identical inputs give an identically
//! ordered output.

use std::cmp::Ordering;

use crate::types::{AppType, CatalogRecord, FilterSpec, QueryState, SortKey};
use crate::ALL_FILTER;

/// Produces the filtered and sorted view for one query state.
///
/// ## Example
/// ```rust
/// use appshelf_core::{derive_view, CatalogRecord, QueryState};
///
/// let records = vec![
///     CatalogRecord::new("2", "beta"),
///     CatalogRecord::new("1", "Alpha"),
/// ];
/// let view = derive_view(&records, &QueryState::default());
/// assert_eq!(view[0].name, "Alpha");
/// ```
pub fn derive_view(records: &[CatalogRecord], state: &QueryState) -> Vec<CatalogRecord> {
    let needle = state.search_term.to_lowercase();

    let mut view: Vec<CatalogRecord> = records
        .iter()
        .filter(|r| matches_search(r, &needle))
        .filter(|r| matches_category(r, &state.selected_category))
        .filter(|r| matches_app_type(r, state.app_type_filter.as_deref()))
        .cloned()
        .collect();

    sort_records(&mut view, state.sort_by);
    view
}

/// Checks one record against the full query predicate.
pub fn matches_query(record: &CatalogRecord, state: &QueryState) -> bool {
    matches_search(record, &state.search_term.to_lowercase())
        && matches_category(record, &state.selected_category)
        && matches_app_type(record, state.app_type_filter.as_deref())
}

/// Applies a remote-side [`FilterSpec`] with the same rules as the query
/// predicate. Absent keys do not filter.
pub fn matches_filter(record: &CatalogRecord, filter: &FilterSpec) -> bool {
    let search_ok = filter
        .search
        .as_deref()
        .map_or(true, |s| matches_search(record, &s.to_lowercase()));
    let category_ok = filter
        .category
        .as_deref()
        .map_or(true, |c| matches_category(record, c));

    search_ok && category_ok && matches_app_type(record, filter.app_type.as_deref())
}

/// Sorts in place with the comparator for `key`. Stable.
pub fn sort_records(records: &mut [CatalogRecord], key: SortKey) {
    if key == SortKey::Unsorted {
        return;
    }
    records.sort_by(|a, b| compare_records(a, b, key));
}

/// Comparator behind [`sort_records`].
pub fn compare_records(a: &CatalogRecord, b: &CatalogRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => compare_names(a, b),
        SortKey::Downloads => b.downloads().cmp(&a.downloads()),
        SortKey::Updated => compare_updated(a, b),
        SortKey::Price => compare_prices(a, b),
        SortKey::Unsorted => Ordering::Equal,
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// `needle` must already be lowercased.
fn matches_search(record: &CatalogRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    record.name.to_lowercase().contains(needle)
        || record
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
        || record
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle))
}

fn matches_category(record: &CatalogRecord, selected: &str) -> bool {
    selected == ALL_FILTER || record.category.as_deref() == Some(selected)
}

fn matches_app_type(record: &CatalogRecord, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(ALL_FILTER) => true,
        Some(wanted) => record.has_app_type(wanted),
    }
}

// =============================================================================
// Comparators
// =============================================================================

fn compare_names(a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// Most recent first; unparseable or missing timestamps last.
fn compare_updated(a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
    match (a.updated_at_parsed(), b.updated_at_parsed()) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Three-way tie-break, not a numeric key.
///
/// ```text
/// open_source  (mutually unordered, keep input order)
///     <  pro   (ascending price, missing = 0)
///     <  untyped records
/// ```
fn compare_prices(a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
    match (a.app_type, b.app_type) {
        (Some(AppType::Pro), Some(AppType::Pro)) => a.price_or_zero().total_cmp(&b.price_or_zero()),
        (ta, tb) => price_tier(ta).cmp(&price_tier(tb)),
    }
}

fn price_tier(app_type: Option<AppType>) -> u8 {
    match app_type {
        Some(AppType::OpenSource) => 0,
        Some(AppType::Pro) => 1,
        None => 2,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
