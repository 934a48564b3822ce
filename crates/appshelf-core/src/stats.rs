//! # Aggregation Engine
//!
//! Summary statistics over a full application collection.
//!
//! Statistics are always computed over everything that was loaded, never over
//! the filtered view, so the dashboard numbers do not jump while a user types
//! into the search box.
//!
//! ## Revenue Is an Estimate
//! ```text
//! total_revenue = Σ price × download_count   (pro apps only)
//! ```
//! This is a proxy metric (every download is assumed to be a sale), not a
//! ledger. It is accumulated in integer cents so it does not depend on the
//! order of the records.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{AppType, CatalogRecord};

/// Dashboard numbers for an application collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Stats {
    pub total_apps: u64,
    pub total_downloads: u64,
    /// Distinct non-empty `category` values.
    pub total_categories: u64,
    pub open_source_apps: u64,
    pub pro_apps: u64,
    /// Estimated, see module docs.
    pub total_revenue: Money,
}

/// Computes [`Stats`] for `records`.
///
/// An empty slice yields all zeros. No averages are computed, so there is no
/// division anywhere.
///
/// ## Example
/// ```rust
/// use appshelf_core::{compute_stats, AppType, CatalogRecord};
///
/// let pro = CatalogRecord {
///     app_type: Some(AppType::Pro),
///     price: Some(2.5),
///     download_count: Some(4),
///     ..CatalogRecord::new("a", "A")
/// };
/// let stats = compute_stats(&[pro]);
/// assert_eq!(stats.pro_apps, 1);
/// assert_eq!(stats.total_revenue.cents(), 1000);
/// ```
pub fn compute_stats(records: &[CatalogRecord]) -> Stats {
    let mut stats = Stats {
        total_apps: records.len() as u64,
        ..Stats::default()
    };
    let mut categories: HashSet<&str> = HashSet::new();

    for record in records {
        stats.total_downloads = stats.total_downloads.saturating_add(record.downloads());

        if let Some(category) = record.category.as_deref().filter(|c| !c.is_empty()) {
            categories.insert(category);
        }

        match record.app_type {
            Some(AppType::OpenSource) => stats.open_source_apps += 1,
            Some(AppType::Pro) => {
                stats.pro_apps += 1;
                stats.total_revenue +=
                    Money::from_decimal(record.price_or_zero()).multiply_quantity(record.downloads());
            }
            None => {}
        }
    }

    stats.total_categories = categories.len() as u64;
    stats
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, app_type: Option<AppType>, price: Option<f64>, downloads: Option<u64>, category: &str) -> CatalogRecord {
        CatalogRecord {
            app_type,
            price,
            download_count: downloads,
            category: Some(category.to_string()),
            ..CatalogRecord::new(id, id)
        }
    }

    fn sample() -> Vec<CatalogRecord> {
        vec![
            record("a", Some(AppType::OpenSource), None, Some(100), "tools"),
            record("b", Some(AppType::Pro), Some(0.1), Some(3), "tools"),
            record("c", Some(AppType::Pro), Some(0.2), Some(7), "games"),
            record("d", Some(AppType::Pro), Some(19.99), None, ""),
            record("e", None, Some(5.0), Some(11), "media"),
        ]
    }

    #[test]
    fn test_empty_collection_is_all_zero() {
        let stats = compute_stats(&[]);
        assert_eq!(stats, Stats::default());
        assert!(stats.total_revenue.is_zero());
    }

    #[test]
    fn test_counts_and_sums() {
        let stats = compute_stats(&sample());
        assert_eq!(stats.total_apps, 5);
        assert_eq!(stats.total_downloads, 121);
        assert_eq!(stats.total_categories, 3);
        assert_eq!(stats.open_source_apps, 1);
        assert_eq!(stats.pro_apps, 3);
        // 10c × 3 + 20c × 7 + 1999c × 0; the untyped record is not revenue
        assert_eq!(stats.total_revenue.cents(), 170);
    }

    #[test]
    fn test_stats_invariant_under_record_order() {
        let records = sample();
        let expected = compute_stats(&records);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(compute_stats(&reversed), expected);

        let mut rotated = records.clone();
        rotated.rotate_left(2);
        assert_eq!(compute_stats(&rotated), expected);

        let mut swapped = records;
        swapped.swap(0, 3);
        assert_eq!(compute_stats(&swapped), expected);
    }

    #[test]
    fn test_missing_category_is_not_counted() {
        let mut r = CatalogRecord::new("x", "x");
        r.category = None;
        assert_eq!(compute_stats(&[r]).total_categories, 0);
    }
}
