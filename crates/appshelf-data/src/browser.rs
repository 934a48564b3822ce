//! Catalog browser: the applications hook plus the query state a browse page
//! edits. Filtering happens client-side over the full loaded collection so
//! that stats and the category list stay independent of the active filter.

use std::collections::BTreeSet;
use std::sync::Arc;

use appshelf_core::{compute_stats, derive_view, CatalogRecord, FilterSpec, QueryState, SortKey, Stats};

use crate::hook::{FetchHook, FetchState};
use crate::loaders::CollectionLoader;

pub struct CatalogBrowser {
    hook: FetchHook<CollectionLoader>,
    query: QueryState,
}

impl CatalogBrowser {
    pub fn new(hook: FetchHook<CollectionLoader>) -> Self {
        CatalogBrowser {
            hook,
            query: QueryState::default(),
        }
    }

    /// Loads the full collection.
    pub async fn load(&self) {
        self.hook.request(FilterSpec::new()).await;
    }

    /// Forces a remote reload of the collection.
    pub async fn refresh(&self) {
        self.hook.reload().await;
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.query.search_term = term.into();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.query.selected_category = category.into();
    }

    pub fn set_sort(&mut self, sort_by: SortKey) {
        self.query.sort_by = sort_by;
    }

    pub fn set_app_type_filter(&mut self, app_type: Option<String>) {
        self.query.app_type_filter = app_type;
    }

    pub fn query_state(&self) -> &QueryState {
        &self.query
    }

    pub fn state(&self) -> FetchState<Arc<Vec<CatalogRecord>>> {
        self.hook.snapshot()
    }

    /// Derived view of whatever is loaded. Empty before the first load.
    pub fn view(&self) -> Vec<CatalogRecord> {
        match self.hook.snapshot().data {
            Some(records) => derive_view(&records, &self.query),
            None => Vec::new(),
        }
    }

    /// Statistics over the full loaded collection.
    pub fn stats(&self) -> Stats {
        self.hook
            .snapshot()
            .data
            .map(|records| compute_stats(&records))
            .unwrap_or_default()
    }

    /// Distinct non-empty categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        let Some(records) = self.hook.snapshot().data else {
            return Vec::new();
        };

        records
            .iter()
            .filter_map(|r| r.category.as_deref())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn hook(&self) -> &FetchHook<CollectionLoader> {
        &self.hook
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use appshelf_core::{AppType, RecordKind};

    use crate::cache::TtlCache;
    use crate::memory::{InMemorySource, SourceOp};

    fn app(id: &str, name: &str, category: &str, app_type: AppType, downloads: u64) -> CatalogRecord {
        CatalogRecord {
            category: Some(category.into()),
            app_type: Some(app_type),
            download_count: Some(downloads),
            price: (app_type == AppType::Pro).then_some(1.0),
            ..CatalogRecord::new(id, name)
        }
    }

    fn browser() -> (Arc<InMemorySource>, CatalogBrowser) {
        let source = Arc::new(InMemorySource::new());
        source.put_records(
            RecordKind::Application,
            vec![
                app("1", "Zeta Notes", "productivity", AppType::OpenSource, 5),
                app("2", "alpha ledger", "finance", AppType::Pro, 50),
                app("3", "Beta Notes", "productivity", AppType::Pro, 20),
                app("4", "Gamma", "", AppType::OpenSource, 1),
            ],
        );
        let hook = FetchHook::new(
            CollectionLoader::new(source.clone(), RecordKind::Application),
            Arc::new(TtlCache::new(Duration::from_secs(60))),
        );
        (source, CatalogBrowser::new(hook))
    }

    fn ids(records: &[CatalogRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_view_empty_before_load() {
        let (_, browser) = browser();
        assert!(browser.view().is_empty());
        assert_eq!(browser.stats(), Stats::default());
        assert!(browser.categories().is_empty());
    }

    #[tokio::test]
    async fn test_default_view_sorted_by_name() {
        let (_, browser) = browser();
        browser.load().await;
        assert_eq!(ids(&browser.view()), vec!["2", "3", "4", "1"]);
    }

    #[tokio::test]
    async fn test_query_changes_do_not_refetch() {
        let (source, mut browser) = browser();
        browser.load().await;

        browser.set_search_term("notes");
        browser.set_sort(SortKey::Downloads);
        assert_eq!(ids(&browser.view()), vec!["3", "1"]);

        browser.set_category("productivity");
        browser.set_app_type_filter(Some("pro".into()));
        assert_eq!(ids(&browser.view()), vec!["3"]);

        browser.load().await;
        assert_eq!(source.calls(SourceOp::FetchCollection), 1);
    }

    #[tokio::test]
    async fn test_stats_ignore_active_filter() {
        let (_, mut browser) = browser();
        browser.load().await;
        browser.set_search_term("gamma");

        assert_eq!(browser.view().len(), 1);
        let stats = browser.stats();
        assert_eq!(stats.total_apps, 4);
        assert_eq!(stats.total_downloads, 76);
        assert_eq!(stats.total_categories, 2);
    }

    #[tokio::test]
    async fn test_categories_are_distinct_and_sorted() {
        let (_, browser) = browser();
        browser.load().await;
        assert_eq!(browser.categories(), vec!["finance", "productivity"]);
    }

    #[tokio::test]
    async fn test_refresh_hits_source_again() {
        let (source, browser) = browser();
        browser.load().await;
        browser.refresh().await;
        assert_eq!(source.calls(SourceOp::FetchCollection), 2);
    }
}
