//! Loaders for each catalog resource.
//!
//! | Loader              | Params           | Cache key                            |
//! |---------------------|------------------|--------------------------------------|
//! | [`CollectionLoader`] | `FilterSpec`     | `application:{"search":"x"}`         |
//! | [`RecordLoader`]     | `Option<String>` | `post:{"id":"p-1"}` (skip when none) |
//! | [`ProfileLoader`]    | `Option<String>` | `profile:{"user_id":"u-1"}`          |
//! | [`FavoritesLoader`]  | `Option<String>` | `favorites:{"user_id":"u-1"}`        |
//! | [`StatsLoader`]      | `()`             | `stats:{}`                           |

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use appshelf_core::{compute_stats, CatalogRecord, FavoriteRelation, FilterSpec, RecordKind, Stats};

use crate::error::{FetchError, FetchResult};
use crate::hook::Loader;
use crate::source::RemoteCatalogSource;

/// Source handle shared by every loader of a catalog.
pub type SharedSource = Arc<dyn RemoteCatalogSource>;

fn user_key(prefix: &str, user_id: &Option<String>) -> String {
    format!("{}:{}", prefix, json!({ "user_id": signed_in(user_id) }))
}

fn signed_in(user_id: &Option<String>) -> Option<&str> {
    user_id.as_deref().filter(|id| !id.is_empty())
}

// =============================================================================
// Collections
// =============================================================================

/// Loads a whole collection of one kind, filtered by the source.
#[derive(Clone)]
pub struct CollectionLoader {
    source: SharedSource,
    kind: RecordKind,
}

impl CollectionLoader {
    pub fn new(source: SharedSource, kind: RecordKind) -> Self {
        CollectionLoader { source, kind }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }
}

#[async_trait]
impl Loader for CollectionLoader {
    type Params = FilterSpec;
    type Output = Arc<Vec<CatalogRecord>>;

    fn name(&self) -> &'static str {
        "collection"
    }

    fn cache_key(&self, filter: &FilterSpec) -> Option<String> {
        Some(format!("{}:{}", self.kind, filter.cache_fragment()))
    }

    async fn load(&self, filter: &FilterSpec) -> FetchResult<Self::Output> {
        let records = self.source.fetch_collection(self.kind, filter).await?;
        debug!(kind = %self.kind, count = records.len(), "Collection loaded");
        Ok(Arc::new(records))
    }
}

// =============================================================================
// Single Records
// =============================================================================

/// Loads one record by id. Absent or empty ids skip the request.
#[derive(Clone)]
pub struct RecordLoader {
    source: SharedSource,
    kind: RecordKind,
}

impl RecordLoader {
    pub fn new(source: SharedSource, kind: RecordKind) -> Self {
        RecordLoader { source, kind }
    }
}

#[async_trait]
impl Loader for RecordLoader {
    type Params = Option<String>;
    type Output = Arc<CatalogRecord>;

    fn name(&self) -> &'static str {
        "record"
    }

    fn cache_key(&self, id: &Option<String>) -> Option<String> {
        let id = signed_in(id)?;
        Some(format!("{}:{}", self.kind, json!({ "id": id })))
    }

    async fn load(&self, id: &Option<String>) -> FetchResult<Self::Output> {
        let Some(id) = signed_in(id) else {
            return Err(FetchError::not_found(self.kind, ""));
        };

        match self.source.fetch_one(self.kind, id).await? {
            Some(record) => Ok(Arc::new(record)),
            None => Err(FetchError::not_found(self.kind, id)),
        }
    }
}

// =============================================================================
// Per-User Resources
// =============================================================================

/// Loads the signed-in user's profile record.
#[derive(Clone)]
pub struct ProfileLoader {
    source: SharedSource,
}

impl ProfileLoader {
    pub fn new(source: SharedSource) -> Self {
        ProfileLoader { source }
    }
}

#[async_trait]
impl Loader for ProfileLoader {
    type Params = Option<String>;
    type Output = Arc<CatalogRecord>;

    fn name(&self) -> &'static str {
        "profile"
    }

    fn cache_key(&self, user_id: &Option<String>) -> Option<String> {
        Some(user_key(RecordKind::Profile.as_str(), user_id))
    }

    async fn load(&self, user_id: &Option<String>) -> FetchResult<Self::Output> {
        let user_id = signed_in(user_id).ok_or(FetchError::Unauthenticated)?;

        match self.source.fetch_one(RecordKind::Profile, user_id).await? {
            Some(profile) => Ok(Arc::new(profile)),
            None => Err(FetchError::not_found(RecordKind::Profile, user_id)),
        }
    }
}

/// Loads the signed-in user's favorites relation.
#[derive(Clone)]
pub struct FavoritesLoader {
    source: SharedSource,
}

impl FavoritesLoader {
    pub fn new(source: SharedSource) -> Self {
        FavoritesLoader { source }
    }
}

#[async_trait]
impl Loader for FavoritesLoader {
    type Params = Option<String>;
    type Output = Arc<Vec<FavoriteRelation>>;

    fn name(&self) -> &'static str {
        "favorites"
    }

    fn cache_key(&self, user_id: &Option<String>) -> Option<String> {
        Some(user_key("favorites", user_id))
    }

    async fn load(&self, user_id: &Option<String>) -> FetchResult<Self::Output> {
        let user_id = signed_in(user_id).ok_or(FetchError::Unauthenticated)?;
        let favorites = self.source.list_favorites(user_id).await?;
        debug!(user_id, count = favorites.len(), "Favorites loaded");
        Ok(Arc::new(favorites))
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Loads every application and aggregates them.
///
/// Cached under its own key, so it never shares state with an applications
/// hook even when both are mounted.
#[derive(Clone)]
pub struct StatsLoader {
    source: SharedSource,
}

impl StatsLoader {
    pub fn new(source: SharedSource) -> Self {
        StatsLoader { source }
    }
}

#[async_trait]
impl Loader for StatsLoader {
    type Params = ();
    type Output = Stats;

    fn name(&self) -> &'static str {
        "stats"
    }

    fn cache_key(&self, _: &()) -> Option<String> {
        Some("stats:{}".to_string())
    }

    async fn load(&self, _: &()) -> FetchResult<Stats> {
        let applications = self
            .source
            .fetch_collection(RecordKind::Application, &FilterSpec::new())
            .await?;
        Ok(compute_stats(&applications))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use appshelf_core::AppType;

    use crate::cache::TtlCache;
    use crate::hook::{FetchHook, Payload};
    use crate::memory::{InMemorySource, SourceOp};

    fn app(id: &str, app_type: AppType, price: f64, downloads: u64) -> CatalogRecord {
        CatalogRecord {
            app_type: Some(app_type),
            price: Some(price),
            download_count: Some(downloads),
            category: Some("tools".into()),
            ..CatalogRecord::new(id, id)
        }
    }

    fn setup() -> (Arc<InMemorySource>, Arc<TtlCache<Payload>>) {
        let source = Arc::new(InMemorySource::new());
        source.put_records(
            RecordKind::Application,
            vec![
                app("a1", AppType::OpenSource, 0.0, 10),
                app("a2", AppType::Pro, 2.5, 4),
            ],
        );
        source.put_records(RecordKind::Post, vec![CatalogRecord::new("p1", "Hello")]);
        source.put_records(RecordKind::Profile, vec![CatalogRecord::new("u1", "Ada")]);
        (source, Arc::new(TtlCache::new(Duration::from_secs(300))))
    }

    #[test]
    fn test_cache_keys() {
        let (source, _) = setup();
        let collection = CollectionLoader::new(source.clone(), RecordKind::Application);
        assert_eq!(collection.cache_key(&FilterSpec::new()).unwrap(), "application:{}");
        assert_eq!(
            collection.cache_key(&FilterSpec::new().with_search("x")).unwrap(),
            r#"application:{"search":"x"}"#
        );

        let record = RecordLoader::new(source.clone(), RecordKind::Post);
        assert_eq!(record.cache_key(&Some("p1".into())).unwrap(), r#"post:{"id":"p1"}"#);
        assert!(record.cache_key(&None).is_none());
        assert!(record.cache_key(&Some(String::new())).is_none());

        let favorites = FavoritesLoader::new(source);
        assert_eq!(
            favorites.cache_key(&Some("u1".into())).unwrap(),
            r#"favorites:{"user_id":"u1"}"#
        );
    }

    #[tokio::test]
    async fn test_equal_filter_specs_hit_source_once() {
        let (source, cache) = setup();
        let first = FetchHook::new(CollectionLoader::new(source.clone(), RecordKind::Application), cache.clone());
        let second = FetchHook::new(CollectionLoader::new(source.clone(), RecordKind::Application), cache);

        first.request(FilterSpec::new().with_category("tools")).await;
        second.request(FilterSpec::new().with_category("tools")).await;

        assert_eq!(source.calls(SourceOp::FetchCollection), 1);
        assert_eq!(second.snapshot().data.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_record_not_found_vs_network() {
        let (source, cache) = setup();
        let hook = FetchHook::new(RecordLoader::new(source.clone(), RecordKind::Post), cache);

        hook.request(Some("missing".into())).await;
        let state = hook.snapshot();
        assert!(state.is_not_found());
        assert_eq!(state.error, Some(FetchError::not_found("post", "missing")));

        source.fail(SourceOp::FetchOne, "offline");
        hook.request(Some("p1".into())).await;
        let state = hook.snapshot();
        assert!(!state.is_not_found());
        assert_eq!(state.error, Some(FetchError::network("offline")));
    }

    #[tokio::test]
    async fn test_record_without_id_is_skipped() {
        let (source, cache) = setup();
        let hook = FetchHook::new(RecordLoader::new(source.clone(), RecordKind::Post), cache);

        hook.request(None).await;
        assert!(hook.snapshot().is_idle());
        assert_eq!(source.calls(SourceOp::FetchOne), 0);
    }

    #[tokio::test]
    async fn test_profile_requires_identity() {
        let (source, cache) = setup();
        let hook = FetchHook::new(ProfileLoader::new(source.clone()), cache);

        hook.request(None).await;
        assert_eq!(hook.snapshot().error, Some(FetchError::Unauthenticated));
        assert_eq!(source.calls(SourceOp::FetchOne), 0);

        hook.request(Some("u1".into())).await;
        let state = hook.snapshot();
        assert!(state.error.is_none());
        assert_eq!(state.data.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_favorites_require_identity() {
        let (source, cache) = setup();
        let hook = FetchHook::new(FavoritesLoader::new(source.clone()), cache);

        hook.request(Some(String::new())).await;
        assert_eq!(hook.snapshot().error, Some(FetchError::Unauthenticated));
        assert_eq!(source.calls(SourceOp::ListFavorites), 0);
    }

    #[tokio::test]
    async fn test_stats_cached_independently() {
        let (source, cache) = setup();
        let stats = FetchHook::new(StatsLoader::new(source.clone()), cache.clone());
        let apps = FetchHook::new(CollectionLoader::new(source.clone(), RecordKind::Application), cache.clone());

        stats.request(()).await;
        apps.request(FilterSpec::new()).await;

        let computed = stats.snapshot().data.unwrap();
        assert_eq!(computed.total_apps, 2);
        assert_eq!(computed.pro_apps, 1);
        assert_eq!(computed.total_revenue.cents(), 1000);
        assert!(cache.is_fresh("stats:{}"));
        assert!(cache.is_fresh("application:{}"));
        assert_eq!(source.calls(SourceOp::FetchCollection), 2);
    }
}
