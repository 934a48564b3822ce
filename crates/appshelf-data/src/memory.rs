//! # In-Memory Catalog Source
//!
//! A [`RemoteCatalogSource`] backed by a JSON snapshot held in memory.
//!
//! ## Snapshot Format
//! ```json
//! {
//!   "applications": [{ "id": "app-1", "name": "Notes", "app_type": "pro", "price": 4.99 }],
//!   "posts":        [{ "id": "post-1", "name": "Release notes", "body": "..." }],
//!   "categories":   [{ "id": "cat-1", "name": "productivity" }],
//!   "profiles":     [{ "id": "user-1", "name": "Ada" }],
//!   "favorites":    [{ "user_id": "user-1", "app_id": "app-1" }]
//! }
//! ```
//!
//! Besides serving data it counts calls per operation and can be told to
//! fail an operation, which is what the hook tests assert against.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use appshelf_core::validation::validate_collection;
use appshelf_core::{matches_filter, CatalogRecord, FavoriteRelation, FilterSpec, RecordKind};

use crate::error::{ConfigError, ConfigResult, FetchError, FetchResult};
use crate::source::{RemoteCatalogSource, Viewer};

// =============================================================================
// Snapshot
// =============================================================================

/// Everything the in-memory source serves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub applications: Vec<CatalogRecord>,
    #[serde(default)]
    pub posts: Vec<CatalogRecord>,
    #[serde(default)]
    pub categories: Vec<CatalogRecord>,
    #[serde(default)]
    pub profiles: Vec<CatalogRecord>,
    #[serde(default)]
    pub favorites: Vec<FavoriteRelation>,
}

impl CatalogSnapshot {
    /// Parses and validates a snapshot document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json).map_err(|e| ConfigError::Snapshot {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        snapshot.validate().map_err(|reason| ConfigError::Snapshot {
            path: "<inline>".to_string(),
            reason,
        })?;
        Ok(snapshot)
    }

    /// Reads, parses and validates a snapshot file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Snapshot {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&contents).map_err(|err| match err {
            ConfigError::Snapshot { reason, .. } => ConfigError::Snapshot {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Ids must be present and unique per kind.
    fn validate(&self) -> Result<(), String> {
        for (kind, records) in self.collections() {
            validate_collection(kind, records).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn collections(&self) -> [(RecordKind, &Vec<CatalogRecord>); 4] {
        [
            (RecordKind::Application, &self.applications),
            (RecordKind::Post, &self.posts),
            (RecordKind::Category, &self.categories),
            (RecordKind::Profile, &self.profiles),
        ]
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Source operations, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceOp {
    FetchCollection,
    FetchOne,
    ListFavorites,
    AddFavorite,
    RemoveFavorite,
    RecordView,
}

/// A view recorded by [`RemoteCatalogSource::record_view`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewEvent {
    pub id: Uuid,
    pub post_id: String,
    pub viewer: Viewer,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<RecordKind, Vec<CatalogRecord>>,
    favorites: Vec<FavoriteRelation>,
    views: Vec<ViewEvent>,
    calls: HashMap<SourceOp, usize>,
    failing: HashMap<SourceOp, String>,
}

// =============================================================================
// In-Memory Source
// =============================================================================

/// Snapshot-backed source.
#[derive(Debug, Default)]
pub struct InMemorySource {
    state: Mutex<StoreState>,
}

impl InMemorySource {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut collections = HashMap::new();
        collections.insert(RecordKind::Application, snapshot.applications);
        collections.insert(RecordKind::Post, snapshot.posts);
        collections.insert(RecordKind::Category, snapshot.categories);
        collections.insert(RecordKind::Profile, snapshot.profiles);

        InMemorySource {
            state: Mutex::new(StoreState {
                collections,
                favorites: snapshot.favorites,
                ..StoreState::default()
            }),
        }
    }

    /// Replaces the records of one kind.
    pub fn put_records(&self, kind: RecordKind, records: Vec<CatalogRecord>) {
        self.lock().collections.insert(kind, records);
    }

    /// Makes every call of `op` fail with a network error until [`Self::recover`].
    pub fn fail(&self, op: SourceOp, message: impl Into<String>) {
        self.lock().failing.insert(op, message.into());
    }

    pub fn recover(&self, op: SourceOp) {
        self.lock().failing.remove(&op);
    }

    /// Number of calls made for `op`, including failed ones.
    pub fn calls(&self, op: SourceOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn views(&self) -> Vec<ViewEvent> {
        self.lock().views.clone()
    }

    pub fn favorites(&self) -> Vec<FavoriteRelation> {
        self.lock().favorites.clone()
    }

    /// Counts the call, then fails it if `op` was marked failing.
    fn enter(&self, op: SourceOp) -> FetchResult<MutexGuard<'_, StoreState>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;

        if let Some(message) = state.failing.get(&op) {
            return Err(FetchError::Network(message.clone()));
        }
        Ok(state)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("In-memory source mutex poisoned")
    }
}

#[async_trait]
impl RemoteCatalogSource for InMemorySource {
    async fn fetch_collection(&self, kind: RecordKind, filter: &FilterSpec) -> FetchResult<Vec<CatalogRecord>> {
        let state = self.enter(SourceOp::FetchCollection)?;
        let records: Vec<CatalogRecord> = state
            .collections
            .get(&kind)
            .map(|all| all.iter().filter(|r| matches_filter(r, filter)).cloned().collect())
            .unwrap_or_default();

        debug!(%kind, count = records.len(), "In-memory collection fetch");
        Ok(records)
    }

    async fn fetch_one(&self, kind: RecordKind, id: &str) -> FetchResult<Option<CatalogRecord>> {
        let state = self.enter(SourceOp::FetchOne)?;
        Ok(state
            .collections
            .get(&kind)
            .and_then(|all| all.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn list_favorites(&self, user_id: &str) -> FetchResult<Vec<FavoriteRelation>> {
        let state = self.enter(SourceOp::ListFavorites)?;
        Ok(state
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_favorite(&self, relation: &FavoriteRelation) -> FetchResult<()> {
        let mut state = self.enter(SourceOp::AddFavorite)?;
        if !state.favorites.contains(relation) {
            state.favorites.push(relation.clone());
        }
        Ok(())
    }

    async fn remove_favorite(&self, relation: &FavoriteRelation) -> FetchResult<()> {
        let mut state = self.enter(SourceOp::RemoveFavorite)?;
        state.favorites.retain(|f| f != relation);
        Ok(())
    }

    async fn record_view(&self, post_id: &str, viewer: &Viewer) -> FetchResult<()> {
        let mut state = self.enter(SourceOp::RecordView)?;
        state.views.push(ViewEvent {
            id: Uuid::new_v4(),
            post_id: post_id.to_string(),
            viewer: viewer.clone(),
            viewed_at: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "applications": [
            { "id": "a1", "name": "Notes", "app_type": "open_source", "category": "productivity" },
            { "id": "a2", "name": "Ledger", "app_type": "pro", "price": 9.0, "category": "finance" }
        ],
        "favorites": [{ "user_id": "u1", "app_id": "a2" }]
    }"#;

    #[test]
    fn test_snapshot_parses_with_missing_sections() {
        let snapshot = CatalogSnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.applications.len(), 2);
        assert!(snapshot.posts.is_empty());
        assert_eq!(snapshot.favorites.len(), 1);
    }

    #[test]
    fn test_snapshot_rejects_duplicate_ids() {
        let json = r#"{ "posts": [{ "id": "p" }, { "id": "p" }] }"#;
        let err = CatalogSnapshot::from_json(json).unwrap_err();
        assert!(err.to_string().contains("post id 'p' already exists"));
    }

    #[test]
    fn test_snapshot_load_reports_path() {
        let err = CatalogSnapshot::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[tokio::test]
    async fn test_fetch_collection_applies_filter() {
        let source = InMemorySource::from_snapshot(CatalogSnapshot::from_json(SNAPSHOT).unwrap());

        let all = source
            .fetch_collection(RecordKind::Application, &FilterSpec::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let pro = source
            .fetch_collection(RecordKind::Application, &FilterSpec::new().with_app_type("pro"))
            .await
            .unwrap();
        assert_eq!(pro.len(), 1);
        assert_eq!(pro[0].id, "a2");

        assert_eq!(source.calls(SourceOp::FetchCollection), 2);
    }

    #[tokio::test]
    async fn test_fetch_one_and_missing() {
        let source = InMemorySource::from_snapshot(CatalogSnapshot::from_json(SNAPSHOT).unwrap());
        assert!(source.fetch_one(RecordKind::Application, "a1").await.unwrap().is_some());
        assert!(source.fetch_one(RecordKind::Application, "zz").await.unwrap().is_none());
        assert!(source.fetch_one(RecordKind::Post, "a1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_injection_counts_calls() {
        let source = InMemorySource::new();
        source.fail(SourceOp::FetchOne, "backend down");

        let err = source.fetch_one(RecordKind::Post, "p").await.unwrap_err();
        assert_eq!(err, FetchError::Network("backend down".into()));
        assert_eq!(source.calls(SourceOp::FetchOne), 1);

        source.recover(SourceOp::FetchOne);
        assert!(source.fetch_one(RecordKind::Post, "p").await.is_ok());
    }

    #[tokio::test]
    async fn test_favorites_relation() {
        let source = InMemorySource::from_snapshot(CatalogSnapshot::from_json(SNAPSHOT).unwrap());
        let relation = FavoriteRelation::new("u1", "a1");

        source.add_favorite(&relation).await.unwrap();
        source.add_favorite(&relation).await.unwrap();
        assert_eq!(source.list_favorites("u1").await.unwrap().len(), 2);

        source.remove_favorite(&relation).await.unwrap();
        let left = source.list_favorites("u1").await.unwrap();
        assert_eq!(left, vec![FavoriteRelation::new("u1", "a2")]);
        assert!(source.list_favorites("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_view() {
        let source = InMemorySource::new();
        source.record_view("p1", &Viewer::Anonymous).await.unwrap();
        source.record_view("p1", &Viewer::User("u1".into())).await.unwrap();

        let views = source.views();
        assert_eq!(views.len(), 2);
        assert_ne!(views[0].id, views[1].id);
        assert_eq!(views[1].viewer, Viewer::User("u1".into()));
    }
}
