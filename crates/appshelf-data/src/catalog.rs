//! # Catalog Root
//!
//! Application-scoped owner of the shared cache, the remote source and the
//! identity. Every hook it hands out shares the same [`SharedCache`], so two
//! pages asking for equal parameters within the TTL cost one remote call.
//!
//! ```rust
//! use std::sync::Arc;
//! use appshelf_data::{Catalog, InMemorySource, StaticIdentity};
//! use appshelf_core::FilterSpec;
//!
//! # async fn demo() {
//! let catalog = Catalog::with_defaults(
//!     Arc::new(InMemorySource::new()),
//!     Arc::new(StaticIdentity::anonymous()),
//! );
//!
//! let apps = catalog.applications();
//! apps.request(FilterSpec::new().with_category("tools")).await;
//! let state = apps.snapshot();
//! # }
//! ```

use std::sync::Arc;

use tracing::info;

use appshelf_core::RecordKind;

use crate::browser::CatalogBrowser;
use crate::cache::{SharedCache, TtlCache};
use crate::config::{CacheSettings, DataConfig};
use crate::error::ConfigResult;
use crate::favorites::FavoritesEngine;
use crate::hook::{FetchHook, Payload};
use crate::loaders::{CollectionLoader, ProfileLoader, RecordLoader, SharedSource, StatsLoader};
use crate::memory::{CatalogSnapshot, InMemorySource};
use crate::source::AuthIdentity;
use crate::views::{PostDetail, ViewTracker};

/// Hands out hooks over one source, one identity and one cache.
#[derive(Clone)]
pub struct Catalog {
    source: SharedSource,
    identity: Arc<dyn AuthIdentity>,
    cache: SharedCache<Payload>,
    views: ViewTracker,
}

impl Catalog {
    pub fn new(source: SharedSource, identity: Arc<dyn AuthIdentity>, settings: &CacheSettings) -> Self {
        Self::with_cache(source, identity, Arc::new(TtlCache::from_settings(settings)))
    }

    pub fn with_defaults(source: SharedSource, identity: Arc<dyn AuthIdentity>) -> Self {
        Self::new(source, identity, &CacheSettings::default())
    }

    /// Uses a caller-provided cache, e.g. one shared with another catalog.
    pub fn with_cache(source: SharedSource, identity: Arc<dyn AuthIdentity>, cache: SharedCache<Payload>) -> Self {
        let views = ViewTracker::new(Arc::clone(&source));
        Catalog {
            source,
            identity,
            cache,
            views,
        }
    }

    /// Builds an in-memory catalog from config. Without a snapshot path the
    /// source starts empty.
    pub fn from_config(config: &DataConfig, identity: Arc<dyn AuthIdentity>) -> ConfigResult<Self> {
        let source = match &config.source.snapshot_path {
            Some(path) => {
                let snapshot = CatalogSnapshot::load(path)?;
                info!(
                    path = %path.display(),
                    applications = snapshot.applications.len(),
                    posts = snapshot.posts.len(),
                    "Snapshot loaded"
                );
                InMemorySource::from_snapshot(snapshot)
            }
            None => InMemorySource::new(),
        };

        Ok(Self::new(Arc::new(source), identity, &config.cache))
    }

    // -------------------------------------------------------------------------
    // Hooks
    // -------------------------------------------------------------------------

    pub fn applications(&self) -> FetchHook<CollectionLoader> {
        self.collection(RecordKind::Application)
    }

    pub fn categories(&self) -> FetchHook<CollectionLoader> {
        self.collection(RecordKind::Category)
    }

    pub fn posts(&self) -> FetchHook<CollectionLoader> {
        self.collection(RecordKind::Post)
    }

    pub fn collection(&self, kind: RecordKind) -> FetchHook<CollectionLoader> {
        FetchHook::new(CollectionLoader::new(self.source(), kind), self.cache())
    }

    pub fn application(&self) -> FetchHook<RecordLoader> {
        FetchHook::new(RecordLoader::new(self.source(), RecordKind::Application), self.cache())
    }

    /// Single post with view tracking.
    pub fn post_detail(&self) -> PostDetail {
        PostDetail::from_source(self.source(), self.cache(), self.views.clone(), Arc::clone(&self.identity))
    }

    /// Request it with [`Self::current_user_id`].
    pub fn profile(&self) -> FetchHook<ProfileLoader> {
        FetchHook::new(ProfileLoader::new(self.source()), self.cache())
    }

    pub fn favorites(&self) -> FavoritesEngine {
        FavoritesEngine::new(self.source(), Arc::clone(&self.identity), self.cache())
    }

    pub fn stats(&self) -> FetchHook<StatsLoader> {
        FetchHook::new(StatsLoader::new(self.source()), self.cache())
    }

    pub fn browser(&self) -> CatalogBrowser {
        CatalogBrowser::new(self.applications())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn current_user_id(&self) -> Option<String> {
        self.identity.current_user_id()
    }

    pub fn view_tracker(&self) -> &ViewTracker {
        &self.views
    }

    pub fn cache(&self) -> SharedCache<Payload> {
        Arc::clone(&self.cache)
    }

    fn source(&self) -> SharedSource {
        Arc::clone(&self.source)
    }
}
