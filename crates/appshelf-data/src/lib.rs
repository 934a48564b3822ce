//! # appshelf-data: Data Access Layer for AppShelf
//!
//! Reactive fetch/cache layer over a remote catalog store. Hooks load
//! collections and single records, memoize them in a shared TTL cache, and
//! publish `{data, loading, error}` to subscribers. The pure engines that run
//! over the loaded data live in `appshelf-core`.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Catalog                                    │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────────┐    │
//! │  │ FetchHook<L> │   │ Favorites    │   │ PostDetail               │    │
//! │  │  apps, posts │   │ Engine       │   │  post hook + ViewTracker │    │
//! │  │  profile,... │   │ toggle cycle │   │  (fire-and-forget)       │    │
//! │  └──────┬───────┘   └──────┬───────┘   └────────────┬─────────────┘    │
//! │         │                  │                        │                  │
//! │         ▼                  ▼                        ▼                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        TtlCache<Payload>  (Arc, shared by every hook)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ miss                                  │
//! │                                ▼                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   dyn RemoteCatalogSource          dyn AuthIdentity             │   │
//! │  │   (InMemorySource for tools/tests)                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`cache`] - TTL cache with an LRU bound
//! - [`hook`] - `FetchHook`, `FetchState`, `Loader`
//! - [`loaders`] - Collection, record, profile, favorites and stats loaders
//! - [`favorites`] - Favorites toggle engine
//! - [`views`] - Fire-and-forget view tracking and the post detail hook
//! - [`browser`] - Query state plus derived views over loaded applications
//! - [`catalog`] - Root object handing out hooks
//! - [`source`] - Remote store and identity traits
//! - [`memory`] - Snapshot-backed in-memory source
//! - [`config`] - TOML + env configuration
//! - [`error`] - Fetch and config errors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use appshelf_data::{Catalog, DataConfig, StaticIdentity};
//!
//! let config = DataConfig::load_or_default(None);
//! let catalog = Catalog::from_config(&config, Arc::new(StaticIdentity::signed_in("u-1")))?;
//!
//! let mut browser = catalog.browser();
//! browser.load().await;
//! browser.set_search_term("notes");
//! for app in browser.view() {
//!     println!("{}", app.name);
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod browser;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod hook;
pub mod loaders;
pub mod memory;
pub mod source;
pub mod views;

// =============================================================================
// Re-exports
// =============================================================================

pub use browser::CatalogBrowser;
pub use cache::{CacheEntry, SharedCache, TtlCache};
pub use catalog::Catalog;
pub use config::{CacheSettings, DataConfig, SourceSettings};
pub use error::{ConfigError, ConfigResult, FetchError, FetchResult};
pub use favorites::{FavoriteToggle, FavoritesEngine};
pub use hook::{Cached, FetchHook, FetchState, Loader, Payload};
pub use loaders::{CollectionLoader, FavoritesLoader, ProfileLoader, RecordLoader, SharedSource, StatsLoader};
pub use memory::{CatalogSnapshot, InMemorySource, SourceOp, ViewEvent};
pub use source::{AuthIdentity, RemoteCatalogSource, StaticIdentity, Viewer};
pub use views::{PostDetail, ViewTracker, ViewTrackingFailure};
