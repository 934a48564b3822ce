//! # Fetch Hook Engine
//!
//! A [`FetchHook`] is the reactive unit behind one resource kind. It owns a
//! [`FetchState`] published through a `tokio::sync::watch` channel and
//! re-runs its [`Loader`] when the requested parameters change by value.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  request(params)                                                        │
//! │     │  unmounted, or params == latest? ──► return                      │
//! │     ▼                                                                   │
//! │  latest = params, generation += 1                                       │
//! │     │  loader.cache_key(params) == None? ──► loading = false, return  │
//! │     ▼                                                                   │
//! │  loading = true, error = None                                           │
//! │     │  cache fresh? ──► data = cached, loading = false                  │
//! │     ▼                                                                   │
//! │  loader.load(params).await          ◄── only suspension point          │
//! │     │  generation moved on, or unmounted? ──► discard                  │
//! │     ▼                                                                   │
//! │  Ok  ──► cache.set, data = payload, loading = false                     │
//! │  Err ──► error = err, data untouched, loading = false                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no timeout and no automatic retry. A hung call leaves
//! `loading = true` until the caller issues another request.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use appshelf_core::{CatalogRecord, FavoriteRelation, Stats};

use crate::cache::SharedCache;
use crate::error::{FetchError, FetchResult};

// =============================================================================
// Cached Payloads
// =============================================================================

/// Everything a hook may put in the shared cache.
///
/// Collections are behind `Arc` so a cache hit is a pointer copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Records(Arc<Vec<CatalogRecord>>),
    Record(Arc<CatalogRecord>),
    Favorites(Arc<Vec<FavoriteRelation>>),
    Stats(Stats),
}

/// Conversion between a loader's output and the cache payload.
pub trait Cached: Sized {
    fn into_payload(self) -> Payload;

    /// `None` when the payload holds a different shape.
    fn from_payload(payload: Payload) -> Option<Self>;
}

impl Cached for Arc<Vec<CatalogRecord>> {
    fn into_payload(self) -> Payload {
        Payload::Records(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Records(records) => Some(records),
            _ => None,
        }
    }
}

impl Cached for Arc<CatalogRecord> {
    fn into_payload(self) -> Payload {
        Payload::Record(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl Cached for Arc<Vec<FavoriteRelation>> {
    fn into_payload(self) -> Payload {
        Payload::Favorites(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Favorites(favorites) => Some(favorites),
            _ => None,
        }
    }
}

impl Cached for Stats {
    fn into_payload(self) -> Payload {
        Payload::Stats(self)
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Stats(stats) => Some(stats),
            _ => None,
        }
    }
}

// =============================================================================
// Loader
// =============================================================================

/// What a hook fetches and how it is keyed.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    /// Parameters compared by value to decide whether to re-fetch.
    type Params: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    type Output: Cached + Clone + Send + Sync + 'static;

    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    /// `kind:serialized params`, or `None` to skip the request entirely.
    fn cache_key(&self, params: &Self::Params) -> Option<String>;

    async fn load(&self, params: &Self::Params) -> FetchResult<Self::Output>;
}

// =============================================================================
// Fetch State
// =============================================================================

/// What a consumer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<FetchError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    /// True before the first request and after a skipped one.
    pub fn is_idle(&self) -> bool {
        self.data.is_none() && !self.loading && self.error.is_none()
    }

    pub fn is_not_found(&self) -> bool {
        self.error.as_ref().is_some_and(FetchError::is_not_found)
    }
}

// =============================================================================
// Fetch Hook
// =============================================================================

#[derive(Debug)]
struct Control<P> {
    latest: Option<P>,
    generation: u64,
    mounted: bool,
}

struct HookInner<L: Loader> {
    loader: L,
    cache: SharedCache<Payload>,
    state: watch::Sender<FetchState<L::Output>>,
    control: Mutex<Control<L::Params>>,
}

/// One reactive fetch unit. Cloning yields another handle to the same hook.
pub struct FetchHook<L: Loader> {
    inner: Arc<HookInner<L>>,
}

impl<L: Loader> Clone for FetchHook<L> {
    fn clone(&self) -> Self {
        FetchHook {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Loader> fmt::Debug for FetchHook<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.inner.control();
        f.debug_struct("FetchHook")
            .field("loader", &self.inner.loader.name())
            .field("latest", &control.latest)
            .field("generation", &control.generation)
            .field("mounted", &control.mounted)
            .finish()
    }
}

impl<L: Loader> FetchHook<L> {
    pub fn new(loader: L, cache: SharedCache<Payload>) -> Self {
        let (state, _) = watch::channel(FetchState::default());

        FetchHook {
            inner: Arc::new(HookInner {
                loader,
                cache,
                state,
                control: Mutex::new(Control {
                    latest: None,
                    generation: 0,
                    mounted: true,
                }),
            }),
        }
    }

    /// Runs the request flow for `params`.
    ///
    /// Returns once the request has resolved, been served from cache, been
    /// skipped, or been discarded as stale.
    pub async fn request(&self, params: L::Params) {
        let generation = {
            let mut control = self.inner.control();
            if !control.mounted {
                trace!(hook = self.inner.loader.name(), "Request on unmounted hook ignored");
                return;
            }
            if control.latest.as_ref() == Some(&params) {
                trace!(hook = self.inner.loader.name(), ?params, "Params unchanged");
                return;
            }
            control.latest = Some(params.clone());
            control.generation += 1;
            control.generation
        };

        self.run(generation, params).await;
    }

    /// Runs [`Self::request`] as a detached task.
    pub fn spawn_request(&self, params: L::Params) -> JoinHandle<()> {
        let hook = self.clone();
        tokio::spawn(async move { hook.request(params).await })
    }

    /// Re-runs the latest params through the same path. Manual retry.
    ///
    /// A fresh cache entry still short-circuits; use [`Self::reload`] to force
    /// a remote call.
    pub async fn refetch(&self) {
        let next = {
            let mut control = self.inner.control();
            match control.latest.clone() {
                Some(params) if control.mounted => {
                    control.generation += 1;
                    Some((control.generation, params))
                }
                _ => None,
            }
        };

        if let Some((generation, params)) = next {
            self.run(generation, params).await;
        }
    }

    /// Drops the cached entry for the latest params, then refetches.
    pub async fn reload(&self) {
        if let Some(params) = self.params() {
            self.invalidate(&params);
        }
        self.refetch().await;
    }

    /// Drops the cached entry `params` map to. Returns whether one existed.
    pub fn invalidate(&self, params: &L::Params) -> bool {
        self.inner
            .loader
            .cache_key(params)
            .is_some_and(|key| self.inner.cache.invalidate(&key))
    }

    /// Current state.
    pub fn snapshot(&self) -> FetchState<L::Output> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<L::Output>> {
        self.inner.state.subscribe()
    }

    /// Latest requested params.
    pub fn params(&self) -> Option<L::Params> {
        self.inner.control().latest.clone()
    }

    pub fn loader(&self) -> &L {
        &self.inner.loader
    }

    /// Tears the hook down. In-flight resolutions are discarded and later
    /// requests are ignored.
    pub fn unmount(&self) {
        let mut control = self.inner.control();
        control.mounted = false;
        control.generation += 1;
        debug!(hook = self.inner.loader.name(), "Hook unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.control().mounted
    }

    async fn run(&self, generation: u64, params: L::Params) {
        let inner = &self.inner;
        let hook = inner.loader.name();

        let Some(key) = inner.loader.cache_key(&params) else {
            debug!(hook, generation, "No cache key, request skipped");
            // a superseded request may still be marked in flight
            inner.state.send_if_modified(|state| std::mem::replace(&mut state.loading, false));
            return;
        };

        inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        if let Some(cached) = inner.cache.get_fresh(&key).and_then(L::Output::from_payload) {
            debug!(hook, key = %key, generation, "Serving from cache");
            inner.state.send_modify(|state| {
                state.data = Some(cached);
                state.loading = false;
            });
            return;
        }

        debug!(hook, key = %key, generation, "Fetching");
        let result = inner.loader.load(&params).await;

        let control = inner.control();
        if !control.mounted || control.generation != generation {
            debug!(
                hook,
                key = %key,
                generation,
                current = control.generation,
                "Discarding stale resolution"
            );
            return;
        }

        match result {
            Ok(output) => {
                inner.cache.set(key.clone(), output.clone().into_payload());
                inner.state.send_modify(|state| {
                    state.data = Some(output);
                    state.loading = false;
                });
                debug!(hook, key = %key, generation, "Fetch resolved");
            }
            Err(err) => {
                warn!(hook, key = %key, generation, error = %err, "Fetch failed");
                inner.state.send_modify(|state| {
                    state.error = Some(err);
                    state.loading = false;
                });
            }
        }
    }
}

impl<L: Loader> HookInner<L> {
    fn control(&self) -> MutexGuard<'_, Control<L::Params>> {
        self.control.lock().expect("Hook control mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::oneshot;

    use crate::cache::TtlCache;

    type Records = Arc<Vec<CatalogRecord>>;

    /// Loader whose calls block until the test releases them.
    #[derive(Clone, Default)]
    struct GatedLoader {
        gates: Arc<Mutex<HashMap<String, oneshot::Receiver<FetchResult<Records>>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl GatedLoader {
        fn gate(&self, params: &str) -> oneshot::Sender<FetchResult<Records>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(params.to_string(), rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Loader for GatedLoader {
        type Params = String;
        type Output = Records;

        fn name(&self) -> &'static str {
            "gated"
        }

        fn cache_key(&self, params: &String) -> Option<String> {
            if params.is_empty() {
                None
            } else {
                Some(format!("test:{params}"))
            }
        }

        async fn load(&self, params: &String) -> FetchResult<Records> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().unwrap().remove(params);
            match gate {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(FetchError::network("gate dropped"))),
                None => Ok(records(params)),
            }
        }
    }

    fn records(name: &str) -> Records {
        Arc::new(vec![CatalogRecord::new(name, name)])
    }

    fn cache(ttl_secs: u64) -> SharedCache<Payload> {
        Arc::new(TtlCache::new(Duration::from_secs(ttl_secs)))
    }

    async fn wait_for_calls(loader: &GatedLoader, n: usize) {
        while loader.calls() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let hook = FetchHook::new(GatedLoader::default(), cache(60));
        assert!(hook.snapshot().is_idle());
        assert!(hook.params().is_none());
    }

    #[tokio::test]
    async fn test_success_populates_state_and_cache() {
        let loader = GatedLoader::default();
        let shared = cache(60);
        let hook = FetchHook::new(loader.clone(), shared.clone());

        hook.request("a".into()).await;

        let state = hook.snapshot();
        assert_eq!(state.data, Some(records("a")));
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(shared.is_fresh("test:a"));
    }

    #[tokio::test]
    async fn test_equal_params_do_not_refetch() {
        let loader = GatedLoader::default();
        let hook = FetchHook::new(loader.clone(), cache(60));

        hook.request("a".into()).await;
        hook.request("a".into()).await;
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_cache_shared_between_hooks() {
        let loader = GatedLoader::default();
        let shared = cache(60);
        let first = FetchHook::new(loader.clone(), shared.clone());
        let second = FetchHook::new(loader.clone(), shared);

        first.request("a".into()).await;
        second.request("a".into()).await;

        assert_eq!(loader.calls(), 1);
        assert_eq!(second.snapshot().data, Some(records("a")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_cache_refetches() {
        let loader = GatedLoader::default();
        let shared = cache(300);
        let hook = FetchHook::new(loader.clone(), shared);

        hook.request("a".into()).await;
        tokio::time::advance(Duration::from_secs(300)).await;
        hook.refetch().await;

        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_key_skips_without_state_change() {
        let loader = GatedLoader::default();
        let hook = FetchHook::new(loader.clone(), cache(60));

        hook.request(String::new()).await;

        assert_eq!(loader.calls(), 0);
        assert!(hook.snapshot().is_idle());
    }

    #[tokio::test]
    async fn test_last_request_wins_when_first_resolves_late() {
        let loader = GatedLoader::default();
        let shared = cache(60);
        let hook = FetchHook::new(loader.clone(), shared.clone());
        let release_a = loader.gate("a");
        let release_b = loader.gate("b");

        let first = hook.spawn_request("a".into());
        wait_for_calls(&loader, 1).await;
        let second = hook.spawn_request("b".into());
        wait_for_calls(&loader, 2).await;

        release_b.send(Ok(records("b"))).unwrap();
        second.await.unwrap();
        assert_eq!(hook.snapshot().data, Some(records("b")));

        release_a.send(Ok(records("a"))).unwrap();
        first.await.unwrap();

        let state = hook.snapshot();
        assert_eq!(state.data, Some(records("b")));
        assert!(!state.loading);
        assert!(shared.get("test:a").is_none());
    }

    #[tokio::test]
    async fn test_stale_resolution_leaves_loading_for_current() {
        let loader = GatedLoader::default();
        let hook = FetchHook::new(loader.clone(), cache(60));
        let release_a = loader.gate("a");
        let release_b = loader.gate("b");

        let first = hook.spawn_request("a".into());
        wait_for_calls(&loader, 1).await;
        let second = hook.spawn_request("b".into());
        wait_for_calls(&loader, 2).await;

        release_a.send(Err(FetchError::network("late failure"))).unwrap();
        first.await.unwrap();

        let state = hook.snapshot();
        assert!(state.loading);
        assert!(state.error.is_none());

        release_b.send(Ok(records("b"))).unwrap();
        second.await.unwrap();
        assert_eq!(hook.snapshot().data, Some(records("b")));
    }

    #[tokio::test]
    async fn test_clearing_params_mid_flight_stops_loading() {
        let loader = GatedLoader::default();
        let shared = cache(60);
        let hook = FetchHook::new(loader.clone(), shared.clone());
        let release = loader.gate("a");

        let pending = hook.spawn_request("a".into());
        wait_for_calls(&loader, 1).await;
        assert!(hook.snapshot().loading);

        hook.request(String::new()).await;
        assert!(!hook.snapshot().loading);

        release.send(Ok(records("a"))).unwrap();
        pending.await.unwrap();

        let state = hook.snapshot();
        assert!(!state.loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
        assert!(shared.is_empty());
    }

    #[tokio::test]
    async fn test_unmount_discards_in_flight_result() {
        let loader = GatedLoader::default();
        let shared = cache(60);
        let hook = FetchHook::new(loader.clone(), shared.clone());
        let release = loader.gate("a");

        let pending = hook.spawn_request("a".into());
        wait_for_calls(&loader, 1).await;
        hook.unmount();

        release.send(Ok(records("a"))).unwrap();
        pending.await.unwrap();

        assert!(hook.snapshot().data.is_none());
        assert!(shared.is_empty());

        hook.request("b".into()).await;
        assert_eq!(loader.calls(), 1);
        assert!(!hook.is_mounted());
    }

    #[tokio::test]
    async fn test_error_keeps_previous_data() {
        let loader = GatedLoader::default();
        let hook = FetchHook::new(loader.clone(), cache(60));

        hook.request("a".into()).await;

        let release = loader.gate("b");
        release.send(Err(FetchError::network("timeout"))).unwrap();
        hook.request("b".into()).await;

        let state = hook.snapshot();
        assert_eq!(state.data, Some(records("a")));
        assert_eq!(state.error, Some(FetchError::network("timeout")));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached_and_retry_recovers() {
        let loader = GatedLoader::default();
        let shared = cache(60);
        let hook = FetchHook::new(loader.clone(), shared.clone());

        let release = loader.gate("a");
        release.send(Err(FetchError::network("down"))).unwrap();
        hook.request("a".into()).await;
        assert!(shared.is_empty());

        hook.refetch().await;
        let state = hook.snapshot();
        assert_eq!(loader.calls(), 2);
        assert!(state.error.is_none());
        assert_eq!(state.data, Some(records("a")));
    }

    #[tokio::test]
    async fn test_reload_bypasses_fresh_entry() {
        let loader = GatedLoader::default();
        let hook = FetchHook::new(loader.clone(), cache(60));

        hook.request("a".into()).await;
        hook.refetch().await;
        assert_eq!(loader.calls(), 1);

        hook.reload().await;
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_final_state() {
        let loader = GatedLoader::default();
        let hook = FetchHook::new(loader.clone(), cache(60));
        let mut rx = hook.subscribe();

        hook.request("a".into()).await;

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.data, Some(records("a")));
    }
}
