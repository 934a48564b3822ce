//! # View Tracking
//!
//! "Post viewed" writes are fire-and-forget: [`ViewTracker::track`] spawns a
//! detached task and returns immediately. A failed write is logged and
//! broadcast as a [`ViewTrackingFailure`]; it never reaches the fetch state of
//! the post being shown.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use appshelf_core::{CatalogRecord, RecordKind};

use crate::cache::SharedCache;
use crate::error::FetchError;
use crate::hook::{FetchHook, FetchState, Payload};
use crate::loaders::{RecordLoader, SharedSource};
use crate::source::{AuthIdentity, Viewer};

const FAILURE_CHANNEL_CAPACITY: usize = 64;

/// A view write that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTrackingFailure {
    pub post_id: String,
    pub viewer: Viewer,
    pub error: FetchError,
}

/// Issues detached view writes.
#[derive(Clone)]
pub struct ViewTracker {
    source: SharedSource,
    failures: broadcast::Sender<ViewTrackingFailure>,
}

impl ViewTracker {
    pub fn new(source: SharedSource) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        ViewTracker { source, failures }
    }

    /// Spawns the write for `(post_id, viewer)`.
    pub fn track(&self, post_id: impl Into<String>, viewer: Viewer) -> JoinHandle<()> {
        let post_id = post_id.into();
        let source = Arc::clone(&self.source);
        let failures = self.failures.clone();

        tokio::spawn(async move {
            match source.record_view(&post_id, &viewer).await {
                Ok(()) => debug!(post_id = %post_id, viewer = %viewer, "View tracked"),
                Err(error) => {
                    warn!(post_id = %post_id, viewer = %viewer, error = %error, "View tracking failed");
                    // nobody listening is fine
                    let _ = failures.send(ViewTrackingFailure { post_id, viewer, error });
                }
            }
        })
    }

    /// Receiver for failures of writes issued after this call.
    pub fn subscribe_failures(&self) -> broadcast::Receiver<ViewTrackingFailure> {
        self.failures.subscribe()
    }
}

// =============================================================================
// Post Detail
// =============================================================================

/// Single-post hook that tracks a view whenever a new post is shown.
pub struct PostDetail {
    hook: FetchHook<RecordLoader>,
    tracker: ViewTracker,
    identity: Arc<dyn AuthIdentity>,
    last_tracked: Mutex<Option<String>>,
}

impl PostDetail {
    pub fn new(hook: FetchHook<RecordLoader>, tracker: ViewTracker, identity: Arc<dyn AuthIdentity>) -> Self {
        PostDetail {
            hook,
            tracker,
            identity,
            last_tracked: Mutex::new(None),
        }
    }

    /// Builds the hook from a source directly.
    pub fn from_source(
        source: SharedSource,
        cache: SharedCache<Payload>,
        tracker: ViewTracker,
        identity: Arc<dyn AuthIdentity>,
    ) -> Self {
        let hook = FetchHook::new(RecordLoader::new(source, RecordKind::Post), cache);
        Self::new(hook, tracker, identity)
    }

    /// Shows `post_id`: fetches it, then issues the view write if the post
    /// resolved and its id differs from the last one tracked.
    ///
    /// Returns the handle of the view write, if one was issued.
    pub async fn show(&self, post_id: Option<String>) -> Option<JoinHandle<()>> {
        self.hook.request(post_id.clone()).await;

        let post_id = post_id.filter(|id| !id.is_empty())?;
        let state = self.hook.snapshot();
        let resolved = state.error.is_none() && state.data.as_ref().is_some_and(|post| post.id == post_id);
        if !resolved {
            debug!(post_id = %post_id, "Post not resolved, view not tracked");
            return None;
        }
        self.track_if_new(&post_id)
    }

    pub fn state(&self) -> FetchState<Arc<CatalogRecord>> {
        self.hook.snapshot()
    }

    pub fn hook(&self) -> &FetchHook<RecordLoader> {
        &self.hook
    }

    fn track_if_new(&self, post_id: &str) -> Option<JoinHandle<()>> {
        let mut last = self.last_tracked.lock().expect("Post detail mutex poisoned");
        if last.as_deref() == Some(post_id) {
            return None;
        }
        *last = Some(post_id.to_string());
        drop(last);

        let viewer = Viewer::from_user_id(self.identity.current_user_id());
        Some(self.tracker.track(post_id, viewer))
    }
}
