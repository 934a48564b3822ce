//! # Favorites Toggle
//!
//! ```text
//! toggle_favorite(user, item)
//!     │  no user? ──► Err(Unauthenticated), no remote call
//!     ▼
//! list_favorites(user)            read current relation
//!     │
//!     ├── contains (user, item) ──► remove_favorite   → favorited = false
//!     └── otherwise             ──► add_favorite      → favorited = true
//!     ▼
//! invalidate + reload favorites hook (full reload, no local patch)
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use appshelf_core::FavoriteRelation;

use crate::cache::SharedCache;
use crate::error::{FetchError, FetchResult};
use crate::hook::{FetchHook, FetchState, Payload};
use crate::loaders::{FavoritesLoader, SharedSource};
use crate::source::AuthIdentity;

/// Outcome of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteToggle {
    pub item_id: String,
    /// Membership after the toggle.
    pub favorited: bool,
}

/// Read-modify-refresh cycle over one user's favorites relation.
pub struct FavoritesEngine {
    source: SharedSource,
    identity: Arc<dyn AuthIdentity>,
    hook: FetchHook<FavoritesLoader>,
}

impl FavoritesEngine {
    pub fn new(source: SharedSource, identity: Arc<dyn AuthIdentity>, cache: SharedCache<Payload>) -> Self {
        let hook = FetchHook::new(FavoritesLoader::new(Arc::clone(&source)), cache);
        FavoritesEngine { source, identity, hook }
    }

    /// Populates the favorites hook for the current identity.
    pub async fn load(&self) {
        self.hook.request(self.identity.current_user_id()).await;
    }

    /// Toggles `item_id` for the current identity.
    pub async fn toggle(&self, item_id: &str) -> FetchResult<FavoriteToggle> {
        let user_id = self.identity.current_user_id();
        self.toggle_favorite(user_id.as_deref(), item_id).await
    }

    /// Toggles `item_id` in `user_id`'s favorites and refreshes the hook.
    pub async fn toggle_favorite(&self, user_id: Option<&str>, item_id: &str) -> FetchResult<FavoriteToggle> {
        let user_id = user_id
            .filter(|id| !id.is_empty())
            .ok_or(FetchError::Unauthenticated)?;

        let relation = FavoriteRelation::new(user_id, item_id);
        let current = self.source.list_favorites(user_id).await?;

        let favorited = if current.contains(&relation) {
            self.source.remove_favorite(&relation).await?;
            false
        } else {
            self.source.add_favorite(&relation).await?;
            true
        };

        info!(user_id, item_id, favorited, "Favorite toggled");
        self.refresh(user_id).await;

        Ok(FavoriteToggle {
            item_id: item_id.to_string(),
            favorited,
        })
    }

    /// Whether the loaded relation contains `item_id`.
    pub fn is_favorite(&self, item_id: &str) -> bool {
        self.hook
            .snapshot()
            .data
            .is_some_and(|favorites| favorites.iter().any(|f| f.app_id == item_id))
    }

    pub fn state(&self) -> FetchState<Arc<Vec<FavoriteRelation>>> {
        self.hook.snapshot()
    }

    pub fn hook(&self) -> &FetchHook<FavoritesLoader> {
        &self.hook
    }

    async fn refresh(&self, user_id: &str) {
        let params = Some(user_id.to_string());
        self.hook.invalidate(&params);

        if self.hook.params().as_ref() == Some(&params) {
            self.hook.refetch().await;
        } else {
            debug!(user_id, "Favorites hook follows toggled user");
            self.hook.request(params).await;
        }
    }
}
