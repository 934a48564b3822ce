//! # Remote Store Boundary
//!
//! The data layer never talks to a backend directly. It consumes two
//! collaborators:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RemoteCatalogSource                  AuthIdentity                     │
//! │  ├── fetch_collection(kind, filter)   └── current_user_id()            │
//! │  ├── fetch_one(kind, id)                                               │
//! │  ├── list_favorites(user)                                              │
//! │  ├── add_favorite / remove_favorite                                    │
//! │  └── record_view(post, viewer)                                         │
//! │                                                                         │
//! │  Calls into the source are the ONLY suspension points of the layer.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport, wire format and auth protocol are the implementor's business.
//! [`crate::memory::InMemorySource`] is the implementation used by tests and
//! the `browse` binary.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use appshelf_core::{CatalogRecord, FavoriteRelation, FilterSpec, RecordKind};

use crate::error::FetchResult;

/// The remote catalog store.
#[async_trait]
pub trait RemoteCatalogSource: Send + Sync {
    /// Loads every record of `kind` matching `filter`.
    async fn fetch_collection(&self, kind: RecordKind, filter: &FilterSpec) -> FetchResult<Vec<CatalogRecord>>;

    /// Loads one record. `Ok(None)` when it does not exist.
    async fn fetch_one(&self, kind: RecordKind, id: &str) -> FetchResult<Option<CatalogRecord>>;

    /// Loads a user's favorites relation.
    async fn list_favorites(&self, user_id: &str) -> FetchResult<Vec<FavoriteRelation>>;

    async fn add_favorite(&self, relation: &FavoriteRelation) -> FetchResult<()>;

    async fn remove_favorite(&self, relation: &FavoriteRelation) -> FetchResult<()>;

    /// Records that a post was viewed.
    async fn record_view(&self, post_id: &str, viewer: &Viewer) -> FetchResult<()>;
}

/// Who is signed in, if anyone.
pub trait AuthIdentity: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Identity fixed at construction. Handy for tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        StaticIdentity {
            user_id: Some(user_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        StaticIdentity { user_id: None }
    }
}

impl AuthIdentity for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone().filter(|id| !id.is_empty())
    }
}

// =============================================================================
// Viewer
// =============================================================================

/// Second half of a view-tracking key: `(post_id, viewer)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "user_id")]
pub enum Viewer {
    User(String),
    Anonymous,
}

impl Viewer {
    /// Builds a viewer from an optional user id; empty ids count as anonymous.
    pub fn from_user_id(user_id: Option<String>) -> Self {
        match user_id {
            Some(id) if !id.is_empty() => Viewer::User(id),
            _ => Viewer::Anonymous,
        }
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Viewer::User(id) => f.write_str(id),
            Viewer::Anonymous => f.write_str("anonymous"),
        }
    }
}
