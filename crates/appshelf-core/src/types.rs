//! # Domain Types
//!
//! Core domain types used throughout AppShelf.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogRecord  │   │   FilterSpec    │   │   QueryState    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  search?        │   │  search_term    │       │
//! │  │  updated_at     │   │  category?      │   │  category/"all" │       │
//! │  │  name, tags ... │   │  app_type?      │   │  sort_by        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   RecordKind    │   │    AppType      │   │    SortKey      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Application    │   │  OpenSource     │   │  Name           │       │
//! │  │  Post           │   │  Pro            │   │  Downloads      │       │
//! │  │  Category       │   └─────────────────┘   │  Updated, Price │       │
//! │  │  Profile        │                         │  Unsorted       │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Record Shape
//! Records are owned by the remote store. We model the fields the query and
//! aggregation engines read; everything else a kind carries is kept verbatim
//! in [`CatalogRecord::extra`] so nothing is lost on the way to the UI.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::ALL_FILTER;

// =============================================================================
// Record Kind
// =============================================================================

/// The collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A browsable application.
    Application,
    /// A blog post / article.
    Post,
    /// An application category.
    Category,
    /// A user profile.
    Profile,
}

impl RecordKind {
    /// Returns the wire name, also used as the cache key prefix.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Application => "application",
            RecordKind::Post => "post",
            RecordKind::Category => "category",
            RecordKind::Profile => "profile",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "application" | "applications" | "app" | "apps" => Ok(RecordKind::Application),
            "post" | "posts" | "article" | "articles" => Ok(RecordKind::Post),
            "category" | "categories" => Ok(RecordKind::Category),
            "profile" | "profiles" => Ok(RecordKind::Profile),
            other => Err(CoreError::UnknownRecordKind(other.to_string())),
        }
    }
}

// =============================================================================
// App Type
// =============================================================================

/// Licensing tier of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    /// Free, source-available application. Has no meaningful price.
    OpenSource,
    /// Paid application.
    Pro,
}

impl AppType {
    /// Returns the wire name (`open_source` / `pro`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            AppType::OpenSource => "open_source",
            AppType::Pro => "pro",
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Catalog Record
// =============================================================================

/// One item of a browsable collection.
///
/// All kinds share `id` and `updated_at`. The remaining typed fields are the
/// ones search, sort and statistics read; they default to empty/absent so
/// a category or profile record deserializes with the same type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogRecord {
    /// Unique, stable identifier within its kind.
    pub id: String,

    /// ISO-8601 text as stored remotely. Parsed on demand; may be invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub updated_at: Option<String>,

    /// Display name.
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Missing counts are treated as 0 everywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub download_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub app_type: Option<AppType>,

    /// Decimal price. Only meaningful for `pro` applications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub price: Option<f64>,

    /// Kind-specific fields we do not interpret (post body, avatar url, ...).
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CatalogRecord {
    /// Creates a record with only an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        CatalogRecord {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Download count with absent treated as zero.
    #[inline]
    pub fn downloads(&self) -> u64 {
        self.download_count.unwrap_or(0)
    }

    /// Price with absent treated as zero.
    #[inline]
    pub fn price_or_zero(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    /// Parses `updated_at`.
    ///
    /// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC) and a
    /// bare `YYYY-MM-DD`. Anything else is `None`.
    pub fn updated_at_parsed(&self) -> Option<DateTime<Utc>> {
        let raw = self.updated_at.as_deref()?.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Checks the record's `app_type` against a textual filter value.
    pub fn has_app_type(&self, app_type: &str) -> bool {
        self.app_type.is_some_and(|t| t.as_str() == app_type)
    }

    /// Reads a string field from [`Self::extra`].
    pub fn extra_str(&self, field: &str) -> Option<&str> {
        self.extra.get(field).and_then(|v| v.as_str())
    }
}

// =============================================================================
// Filter Spec
// =============================================================================

/// Remote-side filter parameters for a collection fetch.
///
/// Two specs are equal iff every present key matches by value. The builder
/// methods drop empty strings and the `"all"` sentinel, so "no filter" has
/// exactly one representation and therefore one cache key.
///
/// ## Example
/// ```rust
/// use appshelf_core::FilterSpec;
///
/// let a = FilterSpec::new().with_search("notes").with_category("all");
/// let b = FilterSpec::new().with_search("notes");
/// assert_eq!(a, b);
/// assert_eq!(a.cache_fragment(), r#"{"search":"notes"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(from = "FilterSpecFields")]
pub struct FilterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub search: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub app_type: Option<String>,
}

impl FilterSpec {
    /// Empty filter: the whole collection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = meaningful(search.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = meaningful(category.into());
        self
    }

    pub fn with_app_type(mut self, app_type: impl Into<String>) -> Self {
        self.app_type = meaningful(app_type.into());
        self
    }

    /// True when no key narrows the collection.
    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    /// Stable serialization of the present keys, used in cache keys.
    ///
    /// Keys are always emitted in the order search, category, app_type.
    /// Empty and `"all"` values are left out even when set directly on the
    /// public fields.
    pub fn cache_fragment(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .present()
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value.to_string())))
            .collect();
        serde_json::Value::Object(map).to_string()
    }

    fn present(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("search", &self.search),
            ("category", &self.category),
            ("app_type", &self.app_type),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (key, value)))
        .filter(|(_, value)| is_meaningful(value))
    }
}

/// Wire shape of [`FilterSpec`]; deserialized values go through the builders.
#[derive(Deserialize)]
struct FilterSpecFields {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    app_type: Option<String>,
}

impl From<FilterSpecFields> for FilterSpec {
    fn from(fields: FilterSpecFields) -> Self {
        FilterSpec {
            search: fields.search.and_then(meaningful),
            category: fields.category.and_then(meaningful),
            app_type: fields.app_type.and_then(meaningful),
        }
    }
}

fn is_meaningful(value: &str) -> bool {
    !value.is_empty() && value != ALL_FILTER
}

fn meaningful(value: String) -> Option<String> {
    is_meaningful(&value).then_some(value)
}

// =============================================================================
// Sort Key
// =============================================================================

/// Ordering applied by the query engine.
///
/// Parsing never fails: an unrecognized key becomes [`SortKey::Unsorted`],
/// which keeps the input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SortKey {
    /// Case-insensitive name, ascending.
    #[default]
    Name,
    /// Download count, descending.
    Downloads,
    /// Last update, most recent first.
    Updated,
    /// Open source first, then pro by ascending price.
    Price,
    /// Input order.
    Unsorted,
}

impl SortKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Downloads => "downloads",
            SortKey::Updated => "updated",
            SortKey::Price => "price",
            SortKey::Unsorted => "unsorted",
        }
    }

    /// Lenient parse; see the type docs.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "name" => SortKey::Name,
            "downloads" | "download_count" => SortKey::Downloads,
            "updated" | "updated_at" => SortKey::Updated,
            "price" => SortKey::Price,
            _ => SortKey::Unsorted,
        }
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        SortKey::parse(&value)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Query State
// =============================================================================

/// Client-side search/filter/sort state of one browsing view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QueryState {
    #[serde(default)]
    pub search_term: String,

    /// A category name or `"all"`.
    #[serde(default = "all_filter")]
    pub selected_category: String,

    #[serde(default)]
    pub sort_by: SortKey,

    /// `None` and `"all"` both disable the filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub app_type_filter: Option<String>,
}

fn all_filter() -> String {
    ALL_FILTER.to_string()
}

impl Default for QueryState {
    fn default() -> Self {
        QueryState {
            search_term: String::new(),
            selected_category: all_filter(),
            sort_by: SortKey::default(),
            app_type_filter: None,
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.selected_category = category.into();
        self
    }

    pub fn with_sort(mut self, sort_by: SortKey) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_app_type(mut self, app_type: impl Into<String>) -> Self {
        self.app_type_filter = Some(app_type.into());
        self
    }
}

// =============================================================================
// Favorite Relation
// =============================================================================

/// Membership of one application in one user's favorites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FavoriteRelation {
    pub user_id: String,
    pub app_id: String,
}

impl FavoriteRelation {
    pub fn new(user_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        FavoriteRelation {
            user_id: user_id.into(),
            app_id: app_id.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
