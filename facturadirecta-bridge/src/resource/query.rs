//! Query composition for `getAll` listings.
//!
//! Combines the pagination controls of an item with its free-form filter string
//! (`key=value&key=value`) into a flat query mapping.

use std::collections::BTreeMap;

/// Default page size when the caller gives none.
pub const DEFAULT_LIMIT: i64 = 100;

/// Smallest page size the API accepts.
pub const MIN_LIMIT: i64 = 1;

/// Largest page size the API accepts.
pub const MAX_LIMIT: i64 = 500;

/// Listing controls of a `getAll` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Fetch everything instead of a single page.
    pub return_all: bool,
    /// Requested page size, clamped to [`MIN_LIMIT`]..=[`MAX_LIMIT`].
    pub limit: i64,
    /// Raw `key=value&key=value` filter string.
    pub custom_query: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { return_all: false, limit: DEFAULT_LIMIT, custom_query: None }
    }
}

/// Builds the query mapping for a listing request.
///
/// `limit` is set only when `return_all` is false. Filter pairs are merged after it,
/// so a `limit` in the filter string wins. Keys and values are trimmed, segments
/// without `=` or with an empty side are dropped, and nothing is URL-decoded.
///
/// # Examples
///
/// ```
/// use facturadirecta_bridge::resource::{QueryOptions, compose_query};
///
/// let options = QueryOptions {
///     return_all: true,
///     custom_query: Some("name=Acme&&bad&email=x@y.com".to_owned()),
///     ..QueryOptions::default()
/// };
/// let query = compose_query(&options);
///
/// assert_eq!(query.len(), 2);
/// assert_eq!(query["name"], "Acme");
/// assert_eq!(query["email"], "x@y.com");
/// ```
#[must_use]
pub fn compose_query(options: &QueryOptions) -> BTreeMap<String, String> {
    let mut query = BTreeMap::new();

    if !options.return_all {
        let limit = options.limit.clamp(MIN_LIMIT, MAX_LIMIT);
        query.insert("limit".to_owned(), limit.to_string());
    }

    if let Some(custom) = options.custom_query.as_deref() {
        query.extend(parse_custom_query(custom));
    }

    query
}

/// Splits a filter string into trimmed, non-empty `(key, value)` pairs, in order.
pub fn parse_custom_query(custom: &str) -> impl Iterator<Item = (String, String)> + '_ {
    custom.split('&').filter_map(|segment| {
        let (key, value) = segment.split_once('=')?;
        let (key, value) = (key.trim(), value.trim());
        (!key.is_empty() && !value.is_empty()).then(|| (key.to_owned(), value.to_owned()))
    })
}
