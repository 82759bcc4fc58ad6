//! XML codec for the FacturaDirecta wire format.
//!
//! Outbound documents are written by [`to_xml`]: one root element, a child per
//! non-empty field, leaf values entity-escaped and wrapped in CDATA. Inbound bodies are
//! flattened by [`parse_response`] into [`ResponseFields`], a `tag -> text` mapping.
//! Decoding never fails; when nothing can be extracted the raw body is returned under
//! [`RAW_RESPONSE`].

use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod reader;
mod writer;

pub use reader::{parse_collection, parse_response};
pub use writer::{to_xml, to_xml_with_root};

/// Key holding the unparsed body when no element could be extracted.
pub const RAW_RESPONSE: &str = "rawResponse";

/// Key holding the decoding error message, next to [`RAW_RESPONSE`].
pub const PARSE_ERROR: &str = "parseError";

/// Flat result mapping of one response (or one listed entity).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseFields(BTreeMap<String, String>);

impl ResponseFields {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping holding only the raw body.
    #[must_use]
    pub fn raw(body: impl Into<String>) -> Self {
        let mut fields = Self::new();
        fields.insert(RAW_RESPONSE, body);
        fields
    }

    /// Inserts a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no field was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw body, present when no element could be extracted.
    #[must_use]
    pub fn raw_response(&self) -> Option<&str> {
        self.get(RAW_RESPONSE)
    }

    /// Decoding error message, present when the body was not valid text.
    #[must_use]
    pub fn parse_error(&self) -> Option<&str> {
        self.get(PARSE_ERROR)
    }

    /// Iterates the fields in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Converts the mapping into a JSON object of strings.
    #[must_use]
    pub fn into_json(self) -> Map<String, Value> {
        self.0.into_iter().map(|(key, value)| (key, Value::String(value))).collect()
    }
}

impl<'a> IntoIterator for &'a ResponseFields {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResponseFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
