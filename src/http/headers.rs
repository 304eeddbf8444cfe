// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Insertion-ordered string-keyed container for headers and query params

use indexmap::IndexMap;
use serde_json::Value;

/// Request and response headers
pub type Headers = OrderedMap<String>;

/// Query parameters; values may be strings, numbers, arrays or objects
pub type Params = OrderedMap<Value>;

/// Mapping with unique string keys that iterates in insertion order.
///
/// Setting an existing key replaces its value in place, so the key keeps the
/// position of its first insertion. Query strings built from it are therefore
/// deterministic. Equality compares entries in order.
#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> PartialEq for OrderedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<V> OrderedMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert or replace a value, returning the previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<V>) -> Option<V> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<V>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Remove a key, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl OrderedMap<String> {
    /// Case-insensitive lookup, for header names
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for OrderedMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.entries.insert(key.into(), value);
        }
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Common HTTP header names
pub mod names {
    pub const ACCEPT: &str = "accept";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const USER_AGENT: &str = "user-agent";
    pub const AUTHORIZATION: &str = "authorization";
    pub const X_REQUESTED_WITH: &str = "x-requested-with";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insertion_order() {
        let mut headers = Headers::new();
        headers.set("b", "2");
        headers.set("a", "1");
        headers.set("c", "3");

        assert_eq!(headers.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut headers = Headers::new().with("first", "1").with("second", "2");
        let previous = headers.set("first", "one");

        assert_eq!(previous.as_deref(), Some("1"));
        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![("first", &"one".to_string()), ("second", &"2".to_string())]
        );
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut params: Params = [("a", json!(1)), ("b", json!(2)), ("c", json!(3))]
            .into_iter()
            .collect();
        assert_eq!(params.remove("b"), Some(json!(2)));
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(!params.contains_key("b"));
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let ab = Headers::new().with("a", "1").with("b", "2");
        let ba = Headers::new().with("b", "2").with("a", "1");
        assert_ne!(ab, ba);
        assert_eq!(ab, Headers::new().with("a", "1").with("b", "2"));
    }

    #[test]
    fn test_reset_key_keeps_position_after_remove() {
        let mut params: Params = [("a", json!(1)), ("b", json!(2)), ("c", json!(3))]
            .into_iter()
            .collect();
        params.remove("a");
        params.set("a", json!(4));
        params.set("b", json!(5));
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["b", "c", "a"]);
        assert_eq!(params.get("b"), Some(&json!(5)));
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let headers = Headers::new().with("Content-Type", "text/plain");
        assert_eq!(headers.get_ignore_case("content-type"), Some("text/plain"));
        assert!(headers.get("content-type").is_none());
    }

    #[test]
    fn test_from_object_like_pairs() {
        let headers: Headers = vec![("foo", "bar".to_string())].into_iter().collect();
        assert_eq!(headers.get("foo").map(String::as_str), Some("bar"));
    }
}
