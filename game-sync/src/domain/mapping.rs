//! Ordered string tables used for the game mappings.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// String-to-string map that remembers insertion order.
///
/// Lookup is linear; the tables hold a handful of games. Order matters for
/// [`GameMapping`] because the first matching entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap {
    entries: Vec<(String, String)>,
}

/// Game label -> expected process name.
pub type GameMapping = OrderedMap;

/// Game label -> platform category name.
pub type CategoryMapping = OrderedMap;

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or update. An existing key keeps its position.
    ///
    /// Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for OrderedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor;

impl<'de> Visitor<'de> for OrderedMapVisitor {
    type Value = OrderedMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of strings to strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        // Duplicate keys: last value wins, first position is kept.
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for OrderedMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position() {
        let mut map: OrderedMap = [("A", "a.exe"), ("B", "b.exe")].into_iter().collect();
        assert_eq!(map.insert("A", "a2.exe"), Some("a.exe".to_string()));
        map.insert("C", "c.exe");

        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert_eq!(map.get("A"), Some("a2.exe"));
    }

    #[test]
    fn test_remove() {
        let mut map: OrderedMap = [("A", "a.exe"), ("B", "b.exe")].into_iter().collect();
        assert_eq!(map.remove("A"), Some("a.exe".to_string()));
        assert_eq!(map.remove("A"), None);
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("A"));
    }

    #[test]
    fn test_deserialize_preserves_document_order() {
        let json = r#"{"Zelda": "zelda.exe", "Apex": "r5apex.exe", "Minecraft": "javaw.exe"}"#;
        let map: OrderedMap = serde_json::from_str(json).unwrap();
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["Zelda", "Apex", "Minecraft"]);
    }

    #[test]
    fn test_deserialize_duplicate_key_last_value_wins() {
        let json = r#"{"A": "first.exe", "B": "b.exe", "A": "second.exe"}"#;
        let map: OrderedMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.iter().next(), Some(("A", "second.exe")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_deserialize_rejects_non_string_values() {
        assert!(serde_json::from_str::<OrderedMap>(r#"{"A": 1}"#).is_err());
    }

    #[test]
    fn test_serialize_in_order() {
        let map: OrderedMap = [("B", "b.exe"), ("A", "a.exe")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"B":"b.exe","A":"a.exe"}"#
        );
    }
}
