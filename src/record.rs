//! Input records consumed by field fragments when a template is formatted.

use std::collections::HashMap;

/// Read-only key/value data source for one outgoing message.
///
/// A missing key is not an error: field fragments render it as an empty string.
pub trait Record {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<&str>;

    /// Value for `key`, or `""` when the record has no such key.
    fn lookup(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }
}

/// A named record backed by a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRecord {
    name: String,
    values: HashMap<String, String>,
}

impl MapRecord {
    pub fn new(name: impl Into<String>) -> Self {
        MapRecord {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Record for MapRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for MapRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = MapRecord::default();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_looks_up_empty() {
        let record = MapRecord::new("r").with("a", "1");
        assert_eq!(record.lookup("a"), "1");
        assert_eq!(record.lookup("b"), "");
        assert_eq!(record.get("b"), None);
        assert_eq!(record.name(), "r");
    }

    #[test]
    fn collect_from_pairs() {
        let record: MapRecord = [("x", "1"), ("y", "2")].into_iter().collect();
        assert_eq!(record.len(), 2);
        assert_eq!(record.lookup("y"), "2");
        assert_eq!(record.name(), "");
    }
}
