//! Named placeholder bindings produced while compiling a query.

use crate::error::{QueryError, QueryResult};
use crate::value::Value;
use serde::ser::{Serialize, Serializer};

/// Ordered registry of placeholder names and the literal values bound to them.
///
/// Keys are allocated with [`Bindings::bind`]: when the requested key is taken, the first free
/// numeric suffix starting at `2` is appended (`city`, `city2`, `city3`, ...). A name is never
/// bound to two values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(String, Value)>,
}

impl Bindings {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind `value` under `base` or a disambiguated variant of it, returning the key used.
    pub fn bind(&mut self, base: &str, value: Value) -> String {
        let mut key = base.to_string();
        let mut suffix = 1;
        while self.contains_key(&key) {
            suffix += 1;
            key = format!("{base}{suffix}");
        }
        self.entries.push((key.clone(), value));
        key
    }

    /// Bind `value` under exactly `key`.
    ///
    /// Rebinding the same value is a no-op; binding a different value is an error, since the
    /// caller's query text already references `key` verbatim.
    pub fn bind_exact(&mut self, key: &str, value: Value) -> QueryResult<()> {
        match self.get(key) {
            Some(existing) if *existing == value => Ok(()),
            Some(_) => Err(QueryError::PlaceholderConflict(key.to_string())),
            None => {
                self.entries.push((key.to_string(), value));
                Ok(())
            }
        }
    }

    /// Replace the value bound to an existing `key`, or bind it when absent.
    pub(crate) fn rebind(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Placeholder names in binding order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Bindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

impl IntoIterator for Bindings {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
