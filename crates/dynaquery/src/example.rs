//! Property access and query-by-example.
//!
//! [`PropertyAccess`] is the read side of the objects being queried: given a simple or dotted
//! property path it returns the current value. It is implemented for `serde_json::Value` so any
//! `Serialize` type can take part through [`QueryExample::from_serialize`].
//!
//! # Example
//! ```ignore
//! use dynaquery::QueryExample;
//! use serde_json::json;
//!
//! let person = json!({ "name": "Ann", "age": 0, "active": true, "address": { "city": "Cali" } });
//! let params = QueryExample::new(&person).exclude("active").build();
//! // name like :name and address.city like :addresscity
//! ```

use crate::error::QueryResult;
use crate::params::ParameterSet;
use crate::value::Value;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Reads property values from an object by path.
pub trait PropertyAccess {
    /// Value at `path` (`"name"` or `"address.city"`), or `None` when the path does not resolve.
    fn property(&self, path: &str) -> Option<Value>;

    /// Top-level property names, in a stable order.
    fn property_names(&self) -> Vec<String>;
}

impl PropertyAccess for serde_json::Value {
    fn property(&self, path: &str) -> Option<Value> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(Value::from_json(current.clone()))
    }

    fn property_names(&self) -> Vec<String> {
        match self.as_object() {
            Some(map) => map.keys().cloned().collect(),
            None => Vec::new(),
        }
    }
}

impl PropertyAccess for BTreeMap<String, Value> {
    fn property(&self, path: &str) -> Option<Value> {
        self.get(path).cloned()
    }

    fn property_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl<T: PropertyAccess + ?Sized> PropertyAccess for &T {
    fn property(&self, path: &str) -> Option<Value> {
        (**self).property(path)
    }

    fn property_names(&self) -> Vec<String> {
        (**self).property_names()
    }
}

/// Bookkeeping properties never used as filters.
const IGNORED_PROPERTIES: [&str; 3] = ["serialVersionUID", "creationDate", "creationTime"];

/// Builds a [`ParameterSet`] from the populated properties of an example object.
///
/// Nulls, empty text, collections, zeroes and `false` are skipped by default, so an example
/// with only a few fields set filters on exactly those fields. Nested objects contribute
/// `<name>.<field>` entries for their scalar fields.
#[derive(Debug, Clone)]
pub struct QueryExample<T> {
    example: T,
    exclude_zeroes: bool,
    exclude_falses: bool,
    excluded: BTreeSet<String>,
}

impl<T: PropertyAccess> QueryExample<T> {
    pub fn new(example: T) -> Self {
        Self {
            example,
            exclude_zeroes: true,
            exclude_falses: true,
            excluded: BTreeSet::new(),
        }
    }

    /// Never use `property` as a filter.
    pub fn exclude(mut self, property: impl Into<String>) -> Self {
        self.excluded.insert(property.into());
        self
    }

    /// Keep numeric zero values as filters.
    pub fn include_zeroes(mut self) -> Self {
        self.exclude_zeroes = false;
        self
    }

    /// Keep `false` values as filters.
    pub fn include_falses(mut self) -> Self {
        self.exclude_falses = false;
        self
    }

    pub fn build(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        for name in self.example.property_names() {
            if !is_filter_name(&name) || self.excluded.contains(&name) {
                continue;
            }
            let Some(value) = self.example.property(&name) else {
                continue;
            };
            match value {
                Value::Json(serde_json::Value::Object(map)) => {
                    for (field, nested) in map {
                        let nested = Value::from_json(nested);
                        if is_filter_name(&field) && is_filter_value(&nested) {
                            params.insert(format!("{name}.{field}"), nested);
                        }
                    }
                }
                value if is_filter_value(&value) && self.keeps(&value) => {
                    params.insert(name, value);
                }
                _ => {}
            }
        }
        params
    }

    fn keeps(&self, value: &Value) -> bool {
        !(self.exclude_zeroes && value.is_zero()) && !(self.exclude_falses && value.is_false())
    }
}

impl QueryExample<serde_json::Value> {
    /// Build an example from any serializable value.
    pub fn from_serialize<S: Serialize + ?Sized>(example: &S) -> QueryResult<Self> {
        Ok(Self::new(serde_json::to_value(example)?))
    }
}

fn is_filter_name(name: &str) -> bool {
    !IGNORED_PROPERTIES
        .iter()
        .any(|ignored| ignored.eq_ignore_ascii_case(name))
}

fn is_filter_value(value: &Value) -> bool {
    !value.is_null() && !value.is_empty() && !matches!(value, Value::List(_) | Value::Json(_))
}
