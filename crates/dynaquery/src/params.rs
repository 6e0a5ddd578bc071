//! Ordered filter parameters that drive WHERE-clause compilation.
//!
//! A [`ParameterSet`] maps property paths to either a literal value or a [`Condition`] /
//! [`ConditionGroup`]. Insertion order is rendering order. Nested sets are attached as
//! sub-groups with an explicit [`BooleanOp`] and render as one parenthesized clause each.
//!
//! # Example
//! ```ignore
//! use dynaquery::{BooleanOp, Condition, ParameterSet};
//!
//! let cities = ParameterSet::new()
//!     .with("city", Condition::eq("Bogota"))
//!     .with("city2", Condition::eq("Medellin").or());
//!
//! let params = ParameterSet::new()
//!     .with("name", "Ann")                 // like :name  (auto wildcard)
//!     .with("age", Condition::gte(18))
//!     .with_group(cities, BooleanOp::And)
//!     .order_by("name", true);
//! ```

use crate::condition::{BooleanOp, Condition, ConditionGroup};
use crate::config::CompilerConfig;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, Utc};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Handle to a parameter set shared between a builder and its clones.
///
/// Mutations through one holder are visible to every other holder.
pub type SharedParameters = Rc<RefCell<ParameterSet>>;

/// The value bound to one property path.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// A plain literal: rendered as `like` (text with auto wildcard) or `=`.
    Value(Value),
    Condition(Condition),
    Group(ConditionGroup),
}

impl Filter {
    /// Combinator used when this entry joins the preceding fragment.
    pub fn combinator(&self) -> BooleanOp {
        match self {
            Filter::Value(_) => BooleanOp::And,
            Filter::Condition(c) => c.combinator(),
            Filter::Group(g) => g.combinator(),
        }
    }
}

impl From<Value> for Filter {
    fn from(v: Value) -> Self {
        Filter::Value(v)
    }
}

impl From<Condition> for Filter {
    fn from(c: Condition) -> Self {
        Filter::Condition(c)
    }
}

impl From<ConditionGroup> for Filter {
    fn from(g: ConditionGroup) -> Self {
        Filter::Group(g)
    }
}

macro_rules! impl_filter_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Filter {
                fn from(v: $ty) -> Self {
                    Filter::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_filter_from_literal!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    &String,
    NaiveDate,
    DateTime<Utc>,
    Uuid,
    serde_json::Value,
);

impl<T: Into<Value>> From<Vec<T>> for Filter {
    fn from(values: Vec<T>) -> Self {
        Filter::Value(Value::from(values))
    }
}

impl<T: Into<Value>> From<Option<T>> for Filter {
    fn from(value: Option<T>) -> Self {
        Filter::Value(Value::from(value))
    }
}

/// A nested parameter set joined onto the enclosing clause with `op`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubGroup {
    pub params: ParameterSet,
    pub op: BooleanOp,
}

/// Single sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub property: String,
    pub ascending: bool,
}

impl Sort {
    /// `true` when the property text already ends with an explicit `asc`/`desc`.
    pub fn has_direction(&self) -> bool {
        let lower = self.property.trim_end().to_ascii_lowercase();
        lower.ends_with(" asc") || lower.ends_with(" desc")
    }

    /// Direction keyword, or `None` when the property already carries one.
    pub fn direction(&self) -> Option<&'static str> {
        if self.has_direction() {
            None
        } else if self.ascending {
            Some("ASC")
        } else {
            Some("DESC")
        }
    }
}

/// Page window handed to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

impl Paginator {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    /// Index of the first row of the page.
    pub fn first_result(&self) -> usize {
        (self.page.max(1) - 1) * self.page_size
    }
}

/// Ordered filter entries, sub-groups, sort and paging.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, Filter)>,
    sub_groups: Vec<SubGroup>,
    sort: Option<Sort>,
    paginator: Option<Paginator>,
    auto_wildcard_strings: bool,
    root_type: Option<String>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            sub_groups: Vec::new(),
            sort: None,
            paginator: None,
            auto_wildcard_strings: true,
            root_type: None,
        }
    }
}

impl ParameterSet {
    /// Create an empty set with auto wildcard enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set using the defaults from `config`.
    pub fn with_config(config: &CompilerConfig) -> Self {
        Self {
            auto_wildcard_strings: config.auto_wildcard_strings,
            ..Self::default()
        }
    }

    /// Create an empty set attached to a root entity type.
    pub fn for_root(root_type: impl Into<String>) -> Self {
        Self {
            root_type: Some(root_type.into()),
            ..Self::default()
        }
    }

    /// Wrap into a shared handle.
    pub fn share(self) -> SharedParameters {
        Rc::new(RefCell::new(self))
    }

    // ==================== Entries ====================

    /// Add an entry (builder style). Re-adding a path replaces its value in place.
    pub fn with(mut self, property: impl Into<String>, filter: impl Into<Filter>) -> Self {
        self.insert(property, filter);
        self
    }

    /// Add an entry. Re-adding a path replaces its value and keeps its original position.
    pub fn insert(&mut self, property: impl Into<String>, filter: impl Into<Filter>) {
        let property = property.into();
        let filter = filter.into();
        match self.entries.iter_mut().find(|(k, _)| *k == property) {
            Some(entry) => entry.1 = filter,
            None => self.entries.push((property, filter)),
        }
    }

    /// Add every pair from `entries` in iteration order.
    pub fn extend<K, F>(&mut self, entries: impl IntoIterator<Item = (K, F)>)
    where
        K: Into<String>,
        F: Into<Filter>,
    {
        for (k, f) in entries {
            self.insert(k, f);
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<Filter> {
        let idx = self.entries.iter().position(|(k, _)| k == property)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, property: &str) -> Option<&Filter> {
        self.entries
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, f)| f)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[(String, Filter)] {
        &self.entries
    }

    /// Number of entries, sub-groups not included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when there is nothing to render into a WHERE clause.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.sub_groups.iter().all(|g| g.params.is_empty())
    }

    // ==================== Sub-groups ====================

    /// Attach a nested set joined with `op` (builder style).
    pub fn with_group(mut self, params: ParameterSet, op: BooleanOp) -> Self {
        self.add_group(params, op);
        self
    }

    /// Attach a nested set joined with `op`.
    pub fn add_group(&mut self, params: ParameterSet, op: BooleanOp) {
        self.sub_groups.push(SubGroup { params, op });
    }

    pub fn groups(&self) -> &[SubGroup] {
        &self.sub_groups
    }

    // ==================== Sort & paging ====================

    /// Set the sort property (builder style). Only one sort is kept.
    pub fn order_by(mut self, property: impl Into<String>, ascending: bool) -> Self {
        self.set_order(property, ascending);
        self
    }

    pub fn set_order(&mut self, property: impl Into<String>, ascending: bool) {
        self.sort = Some(Sort {
            property: property.into(),
            ascending,
        });
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn is_sorted(&self) -> bool {
        self.sort.is_some()
    }

    /// Request the first page of `page_size` rows (builder style).
    pub fn paginate(mut self, page_size: usize) -> Self {
        self.paginator = Some(Paginator::new(1, page_size));
        self
    }

    pub fn set_paginator(&mut self, paginator: Paginator) {
        self.paginator = Some(paginator);
    }

    pub fn paginator(&self) -> Option<Paginator> {
        self.paginator
    }

    // ==================== Flags ====================

    /// Treat plain text values as wildcard `like` searches (`true`) or as equality (`false`).
    pub fn auto_wildcard_strings(mut self, enabled: bool) -> Self {
        self.auto_wildcard_strings = enabled;
        self
    }

    pub fn set_auto_wildcard_strings(&mut self, enabled: bool) {
        self.auto_wildcard_strings = enabled;
    }

    pub fn is_auto_wildcard_strings(&self) -> bool {
        self.auto_wildcard_strings
    }

    pub fn root_type(&self) -> Option<&str> {
        self.root_type.as_deref()
    }

    pub fn set_root_type(&mut self, root_type: impl Into<String>) {
        self.root_type = Some(root_type.into());
    }
}
