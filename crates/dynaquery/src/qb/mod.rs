//! Query builder (QB) for select, update and delete statements over one root entity.
//!
//! A [`QueryBuilder`] accumulates rendered WHERE/JOIN/ORDER/GROUP fragments plus a
//! [`ParameterSet`](crate::ParameterSet) and compiles them into query text with named
//! placeholders (`:name`). The literal values are returned alongside as
//! [`Bindings`](crate::Bindings) inside a [`BuiltQuery`].
//!
//! # Usage
//!
//! ```ignore
//! use dynaquery::{qb, Condition, ParameterSet};
//!
//! // SELECT
//! let query = qb::select("Person", "p")
//!     .where_cond("name", Condition::eq("Ann"))
//!     .order_by("name DESC")
//!     .build()?;
//! assert_eq!(query.sql, "select p from Person p where p.name = :name order by p.name DESC");
//!
//! // SELECT driven by parameters
//! let query = qb::select("Person", "p")
//!     .where_params(ParameterSet::new().with("name", "Ann"))
//!     .build()?;
//! assert_eq!(query.sql, "select p from Person p where p.name like :name");
//!
//! // UPDATE
//! let query = qb::update("Person", "p")
//!     .set([("age", 30)])
//!     .where_cond("id", Condition::eq(7))
//!     .build()?;
//! assert_eq!(query.sql, "update  Person p set p.age=:newValueage where p.id = :id");
//!
//! // DELETE
//! let query = qb::delete("Person", "p")
//!     .where_cond("active", Condition::eq(false))
//!     .build()?;
//! assert_eq!(query.sql, "delete from  Person p where p.active = :active");
//! ```

mod builder;
mod built;
mod compile;
mod render;

pub use builder::QueryBuilder;
pub use built::BuiltQuery;

use crate::params::ParameterSet;
use serde::Serialize;
use std::fmt;

/// Output grammar of a builder. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Select,
    Update,
    Delete,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryMode::Select => "select",
            QueryMode::Update => "update",
            QueryMode::Delete => "delete",
        })
    }
}

/// Shape of each SELECT result row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultType {
    /// Raw entities or field tuples, as the executor returns them.
    #[default]
    RowMap,
    /// Constructor projection: `select new <Name>(<fields>)`.
    Named(String),
}

impl ResultType {
    pub fn named(name: impl Into<String>) -> Self {
        ResultType::Named(name.into())
    }
}

/// A type that maps to a root entity name in query text.
///
/// # Example
/// ```ignore
/// struct Person;
///
/// impl Entity for Person {
///     const ENTITY_NAME: &'static str = "Person";
/// }
///
/// let qb = dynaquery::qb::select_entity::<Person>("p");
/// ```
pub trait Entity {
    const ENTITY_NAME: &'static str;
}

/// Create a SELECT builder over `root` bound to `alias`.
///
/// # Example
/// ```ignore
/// let qb = dynaquery::qb::select("Person", "p");
/// ```
pub fn select(root: &str, alias: &str) -> QueryBuilder {
    QueryBuilder::new(QueryMode::Select, Some(root), alias)
}

/// Create a SELECT builder that projects into `result_type`.
pub fn select_as(result_type: &str, root: &str, alias: &str) -> QueryBuilder {
    select(root, alias).result_type(ResultType::named(result_type))
}

/// Create a SELECT builder with explicit fields. The root is supplied later with
/// [`QueryBuilder::from`].
///
/// # Example
/// ```ignore
/// let qb = dynaquery::qb::select_fields(["name", "age"]).from("Person", "p");
/// ```
pub fn select_fields<I, S>(fields: I) -> QueryBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    QueryBuilder::new(QueryMode::Select, None, "").fields(fields)
}

/// Create an UPDATE builder over `root` bound to `alias`.
pub fn update(root: &str, alias: &str) -> QueryBuilder {
    QueryBuilder::new(QueryMode::Update, Some(root), alias)
}

/// Create a DELETE builder over `root` bound to `alias`.
pub fn delete(root: &str, alias: &str) -> QueryBuilder {
    QueryBuilder::new(QueryMode::Delete, Some(root), alias)
}

/// Create a SELECT builder whose WHERE clause is driven by `params`.
pub fn from_parameters(root: &str, alias: &str, params: ParameterSet) -> QueryBuilder {
    select(root, alias).where_params(params)
}

/// Create a SELECT builder for an [`Entity`].
pub fn select_entity<E: Entity>(alias: &str) -> QueryBuilder {
    select(E::ENTITY_NAME, alias)
}

/// Create an UPDATE builder for an [`Entity`].
pub fn update_entity<E: Entity>(alias: &str) -> QueryBuilder {
    update(E::ENTITY_NAME, alias)
}

/// Create a DELETE builder for an [`Entity`].
pub fn delete_entity<E: Entity>(alias: &str) -> QueryBuilder {
    delete(E::ENTITY_NAME, alias)
}

#[cfg(test)]
mod tests;
