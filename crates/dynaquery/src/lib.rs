//! # dynaquery
//!
//! Dynamic query construction for entity stores.
//!
//! ## Features
//!
//! - **Declarative filters**: a [`ParameterSet`] of property paths bound to literals or [`Condition`]s
//! - **Three grammars**: select, update and delete over one root entity with an alias
//! - **Named placeholders**: every literal is bound to a `:name` slot, collisions get `name2`, `name3`, ...
//! - **Nested boolean groups**: [`ConditionGroup`]s and parameter sub-groups render as parenthesized clauses
//! - **Idempotent compile**: building twice yields byte-identical text
//! - **In-memory filtering**: evaluate the same parameters against loaded items
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use dynaquery::{qb, BooleanOp, Condition, ConditionGroup, ParameterSet};
//!
//! let cities = ParameterSet::new().with(
//!     "city",
//!     ConditionGroup::new()
//!         .and(Condition::eq("Bogota"))
//!         .or(Condition::eq("Medellin")),
//! );
//!
//! let query = qb::select("Person", "p")
//!     .where_params(
//!         ParameterSet::new()
//!             .with("name", Condition::eq("Ann"))
//!             .with_group(cities, BooleanOp::And),
//!     )
//!     .build()?;
//!
//! assert_eq!(
//!     query.sql,
//!     "select p from Person p where p.name = :name and (p.city = :city or p.city = :city2)"
//! );
//! ```

pub mod bindings;
pub mod condition;
pub mod config;
pub mod error;
pub mod example;
pub mod executor;
pub mod memory;
pub mod params;
pub mod qb;
pub mod value;

pub use bindings::Bindings;
pub use condition::{BooleanOp, Condition, ConditionGroup, ConditionKind, ConditionOp};
pub use config::CompilerConfig;
pub use error::{QueryError, QueryResult};
pub use example::{PropertyAccess, QueryExample};
pub use executor::QueryExecutor;
pub use params::{Filter, Paginator, ParameterSet, SharedParameters, Sort, SubGroup};
pub use value::Value;

// Re-export qb module for easy access
pub use qb::{
    BuiltQuery, Entity, QueryBuilder, QueryMode, ResultType, delete, from_parameters, select,
    select_as, select_fields, update,
};
