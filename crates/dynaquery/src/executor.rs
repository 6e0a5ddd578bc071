//! Boundary to whatever runs the compiled query text.

use crate::error::{QueryError, QueryResult};
use crate::qb::BuiltQuery;
use std::future::Future;

/// Runs compiled queries against an entity store.
///
/// Implementations bind every `:name` placeholder in [`BuiltQuery::sql`] to the matching value
/// in [`BuiltQuery::bindings`] and honor `first_result` / `max_results` when present. Retry and
/// timeout policy belong to the implementation.
pub trait QueryExecutor: Sync {
    /// Row type produced by SELECT queries.
    type Row: Send;

    /// Run a SELECT and return all rows.
    fn find(&self, query: &BuiltQuery)
    -> impl Future<Output = QueryResult<Vec<Self::Row>>> + Send;

    /// Run an UPDATE or DELETE and return the affected count.
    fn execute(&self, query: &BuiltQuery) -> impl Future<Output = QueryResult<u64>> + Send;

    /// Run a SELECT and return the first row, if any.
    fn find_first(
        &self,
        query: &BuiltQuery,
    ) -> impl Future<Output = QueryResult<Option<Self::Row>>> + Send {
        async move { Ok(self.find(query).await?.into_iter().next()) }
    }

    /// Run a SELECT that must return exactly one row.
    fn find_one(&self, query: &BuiltQuery) -> impl Future<Output = QueryResult<Self::Row>> + Send {
        async move {
            let mut rows = self.find(query).await?.into_iter();
            match (rows.next(), rows.next()) {
                (Some(row), None) => Ok(row),
                (None, _) => Err(QueryError::executor("expected one row, got none")),
                (Some(_), Some(_)) => Err(QueryError::executor("expected one row, got several")),
            }
        }
    }
}
