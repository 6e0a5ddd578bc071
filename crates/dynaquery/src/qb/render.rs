//! Text assembly for the three output grammars.

use crate::error::{QueryError, QueryResult};
use crate::qb::builder::QueryBuilder;
use crate::qb::built::BuiltQuery;
use crate::qb::{QueryMode, ResultType};
use tracing::trace;

impl QueryBuilder {
    /// Compile parameters (once) and render the query text with its bindings.
    pub fn build(&mut self) -> QueryResult<BuiltQuery> {
        let sql = self.to_query_string()?;
        let paginator = self
            .parameters
            .as_ref()
            .and_then(|params| params.borrow().paginator());
        Ok(BuiltQuery {
            sql,
            mode: self.mode,
            bindings: self.bindings.clone(),
            first_result: paginator.map(|p| p.first_result()),
            max_results: paginator.map(|p| p.page_size),
        })
    }

    /// Compile parameters (once) and render the query text only.
    pub fn to_query_string(&mut self) -> QueryResult<String> {
        self.configure_parameters()?;
        let sql = match self.mode {
            QueryMode::Select => {
                let head = match &self.custom_select {
                    Some(head) => head.clone(),
                    None => format!("select {}", self.projection()),
                };
                self.render_select(&head)?
            }
            QueryMode::Update => {
                self.compile_assignments();
                self.render_update()?
            }
            QueryMode::Delete => self.render_delete()?,
        };
        trace!(target: "dynaquery.compile", sql = %sql, "rendered query");
        Ok(sql)
    }

    /// Render an aggregate projection over one field:
    /// `select <function>(<alias>.<field>) from <root> <alias> [joins] [where ...]`.
    ///
    /// Group by and order by are not rendered.
    pub fn create_projection(&mut self, function: &str, field: &str) -> QueryResult<String> {
        self.expect_mode(&[QueryMode::Select])?;
        self.configure_parameters()?;
        let head = format!("select {function}({})", self.qualify(field));
        let mut sql = format!("{head} from {}", self.source()?);
        self.push_joins_and_wheres(&mut sql);
        trace!(target: "dynaquery.compile", sql = %sql, "rendered projection");
        Ok(sql)
    }

    fn projection(&self) -> String {
        let fields: Vec<String> = self.fields.iter().map(|f| self.qualify(f)).collect();
        let list = if fields.is_empty() {
            self.alias.clone()
        } else {
            fields.join(", ")
        };
        match &self.result_type {
            ResultType::Named(name) => format!("new {name}({list})"),
            ResultType::RowMap => list,
        }
    }

    fn source(&self) -> QueryResult<String> {
        if let Some(source) = &self.custom_from {
            return Ok(source.clone());
        }
        match &self.root_type {
            Some(root) if self.alias.is_empty() => Ok(root.clone()),
            Some(root) => Ok(format!("{root} {}", self.alias)),
            None => Err(QueryError::MissingRootType(self.mode)),
        }
    }

    fn push_joins_and_wheres(&self, sql: &mut String) {
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.wheres.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.wheres.join(" "));
        }
    }

    fn render_select(&self, head: &str) -> QueryResult<String> {
        let mut sql = format!("{head} from {}", self.source()?);
        self.push_joins_and_wheres(&mut sql);
        if !self.group_bys.is_empty() {
            sql.push_str(" group by ");
            sql.push_str(&self.group_bys.join(", "));
        }
        if !self.orders.is_empty() {
            sql.push_str(" order by ");
            sql.push_str(&self.orders.join(", "));
        }
        Ok(sql)
    }

    fn render_update(&self) -> QueryResult<String> {
        if self.assignments.is_empty() {
            return Err(QueryError::MissingUpdateFields);
        }
        let mut sql = format!("update  {}", self.source()?);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql.push_str(" set ");
        sql.push_str(&self.assignments.join(", "));
        if !self.wheres.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.wheres.join(" "));
        }
        Ok(sql)
    }

    fn render_delete(&self) -> QueryResult<String> {
        let mut sql = format!("delete from  {}", self.source()?);
        self.push_joins_and_wheres(&mut sql);
        Ok(sql)
    }
}
