//! One-shot compilation of the parameter set into WHERE/ORDER fragments.

use crate::condition::{BooleanOp, Condition, placeholder_key};
use crate::error::QueryResult;
use crate::params::{Filter, ParameterSet};
use crate::qb::QueryMode;
use crate::qb::builder::{QueryBuilder, push_unique};
use crate::value::Value;
use std::mem;
use tracing::debug;

impl QueryBuilder {
    /// Compile the parameter set into WHERE and ORDER BY fragments.
    ///
    /// Runs at most once: later calls are no-ops, so repeated builds render identical text.
    /// A failure is kept and reported again by every later call.
    pub fn configure_parameters(&mut self) -> QueryResult<()> {
        if let Some(err) = &self.deferred {
            return Err(err.clone());
        }
        if self.built {
            return Ok(());
        }
        self.built = true;

        if let Err(err) = self.compile() {
            self.deferred = Some(err.clone());
            return Err(err);
        }

        debug!(
            target: "dynaquery.compile",
            mode = %self.mode,
            fragments = self.wheres.len(),
            bindings = self.bindings.len(),
            "compiled query parameters"
        );
        Ok(())
    }

    fn compile(&mut self) -> QueryResult<()> {
        if let Some(shared) = self.parameters.clone() {
            let params = shared.borrow();
            self.compile_set(&params)?;
            if let Some(sort) = params.sort() {
                let item = match sort.direction() {
                    Some(dir) => format!("{} {dir}", sort.property),
                    None => sort.property.clone(),
                };
                let item = self.qualify(&item);
                push_unique(&mut self.orders, item);
            }
        }
        Ok(())
    }

    /// Walk entries then sub-groups, in insertion order.
    fn compile_set(&mut self, params: &ParameterSet) -> QueryResult<()> {
        let auto_wildcard = params.is_auto_wildcard_strings();
        for (property, filter) in params.entries() {
            match filter {
                Filter::Group(group) => {
                    for member in group.members() {
                        let fragment = self.render_condition(property, member)?;
                        self.push_where(fragment, member.combinator());
                    }
                }
                Filter::Condition(condition) => {
                    let fragment = self.render_condition(property, condition)?;
                    self.push_where(fragment, condition.combinator());
                }
                Filter::Value(value) => {
                    let condition = match value {
                        Value::Null => continue,
                        Value::Text(text) if auto_wildcard => Condition::like(text.as_str()),
                        Value::List(items) => Condition::in_list(items.iter().cloned()),
                        other => Condition::eq(other.clone()),
                    };
                    let fragment = self.render_condition(property, &condition)?;
                    self.push_where(fragment, BooleanOp::And);
                }
            }
        }

        for group in params.groups() {
            if group.params.is_empty() {
                continue;
            }
            let mut nested = self.nested();
            let result = nested.compile_set(&group.params);
            self.bindings = mem::take(&mut nested.bindings);
            result?;
            if nested.wheres.is_empty() {
                continue;
            }
            let clause = format!("({})", nested.wheres.join(" "));
            self.push_where(clause, group.op);
        }
        Ok(())
    }

    /// Empty builder with the same aliasing that takes over this builder's bindings, so
    /// placeholder keys stay unique across nesting levels.
    fn nested(&mut self) -> QueryBuilder {
        let mut nested = QueryBuilder::new(QueryMode::Select, None, &self.alias);
        nested.append_alias = self.append_alias;
        nested.bindings = mem::take(&mut self.bindings);
        nested
    }

    /// Render UPDATE assignments from the current field map.
    ///
    /// A field keeps the placeholder it was first given, so rebuilding after another `set`
    /// rebinds the value instead of allocating a new key.
    pub(crate) fn compile_assignments(&mut self) {
        let set_fields = mem::take(&mut self.set_fields);
        self.assignments.clear();
        for (field, value) in &set_fields {
            let rhs = match value {
                Value::Text(expr) => expr.clone(),
                other => format!(":{}", self.assignment_key(field, other.clone())),
            };
            let assignment = format!("{}={rhs}", self.qualify(field));
            self.assignments.push(assignment);
        }
        self.set_fields = set_fields;
    }

    fn assignment_key(&mut self, field: &str, value: Value) -> String {
        if let Some((_, key)) = self.assignment_keys.iter().find(|(f, _)| f == field) {
            let key = key.clone();
            self.bindings.rebind(&key, value);
            return key;
        }
        let key = self
            .bindings
            .bind(&format!("newValue{}", placeholder_key(field)), value);
        self.assignment_keys.push((field.to_string(), key.clone()));
        key
    }
}
