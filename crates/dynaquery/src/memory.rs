//! In-memory evaluation of a [`ParameterSet`] against already-loaded items.
//!
//! Matching follows the compiled WHERE clause: fragments are combined left to right in
//! insertion order, `and` binds tighter than `or`, and each sub-group is one parenthesized
//! term. Conditions that only make sense inside the query engine (raw fragments, subqueries)
//! are skipped with a warning instead of failing the whole batch.

use crate::condition::{BooleanOp, Condition, ConditionKind, to_searchable};
use crate::error::{QueryError, QueryResult};
use crate::example::PropertyAccess;
use crate::params::{Filter, ParameterSet};
use crate::value::Value;
use like::Like;
use std::cmp::Ordering;
use tracing::warn;

/// Items of `items` matching `params`, in their original order.
pub fn filter<'a, T: PropertyAccess>(items: &'a [T], params: &ParameterSet) -> Vec<&'a T> {
    items.iter().filter(|item| matches(*item, params)).collect()
}

/// Filter, then apply the parameter set's sort and page window.
pub fn query<'a, T: PropertyAccess>(items: &'a [T], params: &ParameterSet) -> Vec<&'a T> {
    let mut found = filter(items, params);
    if let Some(sort) = params.sort() {
        let (property, descending) = split_direction(&sort.property, sort.ascending);
        found.sort_by(|a, b| {
            let left = a.property(property).unwrap_or(Value::Null);
            let right = b.property(property).unwrap_or(Value::Null);
            let ordering = compare_nulls_first(&left, &right);
            if descending { ordering.reverse() } else { ordering }
        });
    }
    match params.paginator() {
        Some(page) => found
            .into_iter()
            .skip(page.first_result())
            .take(page.page_size)
            .collect(),
        None => found,
    }
}

/// `true` when `item` satisfies every entry and sub-group of `params`.
pub fn matches<T: PropertyAccess + ?Sized>(item: &T, params: &ParameterSet) -> bool {
    let mut acc = Accumulator::default();
    let auto_wildcard = params.is_auto_wildcard_strings();

    for (property, filter) in params.entries() {
        let actual = item.property(property).unwrap_or(Value::Null);
        match filter {
            Filter::Group(group) => {
                for member in group.members() {
                    if let Some(result) = check(member, property, &actual) {
                        acc.push(member.combinator(), result);
                    }
                }
            }
            Filter::Condition(condition) => {
                if let Some(result) = check(condition, property, &actual) {
                    acc.push(condition.combinator(), result);
                }
            }
            Filter::Value(value) => {
                let condition = match value {
                    Value::Null => continue,
                    Value::Text(text) if auto_wildcard => Condition::like(text.as_str()),
                    Value::List(items) => Condition::in_list(items.iter().cloned()),
                    other => Condition::eq(other.clone()),
                };
                if let Some(result) = check(&condition, property, &actual) {
                    acc.push(BooleanOp::And, result);
                }
            }
        }
    }

    for group in params.groups() {
        if group.params.is_empty() {
            continue;
        }
        acc.push(group.op, matches(item, &group.params));
    }

    acc.finish()
}

/// Evaluate one condition against a property value.
///
/// Returns [`QueryError::Unsupported`] for raw fragments and subqueries.
pub fn evaluate(condition: &Condition, actual: &Value) -> QueryResult<bool> {
    let result = match condition.kind() {
        ConditionKind::Equals(expected) => !actual.is_null() && actual.loosely_eq(expected),
        ConditionKind::NotEquals(expected) => !actual.is_null() && !actual.loosely_eq(expected),
        ConditionKind::Like {
            pattern,
            searchable,
        } => {
            let pattern = if *searchable {
                to_searchable(pattern)
            } else {
                pattern.clone()
            };
            like_match(actual, &pattern)
        }
        ConditionKind::StartsWith(prefix) => like_match(actual, &format!("{prefix}%")),
        ConditionKind::EndsWith(suffix) => like_match(actual, &format!("%{suffix}")),
        ConditionKind::Between(lo, hi) => {
            matches!(actual.compare(lo), Some(Ordering::Greater | Ordering::Equal))
                && matches!(actual.compare(hi), Some(Ordering::Less | Ordering::Equal))
        }
        ConditionKind::GreaterOrEqual(v) => {
            matches!(actual.compare(v), Some(Ordering::Greater | Ordering::Equal))
        }
        ConditionKind::LessOrEqual(v) => {
            matches!(actual.compare(v), Some(Ordering::Less | Ordering::Equal))
        }
        ConditionKind::GreaterThan(v) => actual.compare(v) == Some(Ordering::Greater),
        ConditionKind::LessThan(v) => actual.compare(v) == Some(Ordering::Less),
        ConditionKind::IsNull => actual.is_null(),
        ConditionKind::IsNotNull => !actual.is_null(),
        ConditionKind::In(set) => !actual.is_null() && set.iter().any(|v| actual.loosely_eq(v)),
        ConditionKind::NotIn(set) => !actual.is_null() && !set.iter().any(|v| actual.loosely_eq(v)),
        ConditionKind::InSubquery { query, .. } => {
            return Err(QueryError::unsupported(format!("subquery '{query}'")));
        }
        ConditionKind::Raw(text) => {
            return Err(QueryError::unsupported(format!("raw fragment '{text}'")));
        }
        ConditionKind::Group(members) => {
            let mut acc = Accumulator::default();
            for member in members {
                match evaluate(member, actual) {
                    Ok(result) => acc.push(member.combinator(), result),
                    Err(err) if err.is_unsupported() => {}
                    Err(err) => return Err(err),
                }
            }
            acc.finish()
        }
    };
    Ok(result)
}

/// Evaluate, logging and skipping unsupported kinds.
fn check(condition: &Condition, property: &str, actual: &Value) -> Option<bool> {
    match evaluate(condition, actual) {
        Ok(result) => Some(result),
        Err(err) => {
            warn!(
                target: "dynaquery.memory",
                property,
                error = %err,
                "skipping condition during in-memory filtering"
            );
            None
        }
    }
}

fn like_match(actual: &Value, pattern: &str) -> bool {
    match actual.as_str() {
        Some(text) => Like::<false>::like(text, pattern).unwrap_or(false),
        None => false,
    }
}

fn split_direction(property: &str, ascending: bool) -> (&str, bool) {
    let trimmed = property.trim_end();
    let lower = trimmed.to_ascii_lowercase();
    if lower.ends_with(" desc") {
        (trimmed[..trimmed.len() - 5].trim_end(), true)
    } else if lower.ends_with(" asc") {
        (trimmed[..trimmed.len() - 4].trim_end(), false)
    } else {
        (trimmed, !ascending)
    }
}

fn compare_nulls_first(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
    }
}

/// Left-to-right boolean fold where `and` binds tighter than `or`.
///
/// An empty fold is `true`: no filters match everything.
#[derive(Debug, Default)]
struct Accumulator {
    any_or: bool,
    current: Option<bool>,
}

impl Accumulator {
    fn push(&mut self, op: BooleanOp, result: bool) {
        self.current = Some(match (self.current, op) {
            (None, _) => result,
            (Some(run), BooleanOp::And) => run && result,
            (Some(run), BooleanOp::Or) => {
                self.any_or |= run;
                result
            }
        });
    }

    fn finish(&self) -> bool {
        self.any_or || self.current.unwrap_or(true)
    }
}
