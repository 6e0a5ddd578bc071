//! Query condition types for dynamic queries.
//!
//! A [`Condition`] is one comparison test (kind + operands) paired with the [`BooleanOp`]
//! used to join it onto the fragments already accumulated. A [`ConditionGroup`] is an ordered
//! list of conditions rendered as one parenthesized sub-expression.
//!
//! # Example
//! ```ignore
//! use dynaquery::{Condition, ConditionGroup};
//!
//! Condition::eq("Ann");                  // name = :name
//! Condition::like("ann");                // name like :name  ("%ann%")
//! Condition::between(18, 65);            // age between :age1 and :age2
//! Condition::in_list(vec![1, 2, 3]).or() // or id in (:id)
//!
//! ConditionGroup::new()
//!     .and(Condition::eq("Bogota"))
//!     .or(Condition::eq("Medellin"));    // (city = :city or city = :city2)
//! ```

use crate::bindings::Bindings;
use crate::error::{QueryError, QueryResult};
use crate::value::Value;
use std::fmt;

/// Boolean operator joining a condition onto the preceding fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BooleanOp {
    #[default]
    And,
    Or,
}

impl BooleanOp {
    /// Lowercase keyword as rendered in query text.
    pub fn keyword(self) -> &'static str {
        match self {
            BooleanOp::And => "and",
            BooleanOp::Or => "or",
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Operator tag used to build a condition from a dynamic operand list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOp {
    Equals,
    NotEquals,
    Like,
    StartsWith,
    EndsWith,
    Between,
    GreaterOrEqual,
    LessOrEqual,
    GreaterThan,
    LessThan,
    IsNull,
    IsNotNull,
    In,
    NotIn,
    Raw,
}

impl ConditionOp {
    pub fn name(self) -> &'static str {
        match self {
            ConditionOp::Equals => "equals",
            ConditionOp::NotEquals => "not equals",
            ConditionOp::Like => "like",
            ConditionOp::StartsWith => "starts with",
            ConditionOp::EndsWith => "ends with",
            ConditionOp::Between => "between",
            ConditionOp::GreaterOrEqual => "greater or equal",
            ConditionOp::LessOrEqual => "less or equal",
            ConditionOp::GreaterThan => "greater than",
            ConditionOp::LessThan => "less than",
            ConditionOp::IsNull => "is null",
            ConditionOp::IsNotNull => "is not null",
            ConditionOp::In => "in",
            ConditionOp::NotIn => "not in",
            ConditionOp::Raw => "raw",
        }
    }

    /// Number of operands the operator takes. `None` means any number (set membership).
    pub fn arity(self) -> Option<usize> {
        match self {
            ConditionOp::IsNull | ConditionOp::IsNotNull => Some(0),
            ConditionOp::Between => Some(2),
            ConditionOp::In | ConditionOp::NotIn => None,
            _ => Some(1),
        }
    }
}

/// The comparison a [`Condition`] performs, with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    /// `<property> = :key`
    Equals(Value),
    /// `<property> <> :key`
    NotEquals(Value),
    /// `<property> like :key`; `searchable` wraps the bound pattern in wildcards.
    Like { pattern: String, searchable: bool },
    /// `<property> like :key` bound to `prefix%`
    StartsWith(String),
    /// `<property> like :key` bound to `%suffix`
    EndsWith(String),
    /// `<property> between :key1 and :key2`
    Between(Value, Value),
    GreaterOrEqual(Value),
    LessOrEqual(Value),
    GreaterThan(Value),
    LessThan(Value),
    IsNull,
    IsNotNull,
    /// `<property> in (:key)` with the set bound as one collection parameter.
    In(Vec<Value>),
    NotIn(Vec<Value>),
    /// `<property> [not] in (<query>)`; `params` are bound under their own names.
    InSubquery {
        query: String,
        params: Vec<(String, Value)>,
        negated: bool,
    },
    /// Verbatim text, never alias-qualified.
    Raw(String),
    /// Nested members rendered as `(a or b ...)`.
    Group(Vec<Condition>),
}

/// A single comparison test plus the boolean operator that joins it.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    kind: ConditionKind,
    combinator: BooleanOp,
}

impl Condition {
    /// Create a condition with the default `and` combinator.
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            kind,
            combinator: BooleanOp::And,
        }
    }

    /// Build a condition from an operator tag and an operand list.
    ///
    /// Fails with [`QueryError::InvalidArity`] when the operand count does not match the
    /// operator. `In`/`NotIn` accept one or more members; a single `List` operand is used as
    /// the set, and an empty set is rejected.
    pub fn from_operands(op: ConditionOp, operands: Vec<Value>) -> QueryResult<Self> {
        if let Some(expected) = op.arity()
            && operands.len() != expected
        {
            return Err(QueryError::invalid_arity(op.name(), expected, operands.len()));
        }

        let mut operands = operands.into_iter();
        let kind = match op {
            ConditionOp::In => ConditionKind::In(member_set(op, operands.collect())?),
            ConditionOp::NotIn => ConditionKind::NotIn(member_set(op, operands.collect())?),
            ConditionOp::Equals => ConditionKind::Equals(take(&mut operands)),
            ConditionOp::NotEquals => ConditionKind::NotEquals(take(&mut operands)),
            ConditionOp::Like => ConditionKind::Like {
                pattern: take(&mut operands).to_string(),
                searchable: true,
            },
            ConditionOp::StartsWith => ConditionKind::StartsWith(take(&mut operands).to_string()),
            ConditionOp::EndsWith => ConditionKind::EndsWith(take(&mut operands).to_string()),
            ConditionOp::Between => {
                let lo = take(&mut operands);
                ConditionKind::Between(lo, take(&mut operands))
            }
            ConditionOp::GreaterOrEqual => ConditionKind::GreaterOrEqual(take(&mut operands)),
            ConditionOp::LessOrEqual => ConditionKind::LessOrEqual(take(&mut operands)),
            ConditionOp::GreaterThan => ConditionKind::GreaterThan(take(&mut operands)),
            ConditionOp::LessThan => ConditionKind::LessThan(take(&mut operands)),
            ConditionOp::IsNull => ConditionKind::IsNull,
            ConditionOp::IsNotNull => ConditionKind::IsNotNull,
            ConditionOp::Raw => match take(&mut operands) {
                Value::Text(text) => ConditionKind::Raw(text),
                other => {
                    return Err(QueryError::invalid_operand(
                        op.name(),
                        format!("expected text, got {other:?}"),
                    ));
                }
            },
        };
        Ok(Self::new(kind))
    }

    // ==================== Convenience constructors ====================

    /// Create an equality condition: property = value
    pub fn eq(value: impl Into<Value>) -> Self {
        Self::new(ConditionKind::Equals(value.into()))
    }

    /// Create an inequality condition: property <> value
    pub fn ne(value: impl Into<Value>) -> Self {
        Self::new(ConditionKind::NotEquals(value.into()))
    }

    /// Create a searchable LIKE condition.
    ///
    /// The bound value has `*` replaced by `%` and is wrapped in `%` unless it already starts
    /// and ends with `%`.
    pub fn like(pattern: impl Into<String>) -> Self {
        Self::new(ConditionKind::Like {
            pattern: pattern.into(),
            searchable: true,
        })
    }

    /// Create a LIKE condition that binds the pattern unchanged.
    pub fn like_exact(pattern: impl Into<String>) -> Self {
        Self::new(ConditionKind::Like {
            pattern: pattern.into(),
            searchable: false,
        })
    }

    /// Create a LIKE condition matching values that start with `prefix`.
    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Self::new(ConditionKind::StartsWith(prefix.into()))
    }

    /// Create a LIKE condition matching values that end with `suffix`.
    pub fn ends_with(suffix: impl Into<String>) -> Self {
        Self::new(ConditionKind::EndsWith(suffix.into()))
    }

    /// Create a BETWEEN condition: property between lo and hi
    pub fn between(lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        Self::new(ConditionKind::Between(lo.into(), hi.into()))
    }

    /// Create a greater-than-or-equal condition: property >= value
    pub fn gte(value: impl Into<Value>) -> Self {
        Self::new(ConditionKind::GreaterOrEqual(value.into()))
    }

    /// Create a less-than-or-equal condition: property <= value
    pub fn lte(value: impl Into<Value>) -> Self {
        Self::new(ConditionKind::LessOrEqual(value.into()))
    }

    /// Create a greater-than condition: property > value
    pub fn gt(value: impl Into<Value>) -> Self {
        Self::new(ConditionKind::GreaterThan(value.into()))
    }

    /// Create a less-than condition: property < value
    pub fn lt(value: impl Into<Value>) -> Self {
        Self::new(ConditionKind::LessThan(value.into()))
    }

    /// Create an IS NULL condition.
    pub fn is_null() -> Self {
        Self::new(ConditionKind::IsNull)
    }

    /// Create an IS NOT NULL condition.
    pub fn is_not_null() -> Self {
        Self::new(ConditionKind::IsNotNull)
    }

    /// Create an IN condition over a set of values.
    pub fn in_list<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::new(ConditionKind::In(values.into_iter().map(Into::into).collect()))
    }

    /// Create a NOT IN condition over a set of values.
    pub fn not_in<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::new(ConditionKind::NotIn(values.into_iter().map(Into::into).collect()))
    }

    /// Create an IN condition over a subquery.
    pub fn in_subquery(query: impl Into<String>) -> Self {
        Self::in_subquery_with(query, Vec::<(String, Value)>::new())
    }

    /// Create an IN condition over a subquery that references its own named parameters.
    pub fn in_subquery_with<K, V>(
        query: impl Into<String>,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(ConditionKind::InSubquery {
            query: query.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            negated: false,
        })
    }

    /// Create a NOT IN condition over a subquery.
    pub fn not_in_subquery(query: impl Into<String>) -> Self {
        Self::new(ConditionKind::InSubquery {
            query: query.into(),
            params: Vec::new(),
            negated: true,
        })
    }

    /// Create a raw fragment (escape hatch).
    ///
    /// # Safety
    /// The text is emitted verbatim; never build it from user input.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::new(ConditionKind::Raw(text.into()))
    }

    // ==================== Combinator ====================

    /// Return this condition joined with `op` instead of its current combinator.
    pub fn with_combinator(self, op: BooleanOp) -> Self {
        Self {
            kind: self.kind,
            combinator: op,
        }
    }

    /// Return this condition joined with `and`.
    pub fn and(self) -> Self {
        self.with_combinator(BooleanOp::And)
    }

    /// Return this condition joined with `or`.
    pub fn or(self) -> Self {
        self.with_combinator(BooleanOp::Or)
    }

    pub fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    pub fn combinator(&self) -> BooleanOp {
        self.combinator
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ConditionKind::Group(_))
    }

    // ==================== Rendering ====================

    /// Render `<property> <operator> <placeholder>` and bind the operands into `bindings`.
    ///
    /// The property is rendered as given; alias qualification is the caller's job.
    /// Returns an empty string for an empty group.
    pub fn render(&self, property: &str, bindings: &mut Bindings) -> QueryResult<String> {
        self.render_with(property, bindings, &|property: &str| property.to_string())
    }

    /// Render like [`Condition::render`], displaying the property as `qualify(property)`.
    ///
    /// The placeholder key is always derived from the unqualified property. `Raw` fragments
    /// are returned verbatim.
    pub(crate) fn render_with(
        &self,
        property: &str,
        bindings: &mut Bindings,
        qualify: &dyn Fn(&str) -> String,
    ) -> QueryResult<String> {
        let path = property;
        let key = placeholder_key(path);
        let shown = qualify(path);
        let property = shown.as_str();
        let fragment = match &self.kind {
            ConditionKind::Equals(v) => compare(property, "=", &key, v, bindings),
            ConditionKind::NotEquals(v) => compare(property, "<>", &key, v, bindings),
            ConditionKind::Like {
                pattern,
                searchable,
            } => {
                let bound = if *searchable {
                    to_searchable(pattern)
                } else {
                    pattern.clone()
                };
                compare(property, "like", &key, &Value::Text(bound), bindings)
            }
            ConditionKind::StartsWith(prefix) => {
                compare(property, "like", &key, &Value::Text(format!("{prefix}%")), bindings)
            }
            ConditionKind::EndsWith(suffix) => {
                compare(property, "like", &key, &Value::Text(format!("%{suffix}")), bindings)
            }
            ConditionKind::Between(lo, hi) => {
                let lo_key = bindings.bind(&format!("{key}1"), lo.clone());
                let hi_key = bindings.bind(&format!("{key}2"), hi.clone());
                format!("{property} between :{lo_key} and :{hi_key}")
            }
            ConditionKind::GreaterOrEqual(v) => compare(property, ">=", &key, v, bindings),
            ConditionKind::LessOrEqual(v) => compare(property, "<=", &key, v, bindings),
            ConditionKind::GreaterThan(v) => compare(property, ">", &key, v, bindings),
            ConditionKind::LessThan(v) => compare(property, "<", &key, v, bindings),
            ConditionKind::IsNull => format!("{property} is null"),
            ConditionKind::IsNotNull => format!("{property} is not null"),
            ConditionKind::In(values) => {
                let k = bindings.bind(&key, Value::List(values.clone()));
                format!("{property} in (:{k})")
            }
            ConditionKind::NotIn(values) => {
                let k = bindings.bind(&key, Value::List(values.clone()));
                format!("{property} not in (:{k})")
            }
            ConditionKind::InSubquery {
                query,
                params,
                negated,
            } => {
                for (name, value) in params {
                    bindings.bind_exact(name, value.clone())?;
                }
                let op = if *negated { "not in" } else { "in" };
                format!("{property} {op} ({query})")
            }
            ConditionKind::Raw(text) => text.clone(),
            ConditionKind::Group(members) => {
                return render_members(members, path, bindings, qualify);
            }
        };
        Ok(fragment)
    }
}

fn compare(property: &str, op: &str, key: &str, value: &Value, bindings: &mut Bindings) -> String {
    let k = bindings.bind(key, value.clone());
    format!("{property} {op} :{k}")
}

fn render_members(
    members: &[Condition],
    property: &str,
    bindings: &mut Bindings,
    qualify: &dyn Fn(&str) -> String,
) -> QueryResult<String> {
    let mut out = String::new();
    for member in members {
        let fragment = member.render_with(property, bindings, qualify)?;
        if fragment.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
            out.push_str(member.combinator.keyword());
            out.push(' ');
        }
        out.push_str(&fragment);
    }
    if out.is_empty() {
        return Ok(out);
    }
    Ok(format!("({out})"))
}

fn take(operands: &mut std::vec::IntoIter<Value>) -> Value {
    operands.next().unwrap_or(Value::Null)
}

fn member_set(op: ConditionOp, operands: Vec<Value>) -> QueryResult<Vec<Value>> {
    let members = match <[Value; 1]>::try_from(operands) {
        Ok([Value::List(items)]) => items,
        Ok([single]) => vec![single],
        Err(operands) => operands,
    };
    if members.is_empty() {
        return Err(QueryError::invalid_arity(op.name(), 1, 0));
    }
    Ok(members)
}

/// An ordered list of conditions rendered as one parenthesized sub-expression.
///
/// Each member keeps its own combinator; the first rendered member has no leading operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionGroup {
    members: Vec<Condition>,
    combinator: BooleanOp,
}

impl ConditionGroup {
    /// Create an empty group joined with `and`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group from existing conditions, keeping their combinators.
    pub fn of(members: impl IntoIterator<Item = Condition>) -> Self {
        Self {
            members: members.into_iter().collect(),
            combinator: BooleanOp::And,
        }
    }

    /// Append a condition as-is.
    pub fn push(mut self, condition: Condition) -> Self {
        self.members.push(condition);
        self
    }

    /// Append a condition joined with `and`.
    pub fn and(self, condition: Condition) -> Self {
        self.push(condition.and())
    }

    /// Append a condition joined with `or`.
    pub fn or(self, condition: Condition) -> Self {
        self.push(condition.or())
    }

    /// Set the operator joining the whole group onto preceding fragments.
    pub fn with_combinator(mut self, op: BooleanOp) -> Self {
        self.combinator = op;
        self
    }

    pub fn members(&self) -> &[Condition] {
        &self.members
    }

    pub fn combinator(&self) -> BooleanOp {
        self.combinator
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Render `(<m1> <op2> <m2> ...)` for `property`. Empty groups render as an empty string.
    pub fn render(&self, property: &str, bindings: &mut Bindings) -> QueryResult<String> {
        render_members(&self.members, property, bindings, &|fragment| fragment.to_string())
    }

    /// Convert into a nestable [`Condition`] carrying the group's combinator.
    pub fn into_condition(self) -> Condition {
        Condition {
            kind: ConditionKind::Group(self.members),
            combinator: self.combinator,
        }
    }
}

impl From<ConditionGroup> for Condition {
    fn from(group: ConditionGroup) -> Self {
        group.into_condition()
    }
}

/// Placeholder key for a property path: the path with every non-alphanumeric character removed.
///
/// `p.id` becomes `pid`. Paths with no alphanumeric characters fall back to `param`.
pub fn placeholder_key(property: &str) -> String {
    let key: String = property.chars().filter(|c| c.is_alphanumeric()).collect();
    if key.is_empty() {
        "param".to_string()
    } else {
        key
    }
}

/// Expand a search string into a LIKE pattern.
///
/// `*` becomes `%` and the result is wrapped in `%`, unless the text already starts and ends
/// with `%`: `"Ann"` → `"%Ann%"`, `"Ann%"` → `"%Ann%%"`, `"%Ann%"` → `"%Ann%"`.
pub fn to_searchable(text: &str) -> String {
    if text.len() > 1 && text.starts_with('%') && text.ends_with('%') {
        return text.to_string();
    }
    format!("%{}%", text.replace('*', "%"))
}
