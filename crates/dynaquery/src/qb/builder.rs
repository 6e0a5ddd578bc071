//! Builder state and fragment accumulation.

use crate::bindings::Bindings;
use crate::condition::{BooleanOp, Condition};
use crate::config::CompilerConfig;
use crate::error::{QueryError, QueryResult};
use crate::executor::QueryExecutor;
use crate::params::{ParameterSet, SharedParameters};
use crate::qb::{QueryMode, ResultType};
use crate::value::Value;
use std::future::Future;
use std::rc::Rc;

/// Query compiler for one root entity.
///
/// Cloning deep-copies every fragment list and the bindings, but the clone shares the
/// same [`SharedParameters`] handle: entries added to the parameter set through either
/// builder are seen by both.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) mode: QueryMode,
    pub(crate) root_type: Option<String>,
    pub(crate) alias: String,
    pub(crate) result_type: ResultType,
    pub(crate) fields: Vec<String>,
    pub(crate) custom_select: Option<String>,
    pub(crate) custom_from: Option<String>,
    pub(crate) wheres: Vec<String>,
    pub(crate) joins: Vec<String>,
    pub(crate) orders: Vec<String>,
    pub(crate) group_bys: Vec<String>,
    /// UPDATE field/value map in insertion order
    pub(crate) set_fields: Vec<(String, Value)>,
    /// Rendered UPDATE assignments, refreshed from `set_fields` on every build
    pub(crate) assignments: Vec<String>,
    /// Placeholder allocated to each bound UPDATE field, reused across builds
    pub(crate) assignment_keys: Vec<(String, String)>,
    pub(crate) parameters: Option<SharedParameters>,
    pub(crate) bindings: Bindings,
    pub(crate) append_alias: bool,
    pub(crate) auto_wildcard_strings: bool,
    pub(crate) built: bool,
    /// First error raised by a chained call, reported by `build()`
    pub(crate) deferred: Option<QueryError>,
}

impl QueryBuilder {
    /// Create a builder. `root` may be `None` when the root is set later with
    /// [`QueryBuilder::from`] or replaced with [`QueryBuilder::custom_from`].
    pub fn new(mode: QueryMode, root: Option<&str>, alias: &str) -> Self {
        Self {
            mode,
            root_type: root.map(str::to_string),
            alias: alias.to_string(),
            result_type: ResultType::RowMap,
            fields: Vec::new(),
            custom_select: None,
            custom_from: None,
            wheres: Vec::new(),
            joins: Vec::new(),
            orders: Vec::new(),
            group_bys: Vec::new(),
            set_fields: Vec::new(),
            assignments: Vec::new(),
            assignment_keys: Vec::new(),
            parameters: None,
            bindings: Bindings::new(),
            append_alias: true,
            auto_wildcard_strings: true,
            built: false,
            deferred: None,
        }
    }

    /// Apply compiler defaults. An empty alias is replaced with the configured default.
    pub fn with_config(mut self, config: &CompilerConfig) -> Self {
        self.append_alias = config.append_alias;
        self.auto_wildcard_strings = config.auto_wildcard_strings;
        if self.alias.is_empty() {
            self.alias = config.default_alias.clone();
        }
        self
    }

    /// Set (or replace) the root entity and its alias.
    pub fn from(mut self, root: &str, alias: &str) -> Self {
        self.root_type = Some(root.to_string());
        self.alias = alias.to_string();
        if let Some(params) = &self.parameters {
            let mut params = params.borrow_mut();
            if params.root_type().is_none() {
                params.set_root_type(root);
            }
        }
        self
    }

    /// Set the SELECT result projection.
    pub fn result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    /// Add explicit SELECT fields. Duplicates are dropped.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            push_unique(&mut self.fields, field.into());
        }
        self
    }

    /// Enable or disable alias qualification of bare field names.
    pub fn append_alias(mut self, enabled: bool) -> Self {
        self.append_alias = enabled;
        self
    }

    /// Replace the generated `select <projection>` head.
    pub fn custom_select(mut self, head: &str) -> Self {
        self.custom_select = Some(head.to_string());
        self
    }

    /// Replace the generated `<root> <alias>` source.
    pub fn custom_from(mut self, source: &str) -> Self {
        self.custom_from = Some(source.to_string());
        self
    }

    // ==================== WHERE ====================

    /// Drive the WHERE clause with `params`, replacing any previous set.
    pub fn where_params(self, params: ParameterSet) -> Self {
        self.where_shared(params.share())
    }

    /// Drive the WHERE clause with a shared parameter set.
    pub fn where_shared(mut self, params: SharedParameters) -> Self {
        if let Some(root) = &self.root_type {
            let mut set = params.borrow_mut();
            if set.root_type().is_none() {
                set.set_root_type(root.as_str());
            }
        }
        self.parameters = Some(params);
        self
    }

    /// Add `<field> <op> <placeholder>` joined with the condition's own combinator.
    pub fn where_cond(mut self, field: &str, condition: Condition) -> Self {
        self.add_condition(field, &condition, condition.combinator());
        self
    }

    /// Add a condition joined with `and`.
    pub fn and(mut self, field: &str, condition: Condition) -> Self {
        self.add_condition(field, &condition, BooleanOp::And);
        self
    }

    /// Add a condition joined with `or`.
    pub fn or(mut self, field: &str, condition: Condition) -> Self {
        self.add_condition(field, &condition, BooleanOp::Or);
        self
    }

    /// Add a raw WHERE fragment, joined with `and` when it is not the first.
    ///
    /// # Safety
    /// The text is emitted verbatim; never build it from user input.
    pub fn where_raw(mut self, fragment: &str) -> Self {
        self.push_where(fragment.to_string(), BooleanOp::And);
        self
    }

    /// Alias for [`QueryBuilder::where_raw`].
    pub fn and_raw(self, fragment: &str) -> Self {
        self.where_raw(fragment)
    }

    /// Add a raw WHERE fragment joined with `or`.
    pub fn or_raw(mut self, fragment: &str) -> Self {
        self.push_where(fragment.to_string(), BooleanOp::Or);
        self
    }

    // ==================== JOIN / ORDER / GROUP ====================

    /// Add `inner join <target>`.
    pub fn inner_join(mut self, target: &str) -> Self {
        push_unique(&mut self.joins, format!("inner join {target}"));
        self
    }

    /// Add `left join <target>`.
    pub fn left_join(mut self, target: &str) -> Self {
        push_unique(&mut self.joins, format!("left join {target}"));
        self
    }

    /// Add `right join <target>`.
    pub fn right_join(mut self, target: &str) -> Self {
        push_unique(&mut self.joins, format!("right join {target}"));
        self
    }

    /// Add an ORDER BY item, e.g. `"name DESC"`. Bare fields are alias-qualified.
    pub fn order_by(mut self, item: &str) -> Self {
        let item = self.qualify(item);
        push_unique(&mut self.orders, item);
        self
    }

    /// Add a GROUP BY item. Bare fields are alias-qualified.
    pub fn group_by(mut self, item: &str) -> Self {
        let item = self.qualify(item);
        push_unique(&mut self.group_bys, item);
        self
    }

    // ==================== SET ====================

    /// Add UPDATE assignments.
    ///
    /// Text values are inlined verbatim as the right-hand side (`p.id=p.id+1`); every other
    /// value is bound to a `newValue<field>` placeholder. May be called after a build: the
    /// next build renders the updated map. Calling this on a non-UPDATE builder is reported
    /// by `build()` as [`QueryError::WrongMode`].
    pub fn set<I, K, V>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        if self.mode != QueryMode::Update {
            self.defer(QueryError::WrongMode {
                expected: QueryMode::Update,
                actual: self.mode,
            });
            return self;
        }
        for (field, value) in assignments {
            let field = field.into();
            let value = value.into();
            match self.set_fields.iter_mut().find(|(f, _)| *f == field) {
                Some(entry) => entry.1 = value,
                None => self.set_fields.push((field, value)),
            }
        }
        self
    }

    // ==================== Parameters ====================

    /// Shared parameter set driving the WHERE clause, created on first access with the
    /// root type attached.
    pub fn parameters(&mut self) -> SharedParameters {
        match &self.parameters {
            Some(params) => Rc::clone(params),
            None => {
                let mut set = match &self.root_type {
                    Some(root) => ParameterSet::for_root(root.as_str()),
                    None => ParameterSet::new(),
                };
                set.set_auto_wildcard_strings(self.auto_wildcard_strings);
                let shared = set.share();
                self.parameters = Some(Rc::clone(&shared));
                shared
            }
        }
    }

    // ==================== Execution ====================

    /// Build the SELECT and run it through `executor`.
    pub fn fetch_all<'e, E: QueryExecutor>(
        &mut self,
        executor: &'e E,
    ) -> impl Future<Output = QueryResult<Vec<E::Row>>> + Send + use<'e, E> {
        let built = self.expect_mode(&[QueryMode::Select]).and_then(|_| self.build());
        async move { executor.find(&built?).await }
    }

    /// Build the UPDATE/DELETE and run it through `executor`, returning the affected count.
    pub fn execute<'e, E: QueryExecutor>(
        &mut self,
        executor: &'e E,
    ) -> impl Future<Output = QueryResult<u64>> + Send + use<'e, E> {
        let built = self
            .expect_mode(&[QueryMode::Update, QueryMode::Delete])
            .and_then(|_| self.build());
        async move { executor.execute(&built?).await }
    }

    // ==================== Accessors ====================

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn root_type(&self) -> Option<&str> {
        self.root_type.as_deref()
    }

    pub fn selected_fields(&self) -> &[String] {
        &self.fields
    }

    pub fn wheres(&self) -> &[String] {
        &self.wheres
    }

    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    pub fn orders(&self) -> &[String] {
        &self.orders
    }

    pub fn group_bys(&self) -> &[String] {
        &self.group_bys
    }

    /// Placeholder values bound so far.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// `true` once the parameter set has been compiled into fragments.
    pub fn is_built(&self) -> bool {
        self.built
    }

    // ==================== Internals ====================

    pub(crate) fn qualify(&self, field: &str) -> String {
        qualify(&self.alias, self.append_alias, field)
    }

    /// Render `condition` against the alias-qualified `field`. Placeholder keys come from the
    /// bare field.
    pub(crate) fn render_condition(
        &mut self,
        field: &str,
        condition: &Condition,
    ) -> QueryResult<String> {
        let alias = self.alias.as_str();
        let append = self.append_alias;
        condition.render_with(field, &mut self.bindings, &|property| {
            qualify(alias, append, property)
        })
    }

    fn add_condition(&mut self, field: &str, condition: &Condition, op: BooleanOp) {
        match self.render_condition(field, condition) {
            Ok(fragment) => self.push_where(fragment, op),
            Err(err) => self.defer(err),
        }
    }

    /// Append a WHERE fragment: identical fragments are dropped, and every fragment after the
    /// first is prefixed with `op`.
    pub(crate) fn push_where(&mut self, fragment: String, op: BooleanOp) {
        if fragment.is_empty() || self.wheres.contains(&fragment) {
            return;
        }
        let fragment = if self.wheres.is_empty() {
            fragment
        } else {
            format!("{} {fragment}", op.keyword())
        };
        push_unique(&mut self.wheres, fragment);
    }

    pub(crate) fn defer(&mut self, err: QueryError) {
        if self.deferred.is_none() {
            self.deferred = Some(err);
        }
    }

    pub(crate) fn expect_mode(&self, allowed: &[QueryMode]) -> QueryResult<()> {
        if allowed.contains(&self.mode) {
            return Ok(());
        }
        Err(QueryError::WrongMode {
            expected: allowed.first().copied().unwrap_or(self.mode),
            actual: self.mode,
        })
    }
}

/// Qualify `field` with `alias` unless it already references the alias, starts with `(`,
/// or qualification is disabled.
pub(crate) fn qualify(alias: &str, append: bool, field: &str) -> String {
    if !append || alias.is_empty() || field.starts_with('(') || references_alias(field, alias) {
        return field.to_string();
    }
    format!("{alias}.{field}")
}

/// `true` when `field` contains `<alias>.` not preceded by an identifier character.
fn references_alias(field: &str, alias: &str) -> bool {
    let needle = format!("{alias}.");
    field.match_indices(&needle).any(|(idx, _)| {
        field[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}

pub(crate) fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}
