use crate::bindings::Bindings;
use crate::qb::QueryMode;
use crate::value::Value;
use serde::Serialize;
use std::fmt;

/// Compiled query text plus the values for every placeholder it references.
///
/// This is the immutable hand-off to a [`QueryExecutor`](crate::QueryExecutor); unlike the
/// builder it is `Send` and can cross threads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltQuery {
    pub sql: String,
    pub mode: QueryMode,
    pub bindings: Bindings,
    /// Offset of the first row requested, when paginated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_result: Option<usize>,
    /// Page size, when paginated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl BuiltQuery {
    /// Value bound to placeholder `name` (without the leading `:`).
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Placeholder names referenced in the text, in order of appearance, without duplicates.
    ///
    /// Text inside single-quoted literals is skipped, so `'12:30'` is not a placeholder.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let bytes = self.sql.as_bytes();
        let mut in_literal = false;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\'' => in_literal = !in_literal,
                b':' if !in_literal => {
                    let start = i + 1;
                    let end = start
                        + bytes[start..]
                            .iter()
                            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                            .count();
                    if end > start {
                        let name = &self.sql[start..end];
                        if !names.contains(&name) {
                            names.push(name);
                        }
                    }
                    i = end;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }
        names
    }

    /// `true` when every placeholder in the text has a bound value.
    pub fn is_fully_bound(&self) -> bool {
        self.placeholders()
            .iter()
            .all(|name| self.bindings.contains_key(name))
    }
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
