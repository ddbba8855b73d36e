//! SQL fragments with bound parameters.
//!
//! Fragments are always written with `%s` placeholders. The final statement
//! is converted to the configured [`ParamStyle`] once, in
//! [`CompiledStatement::render`].

use crate::config::ParamStyle;
use crate::types::SqlValue;

/// Placeholder used while a statement is being assembled.
pub const PLACEHOLDER: &str = "%s";

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlValue>,
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Adds a parameter and returns its placeholder.
    pub fn add_param(&mut self, param: SqlValue) -> &'static str {
        self.params.push(param);
        PLACEHOLDER
    }

    /// Combines with another fragment using AND.
    pub fn and(mut self, other: SqlFragment) -> Self {
        if !self.sql.is_empty() && !other.sql.is_empty() {
            self.sql = format!("{} AND {}", self.sql, other.sql);
        } else if !other.sql.is_empty() {
            self.sql = other.sql;
        }
        self.params.extend(other.params);
        self
    }

    /// Wraps the fragment in `NOT (...)`.
    pub fn negate(self) -> Self {
        Self {
            sql: format!("NOT ({})", self.sql),
            params: self.params,
        }
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Returns `n` comma-separated placeholders.
pub fn placeholders(n: usize) -> String {
    vec![PLACEHOLDER; n].join(", ")
}

/// Doubles `%` so inlined text survives format-style parameter substitution.
pub fn escape_percent(text: &str) -> String {
    text.replace('%', "%%")
}

/// A compiled statement ready for an executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledStatement {
    /// Final SQL text.
    pub sql: String,
    /// Parameters, in placeholder order.
    pub params: Vec<SqlValue>,
}

impl CompiledStatement {
    /// The empty statement. Executing it is a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if there is nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Converts `%s` placeholders to the requested style.
    pub(crate) fn render(mut self, style: ParamStyle) -> Self {
        if style == ParamStyle::Qmark {
            self.sql = to_qmark(&self.sql);
        }
        self
    }
}

impl From<SqlFragment> for CompiledStatement {
    fn from(fragment: SqlFragment) -> Self {
        Self {
            sql: fragment.sql,
            params: fragment.params,
        }
    }
}

fn to_qmark(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                out.push('?');
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_fragment() {
        let mut frag = SqlFragment::new("attr_uint = ");
        let p = frag.add_param(SqlValue::Integer(1));
        frag.sql.push_str(p);
        assert_eq!(frag.sql, "attr_uint = %s");
        assert_eq!(frag.params, vec![SqlValue::Integer(1)]);
    }

    #[test]
    fn test_fragment_and() {
        let a = SqlFragment::with_params("a > %s", vec![SqlValue::Integer(1)]);
        let b = SqlFragment::with_params("b < %s", vec![SqlValue::Integer(2)]);
        let c = a.and(b);
        assert_eq!(c.sql, "a > %s AND b < %s");
        assert_eq!(c.params.len(), 2);

        let empty = SqlFragment::default().and(SqlFragment::new("x = 1"));
        assert_eq!(empty.sql, "x = 1");
    }

    #[test]
    fn test_fragment_negate() {
        let frag = SqlFragment::new("IN(attr_multi, %s)").negate();
        assert_eq!(frag.sql, "NOT (IN(attr_multi, %s))");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(3), "%s, %s, %s");
        assert_eq!(placeholders(0), "");
    }

    #[test]
    fn test_render_qmark() {
        let stmt = CompiledStatement {
            sql: "SELECT * FROM t WHERE MATCH('100%% cotton') AND a = %s".to_string(),
            params: vec![SqlValue::Integer(1)],
        };
        let rendered = stmt.clone().render(ParamStyle::Qmark);
        assert_eq!(
            rendered.sql,
            "SELECT * FROM t WHERE MATCH('100% cotton') AND a = ?"
        );
        let same = stmt.clone().render(ParamStyle::Format);
        assert_eq!(same, stmt);
    }
}
