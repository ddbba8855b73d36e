//! Ordering and grouping modifiers.

use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "ASC"),
            Direction::Desc => write!(f, "DESC"),
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    /// A field, resolved to its column.
    Field {
        /// Field name.
        name: String,
        /// Direction.
        direction: Direction,
    },
    /// `RAND()`. The engine rejects a direction here.
    Random,
    /// A raw expression or select alias such as `WEIGHT()`.
    Expr {
        /// SQL expression.
        sql: String,
        /// Direction.
        direction: Direction,
    },
}

impl OrderBy {
    /// Parses `field`, `-field` (descending) or `?` (random).
    pub fn parse(spec: &str) -> Self {
        if spec == "?" {
            return OrderBy::Random;
        }
        match spec.strip_prefix('-') {
            Some(name) => OrderBy::Field {
                name: name.to_string(),
                direction: Direction::Desc,
            },
            None => OrderBy::Field {
                name: spec.to_string(),
                direction: Direction::Asc,
            },
        }
    }

    /// Orders by a raw expression.
    pub fn expr(sql: impl Into<String>, direction: Direction) -> Self {
        OrderBy::Expr {
            sql: sql.into(),
            direction,
        }
    }
}

/// `GROUP [N] BY ... [WITHIN GROUP ORDER BY ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSpec {
    /// Grouping fields.
    pub columns: Vec<String>,
    /// Rows kept per group. `None` or `Some(0)` keeps one.
    pub limit: Option<u32>,
    /// Ordering inside each group.
    pub order_by: Vec<(String, Direction)>,
}

impl GroupSpec {
    /// Groups by the given fields.
    pub fn by<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns the per-group cap when one applies.
    pub fn cap(&self) -> Option<u32> {
        self.limit.filter(|n| *n > 0)
    }
}
