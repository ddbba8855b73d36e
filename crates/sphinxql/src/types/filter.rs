//! Keyword filters and the predicate tree.

use std::fmt;

use crate::compiler::fragment::SqlFragment;
use crate::error::ValidationError;
use crate::types::Value;

/// Separator between a field name and its lookup in a filter key.
pub const LOOKUP_SEP: &str = "__";

/// Filter lookups understood by the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// `field=value`
    Exact,
    /// `field__in=[...]`
    In,
    /// `field__gt=value`
    Gt,
    /// `field__gte=value`
    Gte,
    /// `field__lt=value`
    Lt,
    /// `field__lte=value`
    Lte,
    /// `field__range=[low, high]`, inclusive.
    Range,
    /// `field__search=text`, full-text fields only.
    Search,
    /// `field__startswith=prefix`, full-text fields only.
    StartsWith,
}

impl Lookup {
    /// Parses a lookup name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "exact" => Some(Lookup::Exact),
            "in" => Some(Lookup::In),
            "gt" => Some(Lookup::Gt),
            "gte" => Some(Lookup::Gte),
            "lt" => Some(Lookup::Lt),
            "lte" => Some(Lookup::Lte),
            "range" => Some(Lookup::Range),
            "search" => Some(Lookup::Search),
            "startswith" => Some(Lookup::StartsWith),
            _ => None,
        }
    }

    /// Lookup name as written in filter keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::In => "in",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::Range => "range",
            Lookup::Search => "search",
            Lookup::StartsWith => "startswith",
        }
    }

    /// Comparison operator for `gt`/`gte`/`lt`/`lte`.
    pub fn comparison_operator(&self) -> Option<&'static str> {
        match self {
            Lookup::Gt => Some(">"),
            Lookup::Gte => Some(">="),
            Lookup::Lt => Some("<"),
            Lookup::Lte => Some("<="),
            _ => None,
        }
    }

    /// The comparison that holds exactly when this one does not.
    pub fn inverted(&self) -> Option<Lookup> {
        match self {
            Lookup::Gt => Some(Lookup::Lte),
            Lookup::Gte => Some(Lookup::Lt),
            Lookup::Lt => Some(Lookup::Gte),
            Lookup::Lte => Some(Lookup::Gt),
            _ => None,
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single keyword filter such as `attr_uint__gte=5`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// `field` or `field__lookup`.
    pub key: String,
    /// Filter value.
    pub value: Value,
    /// Whether the filter is excluded.
    pub negated: bool,
}

impl Filter {
    /// Creates a filter.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            negated: false,
        }
    }

    /// Creates an excluding filter.
    pub fn not(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            negated: true,
            ..Self::new(key, value)
        }
    }

    /// Splits the key into field name and lookup. A bare field means `exact`.
    pub fn parse_key(&self) -> Result<(&str, Lookup), ValidationError> {
        let mut parts = self.key.split(LOOKUP_SEP);
        let field = parts.next().unwrap_or_default();
        let lookup = parts.next();
        if field.is_empty() || parts.next().is_some() {
            return Err(ValidationError::MalformedFilterKey {
                key: self.key.clone(),
            });
        }
        match lookup {
            None => Ok((field, Lookup::Exact)),
            Some(name) => Lookup::parse(name)
                .map(|lookup| (field, lookup))
                .ok_or_else(|| ValidationError::UnknownLookup {
                    key: self.key.clone(),
                    lookup: name.to_string(),
                }),
        }
    }
}

/// How the children of a [`WhereNode`] are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connector {
    /// All children must hold.
    #[default]
    And,
    /// Any child may hold. Rejected by the compiler.
    Or,
}

/// A child of a [`WhereNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum WhereChild {
    /// Keyword filter.
    Filter(Filter),
    /// Raw SQL condition with `%s` placeholders.
    Raw(SqlFragment),
    /// Nested group.
    Node(WhereNode),
}

/// The predicate tree of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereNode {
    /// Connector between children.
    pub connector: Connector,
    /// Whether the whole group is negated.
    pub negated: bool,
    /// Conditions.
    pub children: Vec<WhereChild>,
}

impl WhereNode {
    /// Creates an empty AND group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an OR group.
    pub fn any(children: Vec<WhereChild>) -> Self {
        Self {
            connector: Connector::Or,
            negated: false,
            children,
        }
    }

    /// Creates a negated AND group.
    pub fn not(children: Vec<WhereChild>) -> Self {
        Self {
            connector: Connector::And,
            negated: true,
            children,
        }
    }

    /// Adds a child.
    pub fn push(&mut self, child: WhereChild) {
        self.children.push(child);
    }

    /// Returns true if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl From<Filter> for WhereChild {
    fn from(filter: Filter) -> Self {
        WhereChild::Filter(filter)
    }
}

impl From<WhereNode> for WhereChild {
    fn from(node: WhereNode) -> Self {
        WhereChild::Node(node)
    }
}
