//! Values of the trailing OPTION clause.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::SqlValue;

/// The value of one OPTION.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Integer such as `max_matches=1000`.
    Integer(i64),
    /// Float such as `cutoff` ratios.
    Float(f64),
    /// Bare word or expression such as `ranker=bm25`.
    Text(String),
    /// Named weights such as `field_weights=(title=3,body=1)`.
    Weights(Vec<(String, i64)>),
}

impl OptionValue {
    /// Builds a weights map, keeping the given order.
    pub fn weights<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        OptionValue::Weights(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The value as a bound parameter.
    pub fn to_param(&self) -> SqlValue {
        match self {
            OptionValue::Integer(i) => SqlValue::Integer(*i),
            OptionValue::Float(f) => SqlValue::Float(*f),
            OptionValue::Text(s) => SqlValue::String(s.clone()),
            OptionValue::Weights(_) => SqlValue::String(self.to_string()),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Integer(i) => write!(f, "{}", i),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::Weights(pairs) => {
                let body = pairs
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "({})", body)
            }
        }
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Integer(i)
    }
}

impl From<i32> for OptionValue {
    fn from(i: i32) -> Self {
        OptionValue::Integer(i64::from(i))
    }
}

impl From<f64> for OptionValue {
    fn from(f: f64) -> Self {
        OptionValue::Float(f)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

/// Options keyed by name. Iteration is sorted by name.
pub type QueryOptions = BTreeMap<String, OptionValue>;
