//! Index schema and model metadata.
//!
//! The compiler never inspects values at runtime to decide how a column is
//! rendered. Each [`FieldDef`] gets a [`ColumnRendering`] when it is bound
//! into an [`IndexSchema`], and every later decision (selectability, MATCH
//! selector, inline MVA tuples) reads that flag.

use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::{SphinxResult, TypeError, ValidationError};
use crate::types::mva::{decode_mva, encode_mva};
use crate::types::{SqlValue, Value};

/// Storage kind of an index field.
///
/// Mirrors the `rt_field` / `rt_attr_*` kinds of a real-time index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Full-text indexed field. Searchable through MATCH, never selectable.
    Text,
    /// String attribute.
    String,
    /// 32-bit unsigned integer attribute.
    Integer,
    /// 64-bit integer attribute.
    BigInteger,
    /// Float attribute.
    Float,
    /// Boolean attribute.
    Bool,
    /// Unix timestamp attribute.
    Timestamp,
    /// Multi-value attribute of 32-bit integers.
    Multi,
    /// Multi-value attribute of 64-bit integers.
    Multi64,
    /// JSON attribute.
    Json,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::String => write!(f, "string"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::BigInteger => write!(f, "bigint"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Timestamp => write!(f, "timestamp"),
            FieldKind::Multi => write!(f, "multi"),
            FieldKind::Multi64 => write!(f, "multi64"),
            FieldKind::Json => write!(f, "json"),
        }
    }
}

impl FieldKind {
    /// Returns true for kinds the engine cannot change with UPDATE.
    pub fn is_variable_length(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::String | FieldKind::Json)
    }

    /// Returns true for multi-value attributes.
    pub fn is_multi_value(&self) -> bool {
        matches!(self, FieldKind::Multi | FieldKind::Multi64)
    }

    /// Returns the lookup dispatch class for this kind.
    pub fn class(&self) -> FieldClass {
        match self {
            FieldKind::Text => FieldClass::FullText,
            FieldKind::String => FieldClass::StringAttr,
            FieldKind::Multi | FieldKind::Multi64 => FieldClass::Multi,
            FieldKind::Json => FieldClass::Json,
            FieldKind::Integer
            | FieldKind::BigInteger
            | FieldKind::Float
            | FieldKind::Bool
            | FieldKind::Timestamp => FieldClass::Scalar,
        }
    }

    /// Returns the column rendering bound to fields of this kind.
    pub fn rendering(&self) -> ColumnRendering {
        match self.class() {
            FieldClass::FullText => ColumnRendering::FullText,
            FieldClass::Multi => ColumnRendering::MultiValue,
            _ => ColumnRendering::Attribute,
        }
    }
}

/// Lookup dispatch class. See [`crate::compiler::lookups`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldClass {
    /// Full-text field, filtered through MATCH.
    FullText,
    /// String attribute, compared with plain operators.
    StringAttr,
    /// Multi-value attribute, filtered with `IN()`, `LEAST()`, `GREATEST()`.
    Multi,
    /// Fixed-width scalar attribute.
    Scalar,
    /// JSON attribute. No lookups.
    Json,
}

/// How a field's column and values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRendering {
    /// Bare column name, values bound as placeholders.
    Attribute,
    /// Bare column name, list values inlined as `(1,2,3)`.
    MultiValue,
    /// `@column` inside MATCH. Not selectable.
    FullText,
}

impl ColumnRendering {
    /// Returns true if the column may appear in a select list.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, ColumnRendering::FullText)
    }

    /// Returns the SQL written in place of a placeholder, if the prepared
    /// value is inlined rather than bound.
    ///
    /// NULL is always literal. Multi-value columns take their list as an
    /// inline tuple, since the engine does not bind MVA parameters.
    pub fn inline_literal(&self, value: &SqlValue) -> Option<String> {
        match (self, value) {
            (_, SqlValue::Null) => Some("NULL".to_string()),
            (ColumnRendering::MultiValue, SqlValue::Multi(cell)) => Some(format!("({})", cell)),
            _ => None,
        }
    }
}

/// A field on an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name used in filters and writes.
    pub name: String,
    /// Storage column; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Storage kind.
    pub kind: FieldKind,
    /// Whether this field is the document id.
    #[serde(default)]
    pub primary_key: bool,
    /// Value used when a REPLACE row does not supply this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip, default = "default_rendering")]
    rendering: ColumnRendering,
}

fn default_rendering() -> ColumnRendering {
    ColumnRendering::Attribute
}

impl FieldDef {
    /// Creates a field of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            column: None,
            kind,
            primary_key: false,
            default: None,
            rendering: kind.rendering(),
        }
    }

    /// Creates the conventional `id` primary key.
    pub fn id() -> Self {
        Self::new("id", FieldKind::BigInteger).primary_key()
    }

    /// Sets an explicit storage column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Marks the field as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Storage column name.
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    /// Column rendering strategy bound to this field.
    pub fn rendering(&self) -> ColumnRendering {
        self.rendering
    }

    fn not_preparable(&self, value: &Value) -> TypeError {
        TypeError::NotPreparable {
            field: self.name.clone(),
            expected: self.kind,
            found: value.kind_name(),
        }
    }

    /// Converts a write value into its database-preparable form.
    pub fn prepare(&self, value: &Value) -> Result<SqlValue, TypeError> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        match self.kind {
            FieldKind::Text | FieldKind::String => match value {
                Value::Text(s) => Ok(SqlValue::String(s.clone())),
                Value::Integer(_) | Value::Float(_) => Ok(SqlValue::String(value.to_text())),
                other => Err(self.not_preparable(other)),
            },
            FieldKind::Integer | FieldKind::BigInteger => match value {
                Value::Integer(i) => Ok(SqlValue::Integer(*i)),
                Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
                Value::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(SqlValue::Integer)
                    .map_err(|_| self.not_preparable(value)),
                other => Err(self.not_preparable(other)),
            },
            FieldKind::Float => match value {
                Value::Float(f) => Ok(SqlValue::Float(*f)),
                Value::Integer(i) => Ok(SqlValue::Float(*i as f64)),
                other => Err(self.not_preparable(other)),
            },
            FieldKind::Bool => match value {
                Value::Bool(b) => Ok(SqlValue::Bool(*b)),
                Value::Integer(0) => Ok(SqlValue::Bool(false)),
                Value::Integer(1) => Ok(SqlValue::Bool(true)),
                other => Err(self.not_preparable(other)),
            },
            FieldKind::Timestamp => match value {
                // the engine keeps whole seconds only
                Value::Timestamp(ts) => Ok(SqlValue::Integer(ts.timestamp())),
                Value::Integer(i) => Ok(SqlValue::Integer(*i)),
                Value::Float(f) => Ok(SqlValue::Float(*f)),
                other => Err(self.not_preparable(other)),
            },
            FieldKind::Multi | FieldKind::Multi64 => match value {
                Value::Integer(i) => Ok(SqlValue::Multi(i.to_string())),
                Value::List(items) => {
                    let ints = items
                        .iter()
                        .map(|item| match item {
                            Value::Integer(i) => Ok(*i),
                            other => Err(self.not_preparable(other)),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(SqlValue::Multi(encode_mva(&ints)))
                }
                other => Err(self.not_preparable(other)),
            },
            FieldKind::Json => match value {
                Value::Text(s) => Ok(SqlValue::String(s.clone())),
                other => Ok(SqlValue::String(other.to_json().to_string())),
            },
        }
    }

    /// Converts a value returned by the engine into a typed [`Value`].
    pub fn decode(&self, value: &SqlValue) -> SphinxResult<Value> {
        if matches!(value, SqlValue::Null) {
            return Ok(Value::Null);
        }
        let decoded = match (self.kind, value) {
            (FieldKind::Multi | FieldKind::Multi64, SqlValue::String(s) | SqlValue::Multi(s)) => {
                let ints = decode_mva(s).ok_or_else(|| ValidationError::InvalidMultiValue {
                    field: self.name.clone(),
                    value: s.clone(),
                })?;
                Value::List(ints.into_iter().map(Value::Integer).collect())
            }
            (FieldKind::Multi | FieldKind::Multi64, SqlValue::Integer(i)) => {
                Value::List(vec![Value::Integer(*i)])
            }
            (FieldKind::Timestamp, SqlValue::Integer(secs)) => {
                let ts = DateTime::from_timestamp(*secs, 0).ok_or_else(|| {
                    TypeError::InvalidTimestamp {
                        field: self.name.clone(),
                        value: secs.to_string(),
                    }
                })?;
                Value::Timestamp(ts)
            }
            (FieldKind::Timestamp, SqlValue::Float(secs)) => {
                let ts = DateTime::from_timestamp(secs.trunc() as i64, 0).ok_or_else(|| {
                    TypeError::InvalidTimestamp {
                        field: self.name.clone(),
                        value: secs.to_string(),
                    }
                })?;
                Value::Timestamp(ts)
            }
            (FieldKind::Json, SqlValue::String(s)) => match serde_json::from_str(s) {
                Ok(json) => Value::Json(json),
                Err(_) => Value::Text(s.clone()),
            },
            (FieldKind::Bool, SqlValue::Integer(i)) => Value::Bool(*i != 0),
            (_, SqlValue::Bool(b)) => Value::Bool(*b),
            (_, SqlValue::Integer(i)) => Value::Integer(*i),
            (_, SqlValue::Float(f)) => Value::Float(*f),
            (_, SqlValue::String(s) | SqlValue::Multi(s)) => Value::Text(s.clone()),
            (_, SqlValue::Null) => Value::Null,
        };
        Ok(decoded)
    }
}

/// Metadata the compiler needs about the queried index.
pub trait ModelMeta: Send + Sync {
    /// Index (table) name.
    fn table(&self) -> &str;

    /// All fields in declaration order.
    fn fields(&self) -> &[FieldDef];

    /// The primary key field, if declared.
    fn primary_key_field(&self) -> Option<&FieldDef> {
        self.fields().iter().find(|f| f.primary_key)
    }

    /// Looks a field up by name. `pk` resolves to the primary key.
    fn field(&self, name: &str) -> Option<&FieldDef> {
        if name == "pk" {
            return self.primary_key_field();
        }
        self.fields().iter().find(|f| f.name == name)
    }

    /// Resolves a field name to its storage column.
    fn resolve_column(&self, name: &str) -> Option<&str> {
        self.field(name).map(FieldDef::column)
    }

    /// Returns true if the field is full-text indexed.
    fn is_text_field(&self, name: &str) -> bool {
        self.field(name)
            .is_some_and(|f| f.kind.class() == FieldClass::FullText)
    }

    /// Returns true if the field is a multi-value attribute.
    fn is_multivalue_field(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| f.kind.is_multi_value())
    }

    /// Looks a field up, failing with a validation error naming it.
    fn require_field(&self, name: &str) -> Result<&FieldDef, ValidationError> {
        self.field(name).ok_or_else(|| ValidationError::UnknownField {
            table: self.table().to_string(),
            field: name.to_string(),
        })
    }
}

/// Serialized form of an [`IndexSchema`].
#[derive(Debug, Clone, Deserialize)]
struct IndexSchemaDef {
    table: String,
    fields: Vec<FieldDef>,
}

impl From<IndexSchemaDef> for IndexSchema {
    fn from(def: IndexSchemaDef) -> Self {
        IndexSchema::new(def.table, def.fields)
    }
}

/// A concrete schema for one index.
///
/// Binding a field into the schema fixes its [`ColumnRendering`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IndexSchemaDef")]
pub struct IndexSchema {
    table: String,
    fields: Vec<FieldDef>,
}

impl IndexSchema {
    /// Creates a schema and binds the rendering of every field.
    pub fn new(table: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        let fields = fields
            .into_iter()
            .map(|mut f| {
                f.rendering = f.kind.rendering();
                f
            })
            .collect();
        Self {
            table: table.into(),
            fields,
        }
    }

    /// Parses a schema from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Decodes a result row into typed values.
    ///
    /// Columns that are not schema fields (aggregates, computed aliases) are
    /// returned as plain values.
    pub fn decode_row(&self, row: &crate::types::Row) -> SphinxResult<Vec<(String, Value)>> {
        row.iter()
            .map(|(column, value)| {
                let field = self.fields.iter().find(|f| f.column() == column);
                let decoded = match field {
                    Some(field) => field.decode(value)?,
                    None => FieldDef::new(column, FieldKind::String).decode(value)?,
                };
                Ok((field.map_or(column, |f| f.name.as_str()).to_string(), decoded))
            })
            .collect()
    }
}

impl ModelMeta for IndexSchema {
    fn table(&self) -> &str {
        &self.table
    }

    fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Row;

    fn schema() -> IndexSchema {
        IndexSchema::new(
            "testapp_testmodel",
            vec![
                FieldDef::id(),
                FieldDef::new("sphinx_field", FieldKind::Text),
                FieldDef::new("attr_uint", FieldKind::Integer).with_default(0),
                FieldDef::new("attr_multi", FieldKind::Multi),
                FieldDef::new("attr_ts", FieldKind::Timestamp).with_column("attr_timestamp"),
            ],
        )
    }

    #[test]
    fn test_field_lookup_and_pk_alias() {
        let s = schema();
        assert_eq!(s.field("pk").map(|f| f.name.as_str()), Some("id"));
        assert_eq!(s.resolve_column("attr_ts"), Some("attr_timestamp"));
        assert!(s.is_text_field("sphinx_field"));
        assert!(!s.is_text_field("attr_uint"));
        assert!(s.is_multivalue_field("attr_multi"));
        assert!(s.field("nope").is_none());
    }

    #[test]
    fn test_require_field_names_field() {
        let err = schema().require_field("nope").unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownField {
                table: "testapp_testmodel".to_string(),
                field: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_rendering_bound_per_kind() {
        let s = schema();
        assert_eq!(
            s.field("sphinx_field").unwrap().rendering(),
            ColumnRendering::FullText
        );
        assert_eq!(
            s.field("attr_multi").unwrap().rendering(),
            ColumnRendering::MultiValue
        );
        assert!(s.field("attr_uint").unwrap().rendering().is_selectable());
        assert!(!s.field("sphinx_field").unwrap().rendering().is_selectable());
    }

    #[test]
    fn test_inline_literal_follows_rendering() {
        let multi = SqlValue::Multi("1,2".to_string());
        assert_eq!(
            ColumnRendering::MultiValue.inline_literal(&multi),
            Some("(1,2)".to_string())
        );
        assert_eq!(ColumnRendering::Attribute.inline_literal(&multi), None);
        assert_eq!(
            ColumnRendering::Attribute.inline_literal(&SqlValue::Null),
            Some("NULL".to_string())
        );
        assert_eq!(
            ColumnRendering::MultiValue.inline_literal(&SqlValue::Integer(1)),
            None
        );
    }

    #[test]
    fn test_variable_length_kinds() {
        assert!(FieldKind::Text.is_variable_length());
        assert!(FieldKind::String.is_variable_length());
        assert!(FieldKind::Json.is_variable_length());
        assert!(!FieldKind::Integer.is_variable_length());
        assert!(!FieldKind::Multi.is_variable_length());
    }

    #[test]
    fn test_prepare_multi() {
        let field = FieldDef::new("attr_multi", FieldKind::Multi);
        let v = field.prepare(&Value::from(vec![3i64, 1, 3])).unwrap();
        assert_eq!(v, SqlValue::Multi("3,1,3".to_string()));
        assert_eq!(
            field.prepare(&Value::from(Vec::<i64>::new())).unwrap(),
            SqlValue::Multi(String::new())
        );
    }

    #[test]
    fn test_prepare_rejects_wrong_type() {
        let field = FieldDef::new("attr_multi", FieldKind::Multi);
        let err = field.prepare(&Value::from("1,2")).unwrap_err();
        assert!(matches!(err, TypeError::NotPreparable { found: "text", .. }));

        let field = FieldDef::new("attr_uint", FieldKind::Integer);
        assert!(field.prepare(&Value::from("abc")).is_err());
        assert_eq!(
            field.prepare(&Value::from("42")).unwrap(),
            SqlValue::Integer(42)
        );
    }

    #[test]
    fn test_prepare_timestamp_and_json() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let field = FieldDef::new("attr_ts", FieldKind::Timestamp);
        assert_eq!(
            field.prepare(&Value::from(ts)).unwrap(),
            SqlValue::Integer(1_700_000_000)
        );

        let field = FieldDef::new("attr_json", FieldKind::Json);
        assert_eq!(
            field
                .prepare(&Value::from(serde_json::json!({"a": 1})))
                .unwrap(),
            SqlValue::String("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn test_decode_multi() {
        let field = FieldDef::new("attr_multi", FieldKind::Multi);
        assert_eq!(
            field.decode(&SqlValue::string("1,2")).unwrap(),
            Value::from(vec![1i64, 2])
        );
        assert_eq!(
            field.decode(&SqlValue::string("")).unwrap(),
            Value::List(vec![])
        );
        assert_eq!(field.decode(&SqlValue::Null).unwrap(), Value::Null);
        assert!(field.decode(&SqlValue::string("1,a")).is_err());
    }

    #[test]
    fn test_decode_row() {
        let row = Row::from_pairs([
            ("id", SqlValue::Integer(5)),
            ("attr_timestamp", SqlValue::Integer(0)),
            ("weight", SqlValue::Integer(1500)),
        ]);
        let decoded = schema().decode_row(&row).unwrap();
        assert_eq!(decoded[0], ("id".to_string(), Value::Integer(5)));
        assert_eq!(decoded[1].0, "attr_ts");
        assert!(matches!(decoded[1].1, Value::Timestamp(_)));
        assert_eq!(decoded[2], ("weight".to_string(), Value::Integer(1500)));
    }

    #[test]
    fn test_schema_from_json_binds_rendering() {
        let s = IndexSchema::from_json(
            r#"{"table": "docs", "fields": [
                {"name": "id", "kind": "big_integer", "primary_key": true},
                {"name": "body", "kind": "text"},
                {"name": "tags", "kind": "multi", "default": []}
            ]}"#,
        )
        .unwrap();
        assert_eq!(s.table(), "docs");
        assert_eq!(
            s.field("body").unwrap().rendering(),
            ColumnRendering::FullText
        );
        assert_eq!(s.field("tags").unwrap().default, Some(Value::List(vec![])));
        assert_eq!(s.primary_key_field().unwrap().name, "id");
    }
}
