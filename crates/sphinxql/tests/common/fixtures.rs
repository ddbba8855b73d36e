//! Schema fixtures.

use std::sync::{Arc, Once};

use sphinxql::{
    CompiledStatement, Compiler, CompilerConfig, FieldDef, FieldKind, IndexSchema, Query,
    SphinxResult,
};

/// Index name of the test model.
pub const TABLE: &str = "testapp_testmodel";

/// A schema with one field of every kind.
pub fn test_schema() -> IndexSchema {
    IndexSchema::new(
        TABLE,
        vec![
            FieldDef::id(),
            FieldDef::new("sphinx_field", FieldKind::Text).with_default(""),
            FieldDef::new("other_field", FieldKind::Text).with_default(""),
            FieldDef::new("attr_uint", FieldKind::Integer).with_default(0),
            FieldDef::new("attr_bigint", FieldKind::BigInteger).with_default(0),
            FieldDef::new("attr_float", FieldKind::Float).with_default(0.0),
            FieldDef::new("attr_timestamp", FieldKind::Timestamp).with_default(0),
            FieldDef::new("attr_string", FieldKind::String).with_default(""),
            FieldDef::new("attr_multi", FieldKind::Multi).with_default(Vec::<i64>::new()),
            FieldDef::new("attr_multi_64", FieldKind::Multi64).with_default(Vec::<i64>::new()),
            FieldDef::new("attr_json", FieldKind::Json).with_default("{}"),
            FieldDef::new("attr_bool", FieldKind::Bool).with_default(false),
        ],
    )
}

/// Same schema, shared.
pub fn shared_schema() -> Arc<IndexSchema> {
    Arc::new(test_schema())
}

/// Compiles with the default config.
pub fn compile(query: &Query) -> SphinxResult<CompiledStatement> {
    compile_with(query, &CompilerConfig::default())
}

/// Compiles with a custom config.
pub fn compile_with(query: &Query, config: &CompilerConfig) -> SphinxResult<CompiledStatement> {
    let schema = test_schema();
    Compiler::new(&schema, config).compile(query)
}

/// Selectable columns of the test schema, as rendered by default.
pub const DEFAULT_COLUMNS: &str = "id, attr_uint, attr_bigint, attr_float, attr_timestamp, \
     attr_string, attr_multi, attr_multi_64, attr_json, attr_bool";

static TRACING: Once = Once::new();

/// Installs a test subscriber once, honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
