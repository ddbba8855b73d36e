//! Compiler configuration.
//!
//! # Example
//!
//! ```rust
//! use sphinxql::{CompilerConfig, ParamStyle};
//!
//! let config = CompilerConfig {
//!     param_style: ParamStyle::Qmark,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::compiler::escape::is_identifier;

/// Placeholder style of the compiled SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamStyle {
    /// `%s` placeholders. Literal `%` in inlined text is doubled.
    #[default]
    Format,
    /// `?` placeholders.
    Qmark,
}

/// Settings for [`Compiler`](crate::compiler::Compiler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// OPTION names whose values are inlined instead of bound.
    ///
    /// Never put user input in these options.
    pub safe_options: Vec<String>,

    /// Alias of the projected WHERE condition.
    pub where_result_alias: String,

    /// Alias used by `count()`.
    pub count_alias: String,

    /// Placeholder style.
    pub param_style: ParamStyle,

    /// Row limit used when a query has an offset but no limit.
    pub max_matches: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            safe_options: vec![
                "ranker".to_string(),
                "field_weights".to_string(),
                "index_weights".to_string(),
            ],
            where_result_alias: "__where_result".to_string(),
            count_alias: "__count".to_string(),
            param_style: ParamStyle::Format,
            max_matches: 1000,
        }
    }
}

impl CompilerConfig {
    /// Parses a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns true if the option value is inlined.
    pub fn is_safe_option(&self, name: &str) -> bool {
        self.safe_options.iter().any(|o| o == name)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for name in &self.safe_options {
            if !is_identifier(name) {
                errors.push(format!("Safe option '{}' is not a valid identifier", name));
            }
        }

        if !is_identifier(&self.where_result_alias) {
            errors.push("Where result alias must be a valid identifier".to_string());
        }

        if !is_identifier(&self.count_alias) {
            errors.push("Count alias must be a valid identifier".to_string());
        }

        if self.where_result_alias == self.count_alias {
            errors.push("Where result alias and count alias must differ".to_string());
        }

        if self.max_matches == 0 {
            errors.push("Max matches cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            max_matches: 20,
            ..Self::default()
        }
    }
}
