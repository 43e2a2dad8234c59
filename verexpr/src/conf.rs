//! Evaluator configuration.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```rust
//! # use verexpr::conf::EvaluatorConfig;
//! let config = EvaluatorConfig::from_toml_str("indent = 4").unwrap();
//! assert_eq!(config.indent, 4);
//! assert!(config.catch_panics);
//! assert_eq!(EvaluatorConfig::from_toml_str("").unwrap(), EvaluatorConfig::default());
//! ```
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluatorConfig {
    /// Turn panics raised by native callables into [`EvaluationFault::Panic`](crate::EvaluationFault::Panic).
    pub catch_panics: bool,
    /// Spaces per nesting level when rendering a trace.
    pub indent: usize,
    /// Rendered values longer than this many characters are elided.
    pub max_value_width: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            indent: 2,
            max_value_width: 40,
        }
    }
}

impl EvaluatorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(EvaluatorConfig::from_toml_str("colour = true").is_err());
        assert!(EvaluatorConfig::from_toml_str("indent = \"wide\"").is_err());
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let config = EvaluatorConfig::from_toml_str("catch_panics = false").unwrap();
        assert!(!config.catch_panics);
        assert_eq!(config.indent, 2);
        assert_eq!(config.max_value_width, 40);
    }
}
