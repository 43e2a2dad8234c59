//! Resolver configuration.
//!
//! ```rust
//! # use vercall::conf::{CacheMode, ResolverConfig};
//! let config = ResolverConfig::from_toml_str("cache = \"disabled\"").unwrap();
//! assert_eq!(config.cache, CacheMode::Disabled);
//! assert_eq!(ResolverConfig::from_toml_str("").unwrap(), ResolverConfig::default());
//! ```
use serde::Deserialize;

use crate::error::{CallError, CallResult};

/// How resolution results are memoized.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// One concurrent map per resolver, shared by every thread using it.
    #[default]
    Shared,
    /// Resolve every call from scratch.
    Disabled,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub cache: CacheMode,
}

impl ResolverConfig {
    pub fn from_toml_str(source: &str) -> CallResult<Self> {
        toml::from_str(source).map_err(|source| CallError::ConfigParse { source })
    }
}
