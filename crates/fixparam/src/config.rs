//! # Configuration
//!
//! Settings are managed by [`confique`], layered in priority order:
//!
//! 1. **Environment variables**: `FIXPARAM_DEFAULT_VALIDATOR`.
//! 2. **Config file**: a TOML file passed to [`FixparamConfig::load`].
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `default_validator` | `"default"` | Validator key for [`Parameter::builder_from`] |
//! | `units` | `[]` | Extra units for [`UnitTable::standard_with`] |
//!
//! ```toml
//! default_validator = "float"
//!
//! [[units]]
//! symbol = "AU"
//! definition = "1.495978707e11 m"
//! ```
//!
//! [`Parameter::builder_from`]: crate::Parameter::builder_from
//! [`UnitTable::standard_with`]: crate::units::UnitTable::standard_with

use crate::error::Result;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A unit defined in configuration, in terms of units already known.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct UnitDef {
    pub symbol: String,
    /// Scale and unit expression, e.g. `"6.957e8 m"`.
    pub definition: String,
    /// Whether SI prefixes apply (`kAU` and so on).
    #[serde(default)]
    pub prefixable: bool,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FixparamConfig {
    /// Validator key used when a parameter is built from configuration.
    #[config(default = "default", env = "FIXPARAM_DEFAULT_VALIDATOR")]
    pub default_validator: String,

    /// Units added on top of the standard table.
    #[config(default = [])]
    pub units: Vec<UnitDef>,
}

impl Default for FixparamConfig {
    fn default() -> Self {
        Self {
            default_validator: crate::validators::DEFAULT_KEY.to_string(),
            units: Vec::new(),
        }
    }
}

impl FixparamConfig {
    /// Load from the environment and, if given, a TOML file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        let config = builder.load()?;
        tracing::debug!(
            default_validator = %config.default_validator,
            units = config.units.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// A commented sample config file.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FixparamConfig::default();
        assert_eq!(config.default_validator, "default");
        assert!(config.units.is_empty());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = FixparamConfig {
            default_validator: "float".into(),
            units: vec![UnitDef {
                symbol: "AU".into(),
                definition: "1.495978707e11 m".into(),
                prefixable: false,
            }],
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: FixparamConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_prefixable_defaults_to_false() {
        let def: UnitDef = toml::from_str("symbol = \"Rsun\"\ndefinition = \"6.957e8 m\"").unwrap();
        assert!(!def.prefixable);
    }

    #[test]
    fn test_template_lists_settings() {
        let template = FixparamConfig::template();
        assert!(template.contains("default_validator"));
        assert!(template.contains("units"));
    }
}
