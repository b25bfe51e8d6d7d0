// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema.
//!
//! The schema mirrors the shape of a gateway deployment: a list of register
//! collections (one per device), each with its communication settings, hint
//! configuration, and registers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use gep_core::codec::{BooleanCodec, HexBinaryCodec, NumberCodec, RegisterCodec};
use gep_core::error::{ConfigError, ConfigResult};
use gep_core::types::{RegisterId, RegistryId};

// =============================================================================
// RegistryConfig
// =============================================================================

/// Root of a register client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// The configured register collections.
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

impl RegistryConfig {
    /// Validates the whole configuration: unique collection labels, id
    /// ranges, and positive intervals.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut labels = std::collections::HashSet::new();
        for collection in &self.collections {
            if !labels.insert(&collection.id) {
                return Err(ConfigError::validation(
                    "collections.id",
                    format!("duplicated collection id '{}'", collection.id),
                ));
            }
            collection.validate()?;
        }
        Ok(())
    }

    /// Returns the collection configuration with the given label.
    pub fn collection(&self, id: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.id == id)
    }
}

// =============================================================================
// CollectionConfig
// =============================================================================

/// Configuration of one register collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Label of the collection, unique within the configuration.
    pub id: String,

    /// Registry id of the device hosting the collection (0-15).
    pub gepid: u8,

    /// Timeout in milliseconds for operations on this collection. Values of
    /// zero or below keep the default timeout.
    #[serde(default)]
    pub timeout: Option<i64>,

    /// Interval in milliseconds between change-hint probes. Absent, zero, or
    /// negative values disable hint probing.
    #[serde(default)]
    pub hints: Option<i64>,

    /// Hint strategy (`simple`, `semi_greedy`, `greedy`; case-insensitive).
    #[serde(default)]
    pub strategy: Option<String>,

    /// The registers of the collection.
    #[serde(default)]
    pub registers: Vec<RegisterConfig>,
}

impl CollectionConfig {
    /// Returns the validated registry id.
    pub fn registry_id(&self) -> ConfigResult<RegistryId> {
        RegistryId::new(self.gepid).map_err(|_| {
            ConfigError::validation("gepid", format!("registry id {} is out of range (0-15)", self.gepid))
        })
    }

    /// Validates this collection and its registers.
    pub fn validate(&self) -> ConfigResult<()> {
        self.registry_id()?;

        if let Some(strategy) = &self.strategy {
            strategy.parse::<gep_registry::HintStrategy>()?;
        }

        let mut ids = std::collections::HashSet::new();
        for register in &self.registers {
            if !ids.insert(register.id) {
                return Err(ConfigError::validation(
                    "registers.id",
                    format!("duplicated register id {} in collection '{}'", register.id, self.id),
                ));
            }
            register.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// RegisterConfig
// =============================================================================

/// Configuration of one register.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterConfig {
    /// Identifier of the register within its collection (0-32767).
    pub id: u16,

    /// Whether local writes are rejected.
    #[serde(default, rename = "read-only")]
    pub read_only: bool,

    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,

    /// Interval between value updates: a bare number of milliseconds or a
    /// string with an `s` suffix for seconds (fractions allowed).
    #[serde(default, rename = "update-interval")]
    pub update_interval: Option<UpdateInterval>,

    /// The value codec; a plain number codec when omitted.
    #[serde(default)]
    pub codec: Option<CodecConfig>,
}

impl RegisterConfig {
    /// Returns the validated register id.
    pub fn register_id(&self) -> ConfigResult<RegisterId> {
        RegisterId::new(self.id).map_err(|_| {
            ConfigError::validation("id", format!("register id {} is out of range (0-32767)", self.id))
        })
    }

    /// Validates the register configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.register_id()?;
        if let Some(interval) = &self.update_interval {
            interval.to_duration()?;
        }
        Ok(())
    }
}

// =============================================================================
// UpdateInterval
// =============================================================================

/// An update interval written either as a bare number of milliseconds or as
/// a string with an optional `s` suffix (`"1500"`, `"2.5s"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateInterval {
    /// Milliseconds as a number.
    Millis(f64),
    /// A textual value, optionally suffixed with `s`.
    Text(String),
}

impl UpdateInterval {
    /// Converts the configured value to a duration, rounding to whole
    /// milliseconds. The result must be positive.
    pub fn to_duration(&self) -> ConfigResult<Duration> {
        let millis = match self {
            UpdateInterval::Millis(millis) => *millis,
            UpdateInterval::Text(text) => {
                let trimmed = text.trim();
                let (number, multiplier) = match trimmed.strip_suffix(['s', 'S']) {
                    Some(seconds) => (seconds.trim(), 1000.0),
                    None => (trimmed, 1.0),
                };
                let value: f64 = number.parse().map_err(|_| {
                    ConfigError::validation(
                        "update-interval",
                        format!("'{}' is not a valid interval", text),
                    )
                })?;
                value * multiplier
            }
        };

        let rounded = millis.round();
        if !rounded.is_finite() || rounded < 1.0 {
            return Err(ConfigError::validation(
                "update-interval",
                format!("interval of {} ms is not positive", millis),
            ));
        }
        Ok(Duration::from_millis(rounded as u64))
    }
}

// =============================================================================
// CodecConfig
// =============================================================================

fn default_scale() -> f64 {
    1.0
}

fn default_maxlength() -> usize {
    1024
}

fn default_spaces() -> bool {
    true
}

/// Configuration of a value codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CodecConfig {
    /// Scaled numeric codec: `local = scale * remote + shift`, rounded to
    /// `decimals` places.
    Number {
        /// Multiplicative constant.
        #[serde(default = "default_scale")]
        scale: f64,
        /// Additive constant.
        #[serde(default)]
        shift: f64,
        /// Decimal places kept (0-4).
        #[serde(default)]
        decimals: u32,
    },
    /// Boolean codec (positive remote values are `true`).
    Boolean,
    /// Binary codec rendering values as hexadecimal text.
    Binary {
        /// Minimal value length in bytes.
        #[serde(default)]
        minlength: usize,
        /// Maximal value length in bytes.
        #[serde(default = "default_maxlength")]
        maxlength: usize,
        /// Whether decoded bytes are space-separated.
        #[serde(default = "default_spaces")]
        spaces: bool,
    },
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig::Number {
            scale: default_scale(),
            shift: 0.0,
            decimals: 0,
        }
    }
}

impl CodecConfig {
    /// Builds the configured codec.
    pub fn build(&self) -> RegisterCodec {
        match self {
            CodecConfig::Number {
                scale,
                shift,
                decimals,
            } => RegisterCodec::integer(NumberCodec::new(*scale, *shift, *decimals)),
            CodecConfig::Boolean => RegisterCodec::Integer(BooleanCodec::instance()),
            CodecConfig::Binary {
                minlength,
                maxlength,
                spaces,
            } => RegisterCodec::binary(HexBinaryCodec::new(*minlength, *maxlength).with_spaces(*spaces)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use gep_core::types::ValueType;

    #[test]
    fn test_update_interval_forms() {
        let millis = UpdateInterval::Millis(1500.0);
        assert_eq!(millis.to_duration().unwrap(), Duration::from_millis(1500));

        let text = UpdateInterval::Text("1500".into());
        assert_eq!(text.to_duration().unwrap(), Duration::from_millis(1500));

        let seconds = UpdateInterval::Text("2.5s".into());
        assert_eq!(seconds.to_duration().unwrap(), Duration::from_millis(2500));

        let padded = UpdateInterval::Text(" 3 s ".into());
        assert_eq!(padded.to_duration().unwrap(), Duration::from_millis(3000));
    }

    #[test]
    fn test_update_interval_rejects_invalid() {
        assert!(UpdateInterval::Text("fast".into()).to_duration().is_err());
        assert!(UpdateInterval::Millis(0.0).to_duration().is_err());
        assert!(UpdateInterval::Millis(-5.0).to_duration().is_err());
    }

    #[test]
    fn test_codec_config_build() {
        assert_eq!(CodecConfig::default().build().value_type(), ValueType::Integer);
        assert_eq!(CodecConfig::Boolean.build().value_type(), ValueType::Bool);

        let binary = CodecConfig::Binary {
            minlength: 0,
            maxlength: 8,
            spaces: false,
        };
        assert!(binary.build().is_binary());
    }

    #[test]
    fn test_yaml_schema() {
        let yaml = r#"
collections:
  - id: boiler
    gepid: 3
    timeout: 1500
    hints: 200
    strategy: semi_greedy
    registers:
      - id: 5
        name: water-temperature
        update-interval: 2.5s
        codec: { type: number, scale: 0.1, decimals: 1 }
      - id: 9
        read-only: true
        codec: { type: binary, maxlength: 16 }
"#;
        let config: RegistryConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        let boiler = config.collection("boiler").unwrap();
        assert_eq!(boiler.gepid, 3);
        assert_eq!(boiler.timeout, Some(1500));
        assert_eq!(boiler.hints, Some(200));
        assert_eq!(boiler.registers.len(), 2);
        assert!(boiler.registers[1].read_only);
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let yaml = r#"
collections:
  - id: a
    gepid: 1
    registers:
      - id: 5
      - id: 5
"#;
        let config: RegistryConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_gepid() {
        let yaml = "collections:\n  - id: a\n    gepid: 16\n";
        let config: RegistryConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_strategy() {
        let yaml = "collections:\n  - id: a\n    gepid: 1\n    strategy: eager\n";
        let config: RegistryConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_codec_type_is_rejected() {
        let yaml = r#"
collections:
  - id: a
    gepid: 1
    registers:
      - id: 1
        codec: { type: float }
"#;
        assert!(serde_yaml::from_str::<RegistryConfig>(yaml).is_err());
    }
}
