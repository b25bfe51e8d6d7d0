// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration file loader.
//!
//! Loads and validates a [`RegistryConfig`] from a YAML, TOML, or JSON file,
//! choosing the parser by the file extension.

use std::fs;
use std::path::Path;

use gep_core::error::{ConfigError, ConfigResult};

use crate::schema::RegistryConfig;

// =============================================================================
// Format dispatch
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Loads and validates a configuration file.
///
/// # Examples
///
/// ```rust,ignore
/// let config = gep_config::load_config("registers.yaml")?;
/// for collection in &config.collections {
///     println!("{} -> registry {}", collection.id, collection.gepid);
/// }
/// ```
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<RegistryConfig> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: RegistryConfig = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::parse(path, e.to_string()))?,
        ConfigFormat::Toml => {
            toml::from_str(&content).map_err(|e| ConfigError::parse(path, e.to_string()))?
        }
        ConfigFormat::Json => serde_json::from_str(&content)
            .map_err(|e| ConfigError::parse(path, e.to_string()))?,
    };

    config.validate()?;

    tracing::debug!(
        path = %path.display(),
        collections = config.collections.len(),
        "configuration loaded"
    );

    Ok(config)
}

// =============================================================================
// Tests
// =============================================================================
