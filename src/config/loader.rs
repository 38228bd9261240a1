//! Layered configuration loading with provenance

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::cache_config::CacheConfig;
use super::merge::merge_layers;

/// Top-level table holding the cache settings
const CACHE_TABLE: &str = "cache";

/// Origin of a configuration layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Override,
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/override)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/override)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// A merged configuration and the layers it came from
#[derive(Debug, Clone, Serialize)]
pub struct LoadedConfig {
    pub config: CacheConfig,
    pub sources: Vec<ConfigSource>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Builds a [`CacheConfig`] from defaults, an optional file and overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    overrides: Option<Value>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a TOML file as the second layer. A missing file is skipped.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Apply a JSON object of the same shape as the file as the last layer.
    pub fn with_overrides(mut self, overrides: Value) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut layers = vec![CacheConfig::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = &self.file {
            if path.exists() {
                let (value, digest) = load_toml_file(path)?;
                debug!(path = %path.display(), %digest, "loaded cache config file");
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::File,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            } else {
                warn!(path = %path.display(), "cache config file not found, skipping");
            }
        }

        if let Some(overrides) = &self.overrides {
            layers.push(overrides.clone());
            sources.push(ConfigSource {
                origin: ConfigOrigin::Override,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        let config = extract_cache_config(merged)?;

        Ok(LoadedConfig { config, sources })
    }
}

/// Validate the merged layers and deserialize the `cache` table
fn extract_cache_config(merged: Value) -> Result<CacheConfig, ConfigError> {
    let Value::Object(mut root) = merged else {
        return Err(ConfigError::ValidationError(
            "configuration must be a table".to_string(),
        ));
    };

    if let Some(unknown) = root.keys().find(|key| key.as_str() != CACHE_TABLE) {
        return Err(ConfigError::ValidationError(format!(
            "unknown configuration table: {}",
            unknown
        )));
    }

    let table = root.remove(CACHE_TABLE).unwrap_or(Value::Null);
    serde_json::from_value(table)
        .map_err(|e| ConfigError::ParseError(format!("[{}]: {}", CACHE_TABLE, e)))
}

/// Read a config file as a JSON layer plus the SHA-256 of its bytes
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let contents = std::str::from_utf8(&bytes)
        .map_err(|e| ConfigError::ParseError(format!("{}: not UTF-8: {}", path.display(), e)))?;

    // The TOML deserializer drives serde_json's Value visitor directly
    let layer: Value = toml::from_str(contents)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    Ok((layer, digest))
}
