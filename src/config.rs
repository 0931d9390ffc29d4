//! Tree filter configuration
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no file
//! at all) yields a working configuration for Tainacan-style `tnc_tax_*`
//! taxonomies.
//!
//! ```yaml
//! taxonomy_prefix: tnc_tax_
//! clause_namespace: taxquery
//! assets:
//!   dir: /var/www/plugin
//!   base_url: /wp-content/plugins/tree-filter/
//! ```

use crate::error::{Result, TreeFilterError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tree_filter_types::{ClauseCodec, DEFAULT_CLAUSE_NAMESPACE};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "TREE_FILTER_CONFIG";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeFilterConfig {
    /// Only taxonomies whose identifier starts with this are rendered.
    #[serde(default = "default_taxonomy_prefix")]
    pub taxonomy_prefix: String,
    /// Query-string namespace of the clause groups.
    #[serde(default = "default_clause_namespace")]
    pub clause_namespace: String,
    #[serde(default)]
    pub assets: AssetConfig,
}

/// Where the stylesheet and client script live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directory holding the asset files (used for version stamps).
    #[serde(default = "default_asset_dir")]
    pub dir: PathBuf,
    /// Public URL prefix the file names are appended to.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_stylesheet")]
    pub stylesheet: String,
    #[serde(default = "default_script")]
    pub script: String,
    /// Version used when an asset file cannot be stat'ed.
    #[serde(default = "default_fallback_version")]
    pub fallback_version: String,
}

fn default_taxonomy_prefix() -> String {
    "tnc_tax_".to_string()
}

fn default_clause_namespace() -> String {
    DEFAULT_CLAUSE_NAMESPACE.to_string()
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_stylesheet() -> String {
    "tree.css".to_string()
}

fn default_script() -> String {
    "tree.js".to_string()
}

fn default_fallback_version() -> String {
    "1.2".to_string()
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: default_asset_dir(),
            base_url: String::new(),
            stylesheet: default_stylesheet(),
            script: default_script(),
            fallback_version: default_fallback_version(),
        }
    }
}

impl Default for TreeFilterConfig {
    fn default() -> Self {
        Self {
            taxonomy_prefix: default_taxonomy_prefix(),
            clause_namespace: default_clause_namespace(),
            assets: AssetConfig::default(),
        }
    }
}

impl TreeFilterConfig {
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| TreeFilterError::Yaml {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| TreeFilterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml, path)
    }

    /// Load from [`CONFIG_ENV_VAR`] when set, defaults otherwise.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                tracing::debug!(path = ?path, "loading tree filter config");
                Self::from_file(PathBuf::from(path))
            }
            None => Ok(Self::default()),
        }
    }

    /// Codec for the configured namespace.
    pub fn codec(&self) -> Result<ClauseCodec> {
        Ok(ClauseCodec::new(self.clause_namespace.as_str())?)
    }
}
