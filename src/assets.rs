//! Stylesheet and client script references.
//!
//! Each asset is versioned by its file's modification time so browsers drop
//! stale copies after a deploy.

use crate::config::AssetConfig;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tree_filter_types::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub handle: &'static str,
    pub url: String,
    pub version: String,
}

impl AssetRef {
    /// URL including the `ver` cache-busting parameter.
    pub fn href(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}ver={}", self.url, separator, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    pub stylesheet: AssetRef,
    pub script: AssetRef,
}

impl AssetManifest {
    pub fn from_config(config: &AssetConfig) -> Self {
        let asset = |handle: &'static str, file: &str| AssetRef {
            handle,
            url: format!("{}{}", config.base_url, file),
            version: file_version(&config.dir.join(file), &config.fallback_version),
        };
        Self {
            stylesheet: asset("tnc-tree-filter-css", &config.stylesheet),
            script: asset("tnc-tree-filter-js", &config.script),
        }
    }

    pub fn stylesheet_tag(&self) -> Element {
        Element::new("link")
            .attr("rel", "stylesheet")
            .attr("id", self.stylesheet.handle)
            .attr("href", self.stylesheet.href())
    }

    pub fn script_tag(&self) -> Element {
        Element::new("script")
            .attr("id", self.script.handle)
            .attr("src", self.script.href())
    }
}

/// Modification time in Unix seconds, or `fallback` when unavailable.
fn file_version(path: &Path, fallback: &str) -> String {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok());
    match modified {
        Some(age) => age.as_secs().to_string(),
        None => {
            tracing::debug!(path = %path.display(), "asset not found, using fallback version");
            fallback.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_use_fallback_version() {
        let config = AssetConfig {
            dir: "/nonexistent-assets".into(),
            base_url: "/static/".into(),
            ..Default::default()
        };
        let manifest = AssetManifest::from_config(&config);
        assert_eq!(manifest.stylesheet.href(), "/static/tree.css?ver=1.2");
        assert_eq!(
            manifest.script_tag().to_html(),
            r#"<script id="tnc-tree-filter-js" src="/static/tree.js?ver=1.2"></script>"#
        );
    }

    #[test]
    fn test_existing_file_is_versioned_by_mtime() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tree.css"), "/* */").unwrap();
        let config = AssetConfig {
            dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let manifest = AssetManifest::from_config(&config);
        assert!(manifest.stylesheet.version.parse::<u64>().unwrap() > 0);
        assert_eq!(manifest.script.version, "1.2");
        assert!(manifest
            .stylesheet_tag()
            .to_html()
            .starts_with(r#"<link rel="stylesheet" id="tnc-tree-filter-css" href="tree.css?ver="#));
    }
}
