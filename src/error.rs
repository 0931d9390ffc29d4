//! Error types for the server layer.

use std::path::PathBuf;
use thiserror::Error;
use tree_filter_types::CodecError;

/// Errors raised while loading configuration or term data.
///
/// Rendering and provider operations never return these; they degrade to
/// empty results instead.
#[derive(Debug, Error)]
pub enum TreeFilterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid clause namespace: {0}")]
    Codec(#[from] CodecError),
}

/// Failures reported by a [`TermStore`](crate::store::TermStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown taxonomy '{0}'")]
    UnknownTaxonomy(String),

    #[error("term store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, TreeFilterError>;
