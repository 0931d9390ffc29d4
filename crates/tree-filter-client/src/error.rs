//! Client error types

use thiserror::Error;
use tree_filter_types::CodecError;

/// Failure to build a [`crate::ClientConfig`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration payload script '#{0}' not found")]
    MissingPayload(&'static str),

    #[error("invalid configuration payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Why one mount attempt stopped. The native widget stays visible in every
/// case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MountSkip {
    #[error("no template for taxonomy")]
    NoTemplate,

    #[error("no matching native widget in sidebar")]
    NoNativeWidget,

    #[error("native widget offers no options")]
    NoAllowedOptions,

    #[error("tree could not be inserted")]
    TreeNotInserted,

    #[error("no tree root matches the native options")]
    NoMatchingRoots,
}
