use std::path::PathBuf;

use seal_crypto::HashError;
use seal_stream::StreamError;

/// Errors that abort a manifest run.
///
/// Per-content failures are not errors at this level; they are collected
/// as warnings in the [`RunSummary`](crate::RunSummary).
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// A manifest or report destination could not be opened or written.
    #[error("cannot write {reference}: {source}")]
    Destination {
        reference: String,
        #[source]
        source: StreamError,
    },

    /// A manifest to authenticate could not be opened or read.
    #[error("cannot read manifest {reference}: {source}")]
    Source {
        reference: String,
        #[source]
        source: StreamError,
    },

    /// Authentication was requested without any manifest.
    #[error("missing a digest manifest to authenticate against {report}")]
    NoManifest { report: String },

    /// The configuration file could not be read.
    #[error("cannot read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for [`DigestConfig`](crate::DigestConfig).
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Hash selection failure.
    #[error("hash error: {0}")]
    Hash(#[from] HashError),
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;
