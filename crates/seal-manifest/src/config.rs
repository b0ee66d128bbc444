use std::path::Path;

use seal_crypto::HashKind;
use seal_stream::{OpenOptions, MAX_BUFFER_EXTENT};
use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, ManifestResult};

/// Bytes pulled from a content stream per hash update.
pub const DEFAULT_CHUNK_SIZE: usize = MAX_BUFFER_EXTENT as usize;

/// Largest accepted `chunk_size`.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Settings for recording and authenticating manifests.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```toml
/// hash = "sha224"
/// decompress = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DigestConfig {
    /// Algorithm for new records, and the fallback for records whose
    /// algorithm tag is not recognized.
    pub hash: HashKind,
    /// Digest decompressed content of gzip/bzip2 files.
    pub decompress: bool,
    /// Read size for content streams.
    pub chunk_size: usize,
    /// Allow memory-mapping small content files.
    pub memory_map: bool,
    /// Largest file that is memory-mapped.
    pub map_limit: u64,
    /// Treat warnings (unreadable or unverifiable content) as failure.
    pub regard_warnings: bool,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            hash: HashKind::Sha256,
            decompress: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            memory_map: true,
            map_limit: MAX_BUFFER_EXTENT,
            regard_warnings: false,
        }
    }
}

impl DigestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> ManifestResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> ManifestResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ManifestResult<()> {
        if self.chunk_size == 0 {
            return Err(ManifestError::InvalidConfig {
                field: "chunk_size",
                reason: "must be greater than zero".into(),
            });
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ManifestError::InvalidConfig {
                field: "chunk_size",
                reason: format!("must not exceed {MAX_CHUNK_SIZE} bytes"),
            });
        }
        Ok(())
    }

    /// Stream options for opening content.
    pub fn content_options(&self) -> OpenOptions {
        OpenOptions::read()
            .with_detect_format(self.decompress)
            .with_memory_map(self.memory_map)
            .with_map_limit(self.map_limit)
    }
}
