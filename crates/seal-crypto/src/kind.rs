use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::{HashContext, BLOCK_SIZE};
use crate::digest::Digest;
use crate::error::HashError;

/// A supported hash algorithm.
///
/// Both variants share the SHA-2/32 compression function and differ only in
/// their initial accumulator and output length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    /// SHA-224: 28-byte digest.
    #[serde(alias = "sha-224")]
    Sha224,
    /// SHA-256: 32-byte digest.
    #[default]
    #[serde(alias = "sha-256")]
    Sha256,
}

impl HashKind {
    /// Every supported algorithm.
    pub const ALL: [Self; 2] = [Self::Sha224, Self::Sha256];

    /// Lowercase mnemonic used in manifests (`sha224`, `sha256`).
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
        }
    }

    /// Parse a mnemonic, ignoring ASCII case. Returns `None` when unknown.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|kind| {
            s.eq_ignore_ascii_case(kind.mnemonic())
                || s.eq_ignore_ascii_case(kind.hyphenated())
        })
    }

    /// Digest size in bytes.
    pub fn digest_size(&self) -> usize {
        match self {
            Self::Sha224 => 28,
            Self::Sha256 => 32,
        }
    }

    /// Length of the hex rendering of a digest.
    pub fn hex_len(&self) -> usize {
        self.digest_size() * 2
    }

    /// Block size in bytes.
    pub fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// One-shot digest of `data`.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut context = HashContext::new(*self);
        context.update(data);
        context.finish()
    }

    /// Published initial accumulator constants.
    pub(crate) fn initial_state(&self) -> [u32; 8] {
        match self {
            // Second 32 bits of the fractional parts of the square roots of the 9th..16th primes.
            Self::Sha224 => [
                0xc105_9ed8, 0x367c_d507, 0x3070_dd17, 0xf70e_5939,
                0xffc0_0b31, 0x6858_1511, 0x64f9_8fa7, 0xbefa_4fa4,
            ],
            // First 32 bits of the fractional parts of the square roots of the first 8 primes.
            Self::Sha256 => [
                0x6a09_e667, 0xbb67_ae85, 0x3c6e_f372, 0xa54f_f53a,
                0x510e_527f, 0x9b05_688c, 0x1f83_d9ab, 0x5be0_cd19,
            ],
        }
    }

    fn hyphenated(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha-224",
            Self::Sha256 => "sha-256",
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for HashKind {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mnemonic(s).ok_or_else(|| HashError::UnknownAlgorithm(s.to_string()))
    }
}
