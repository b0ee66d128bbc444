use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{HashError, HashResult};
use crate::kind::HashKind;

/// Largest digest any supported algorithm produces.
pub const MAX_DIGEST_SIZE: usize = 32;

/// A finalized digest tagged with the algorithm that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest {
    kind: HashKind,
    bytes: [u8; MAX_DIGEST_SIZE],
}

impl Digest {
    /// Build a digest from raw bytes. Fails when the length does not match `kind`.
    pub fn from_bytes(kind: HashKind, bytes: &[u8]) -> HashResult<Self> {
        if bytes.len() != kind.digest_size() {
            return Err(HashError::InvalidLength {
                kind,
                expected: kind.digest_size(),
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; MAX_DIGEST_SIZE];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self { kind, bytes: buf })
    }

    pub(crate) fn from_array(kind: HashKind, mut bytes: [u8; MAX_DIGEST_SIZE]) -> Self {
        bytes[kind.digest_size()..].fill(0);
        Self { kind, bytes }
    }

    /// Parse a hex digest, case-insensitively.
    pub fn from_hex(kind: HashKind, s: &str) -> HashResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| HashError::InvalidHex(e.to_string()))?;
        Self::from_bytes(kind, &bytes)
    }

    /// The algorithm that produced this digest.
    pub fn kind(&self) -> HashKind {
        self.kind
    }

    /// Digest bytes, exactly `kind().digest_size()` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.kind.digest_size()]
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Whether `hex` renders this digest. Case is ignored.
    pub fn matches_hex(&self, hex: &str) -> bool {
        let hex = hex.trim();
        hex.len() == self.kind.hex_len() && hex.eq_ignore_ascii_case(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.kind, &self.to_hex()[..8])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[derive(Serialize, Deserialize)]
struct DigestRepr {
    kind: HashKind,
    hex: String,
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DigestRepr {
            kind: self.kind,
            hex: self.to_hex(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DigestRepr::deserialize(deserializer)?;
        Self::from_hex(repr.kind, &repr.hex).map_err(serde::de::Error::custom)
    }
}
