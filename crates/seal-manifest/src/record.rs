use std::fmt;
use std::fs::Metadata;

use chrono::{DateTime, SecondsFormat, Utc};
use seal_crypto::{Digest, HashKind};
use serde::Serialize;

/// Placeholder for a field a manifest record did not carry.
pub const UNKNOWN: &str = "unknown";

/// One content item's identity, as written to a manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManifestRecord {
    /// The content reference as given to the recorder.
    pub path: String,
    /// Digest of the content; carries its algorithm.
    pub digest: Digest,
    /// Bytes digested.
    pub extent: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// When the record was produced.
    pub captured: DateTime<Utc>,
}

impl ManifestRecord {
    /// Build a record, taking file times from `metadata` when present.
    ///
    /// Without a birth time the creation date falls back to the
    /// modification time; without metadata both fall back to `captured`.
    pub fn new(
        path: impl Into<String>,
        digest: Digest,
        extent: u64,
        metadata: Option<&Metadata>,
        captured: DateTime<Utc>,
    ) -> Self {
        let modified = metadata
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from)
            .unwrap_or(captured);
        let created = metadata
            .and_then(|m| m.created().ok())
            .map(DateTime::<Utc>::from)
            .unwrap_or(modified);
        Self {
            path: path.into(),
            digest,
            extent,
            created,
            modified,
            captured,
        }
    }

    pub fn algorithm(&self) -> HashKind {
        self.digest.kind()
    }
}

/// Render a timestamp the way manifests and reports carry it.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A digest element read back from a manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordedDigest {
    /// Lowercased element suffix, e.g. `sha256`.
    pub mnemonic: String,
    /// The algorithm, if the mnemonic is recognized.
    pub algorithm: Option<HashKind>,
    pub hex: String,
}

/// A record read back from a manifest. Every field but the path is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedRecord {
    pub path: String,
    pub digest: Option<RecordedDigest>,
    pub timestamp: Option<String>,
    pub modify_date: Option<String>,
    pub create_date: Option<String>,
    pub extent: Option<u64>,
}

/// Why a record cannot be checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum Unverifiable {
    /// No digest element at all.
    MissingDigest,
    /// The algorithm is unknown and the digest does not fit the fallback.
    UnknownAlgorithm { mnemonic: String },
    /// The digest is not valid hex of the right length.
    MalformedDigest { algorithm: HashKind, detail: String },
}

impl fmt::Display for Unverifiable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDigest => f.write_str("no digest recorded"),
            Self::UnknownAlgorithm { mnemonic } => {
                write!(f, "unrecognized digest algorithm `{mnemonic}`")
            }
            Self::MalformedDigest { algorithm, detail } => {
                write!(f, "malformed {algorithm} digest: {detail}")
            }
        }
    }
}

impl ParsedRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// The digest this record expects the content to have.
    ///
    /// A digest under an unrecognized algorithm tag is interpreted with
    /// `fallback` when its length fits.
    pub fn expected_digest(&self, fallback: HashKind) -> Result<Digest, Unverifiable> {
        let recorded = self.digest.as_ref().ok_or(Unverifiable::MissingDigest)?;
        match recorded.algorithm {
            Some(algorithm) => Digest::from_hex(algorithm, &recorded.hex).map_err(|e| {
                Unverifiable::MalformedDigest {
                    algorithm,
                    detail: e.to_string(),
                }
            }),
            None => Digest::from_hex(fallback, &recorded.hex).map_err(|_| {
                Unverifiable::UnknownAlgorithm {
                    mnemonic: recorded.mnemonic.clone(),
                }
            }),
        }
    }

    pub fn timestamp_or_unknown(&self) -> &str {
        self.timestamp.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn modify_date_or_unknown(&self) -> &str {
        self.modify_date.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn create_date_or_unknown(&self) -> &str {
        self.create_date.as_deref().unwrap_or(UNKNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HELLO_256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn recorded(mnemonic: &str, hex: &str) -> ParsedRecord {
        ParsedRecord {
            digest: Some(RecordedDigest {
                mnemonic: mnemonic.into(),
                algorithm: HashKind::from_mnemonic(mnemonic),
                hex: hex.into(),
            }),
            ..ParsedRecord::new("hello.txt")
        }
    }

    #[test]
    fn timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_timestamp(&at), "2024-03-09T07:05:01Z");
    }

    #[test]
    fn record_without_metadata_uses_capture_time() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let r = ManifestRecord::new("-", HashKind::Sha256.hash(b""), 0, None, at);
        assert_eq!(r.created, at);
        assert_eq!(r.modified, at);
        assert_eq!(r.algorithm(), HashKind::Sha256);
    }

    #[test]
    fn expected_digest_recognized() {
        let d = recorded("sha256", HELLO_256).expected_digest(HashKind::Sha224).unwrap();
        assert_eq!(d.kind(), HashKind::Sha256);
        assert_eq!(d.to_hex(), HELLO_256);
    }

    #[test]
    fn expected_digest_missing() {
        assert_eq!(
            ParsedRecord::new("x").expected_digest(HashKind::Sha256),
            Err(Unverifiable::MissingDigest)
        );
    }

    #[test]
    fn unknown_algorithm_falls_back_when_length_fits() {
        let d = recorded("sha-2", HELLO_256).expected_digest(HashKind::Sha256).unwrap();
        assert_eq!(d.kind(), HashKind::Sha256);
        assert_eq!(
            recorded("md5", "d41d8cd98f00b204e9800998ecf8427e").expected_digest(HashKind::Sha256),
            Err(Unverifiable::UnknownAlgorithm { mnemonic: "md5".into() })
        );
    }

    #[test]
    fn wrong_length_is_malformed() {
        let err = recorded("sha224", HELLO_256)
            .expected_digest(HashKind::Sha256)
            .unwrap_err();
        assert!(matches!(
            err,
            Unverifiable::MalformedDigest { algorithm: HashKind::Sha224, .. }
        ));
    }

    #[test]
    fn missing_dates_render_unknown() {
        let r = ParsedRecord::new("x");
        assert_eq!(r.timestamp_or_unknown(), "unknown");
        assert_eq!(r.create_date_or_unknown(), "unknown");
    }
}
