use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use seal_crypto::Digest;
use serde::Serialize;

use crate::record::{format_timestamp, ParsedRecord, UNKNOWN};

/// A record whose content no longer matches its recorded digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub path: String,
    pub create_date: Option<String>,
    pub modify_date: Option<String>,
    /// When the recorded digest was captured.
    pub timestamp: Option<String>,
    /// Digest text as it appears in the manifest.
    pub recorded: String,
    pub computed: Digest,
    /// When the mismatch was found.
    pub detected: DateTime<Utc>,
}

impl Discrepancy {
    pub fn new(record: &ParsedRecord, computed: Digest, detected: DateTime<Utc>) -> Self {
        Self {
            path: record.path.clone(),
            create_date: record.create_date.clone(),
            modify_date: record.modify_date.clone(),
            timestamp: record.timestamp.clone(),
            recorded: record
                .digest
                .as_ref()
                .map(|d| d.hex.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            computed,
            detected,
        }
    }

    /// The report entry for this discrepancy.
    pub fn render(&self) -> String {
        let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN.to_string());
        let mut out = String::with_capacity(256);
        let _ = writeln!(out, "Path: {}", self.path);
        let _ = writeln!(out, "  create date: {}", or_unknown(&self.create_date));
        let _ = writeln!(out, "  modify date: {}", or_unknown(&self.modify_date));
        let _ = writeln!(out, "  digest ({}):", or_unknown(&self.timestamp));
        let _ = writeln!(out, "    {}", self.recorded);
        let _ = writeln!(out, "  errant digest ({}):", format_timestamp(&self.detected));
        let _ = writeln!(out, "    {}", self.computed.to_hex());
        out
    }
}

/// A per-content problem that did not stop the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub reference: String,
    pub message: String,
}

impl Warning {
    pub fn new(reference: impl Into<String>, message: impl ToString) -> Self {
        Self {
            reference: reference.into(),
            message: message.to_string(),
        }
    }
}

/// Outcome counters for one record or authenticate run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Records written to a manifest.
    pub recorded: usize,
    /// Records checked and found matching.
    pub verified: usize,
    /// Records whose content changed.
    pub discrepancies: usize,
    pub warnings: Vec<Warning>,
}

impl RunSummary {
    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Fold another run's counts into this one.
    pub fn merge(&mut self, other: RunSummary) {
        self.recorded += other.recorded;
        self.verified += other.verified;
        self.discrepancies += other.discrepancies;
        self.warnings.extend(other.warnings);
    }

    /// Whether the run counts as a success.
    ///
    /// Discrepancies always fail the run. Warnings fail it only when
    /// `regard_warnings` is set.
    pub fn succeeded(&self, regard_warnings: bool) -> bool {
        self.discrepancies == 0 && !(regard_warnings && !self.warnings.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use seal_crypto::HashKind;

    use crate::record::RecordedDigest;

    #[test]
    fn render_entry() {
        let record = ParsedRecord {
            digest: Some(RecordedDigest {
                mnemonic: "sha256".into(),
                algorithm: Some(HashKind::Sha256),
                hex: "ab".repeat(32),
            }),
            timestamp: Some("2024-01-01T00:00:00Z".into()),
            modify_date: Some("2023-12-31T00:00:00Z".into()),
            ..ParsedRecord::new("docs/a.txt")
        };
        let detected = Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap();
        let computed = HashKind::Sha256.hash(b"hello");
        let text = Discrepancy::new(&record, computed, detected).render();
        let expected = format!(
            "Path: docs/a.txt\n  create date: unknown\n  modify date: 2023-12-31T00:00:00Z\n  \
             digest (2024-01-01T00:00:00Z):\n    {}\n  errant digest (2024-02-02T10:00:00Z):\n    {}\n",
            "ab".repeat(32),
            computed.to_hex()
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn success_mapping() {
        let mut summary = RunSummary::default();
        assert!(summary.succeeded(true));

        summary.warn(Warning::new("x", "unreadable"));
        assert!(summary.succeeded(false));
        assert!(!summary.succeeded(true));

        summary.discrepancies = 1;
        assert!(!summary.succeeded(false));
    }

    #[test]
    fn merge_adds_counts() {
        let mut a = RunSummary { recorded: 2, ..RunSummary::default() };
        let mut b = RunSummary { verified: 3, discrepancies: 1, ..RunSummary::default() };
        b.warn(Warning::new("y", "missing"));
        a.merge(b);
        assert_eq!((a.recorded, a.verified, a.discrepancies), (2, 3, 1));
        assert_eq!(a.warnings.len(), 1);
    }

    #[test]
    fn summary_serializes() {
        let json = serde_json::to_value(RunSummary::default()).unwrap();
        assert_eq!(json["discrepancies"], 0);
        assert!(json["warnings"].as_array().unwrap().is_empty());
    }
}
