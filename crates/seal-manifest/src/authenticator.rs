use std::path::Path;

use chrono::Utc;
use seal_crypto::HashKind;
use seal_stream::{OpenOptions, Stream, StreamError, StreamResult, STANDARD_REFERENCE};
use tracing::{debug, info, warn};

use crate::compute::{digest_stream, ContentDigest};
use crate::config::DigestConfig;
use crate::error::{ManifestError, ManifestResult};
use crate::parser::ManifestReader;
use crate::record::{ParsedRecord, Unverifiable};
use crate::report::{Discrepancy, RunSummary, Warning};

/// Result of checking one manifest record against its content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch(Discrepancy),
    /// The record carries no digest that can be checked.
    Unverifiable(Unverifiable),
    /// The content could not be opened or read.
    Unreadable(String),
}

/// Re-digests the content named by manifest records and reports changes.
#[derive(Clone, Debug, Default)]
pub struct Authenticator {
    config: DigestConfig,
}

impl Authenticator {
    pub fn new(config: DigestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Manifest paths are taken literally: `|command` and `fd:N` never
    /// reach the shell or the descriptor table. Only `-` keeps its meaning.
    fn digest_content(&self, reference: &str, kind: HashKind) -> StreamResult<ContentDigest> {
        let options = self.config.content_options();
        let mut stream = if reference == STANDARD_REFERENCE {
            Stream::open(reference, &options)?
        } else {
            Stream::open_path(Path::new(reference), &options)?
        };
        let digest = digest_stream(&mut stream, kind, self.config.chunk_size)?;
        stream.close()?;
        Ok(digest)
    }

    /// Check one record. The content is digested with the record's own
    /// algorithm.
    pub fn verify_record(&self, record: &ParsedRecord) -> Verification {
        let expected = match record.expected_digest(self.config.hash) {
            Ok(digest) => digest,
            Err(reason) => return Verification::Unverifiable(reason),
        };
        let computed = match self.digest_content(&record.path, expected.kind()) {
            Ok(content) => content.digest,
            Err(e) => return Verification::Unreadable(e.to_string()),
        };
        if computed == expected {
            Verification::Match
        } else {
            Verification::Mismatch(Discrepancy::new(record, computed, Utc::now()))
        }
    }

    /// Authenticate every record of every manifest, writing discrepancies
    /// to the report at `report`.
    pub fn authenticate<S: AsRef<str>>(
        &self,
        manifests: &[S],
        report: &str,
    ) -> ManifestResult<RunSummary> {
        if manifests.is_empty() {
            return Err(ManifestError::NoManifest {
                report: report.to_string(),
            });
        }
        let destination = |source: StreamError| ManifestError::Destination {
            reference: report.to_string(),
            source,
        };
        let mut report_stream =
            Stream::open(report, &OpenOptions::write().with_detect_format(true))
                .map_err(destination)?;

        let mut summary = RunSummary::default();
        for manifest in manifests {
            let manifest = manifest.as_ref();
            let unreadable = |source: StreamError| ManifestError::Source {
                reference: manifest.to_string(),
                source,
            };
            let mut stream = Stream::open(manifest, &OpenOptions::read().with_detect_format(true))
                .map_err(unreadable)?;
            summary.merge(self.authenticate_stream(&mut stream, &mut report_stream)?);
            stream.close().map_err(unreadable)?;
        }

        report_stream.close().map_err(destination)?;
        info!(
            report,
            verified = summary.verified,
            discrepancies = summary.discrepancies,
            warnings = summary.warnings.len(),
            "authentication finished"
        );
        Ok(summary)
    }

    /// Authenticate the records of one open manifest stream.
    pub fn authenticate_stream(
        &self,
        manifest: &mut Stream,
        report: &mut Stream,
    ) -> ManifestResult<RunSummary> {
        let manifest_ref = manifest.reference().to_string();
        let report_ref = report.reference().to_string();
        let mut summary = RunSummary::default();
        let mut reader = ManifestReader::new(manifest);

        for record in reader.by_ref() {
            let record = record.map_err(|source| ManifestError::Source {
                reference: manifest_ref.clone(),
                source,
            })?;
            match self.verify_record(&record) {
                Verification::Match => {
                    debug!(path = %record.path, "content authenticated");
                    summary.verified += 1;
                }
                Verification::Mismatch(discrepancy) => {
                    warn!(
                        path = %record.path,
                        computed = %discrepancy.computed,
                        "content does not match its recorded digest"
                    );
                    report
                        .write_str(&discrepancy.render())
                        .map_err(|source| ManifestError::Destination {
                            reference: report_ref.clone(),
                            source,
                        })?;
                    summary.discrepancies += 1;
                }
                Verification::Unverifiable(reason) => {
                    warn!(path = %record.path, %reason, "record cannot be verified");
                    summary.warn(Warning::new(&record.path, reason));
                }
                Verification::Unreadable(message) => {
                    warn!(path = %record.path, error = %message, "content unreadable");
                    summary.warn(Warning::new(&record.path, message));
                }
            }
        }
        if reader.skipped() > 0 {
            debug!(
                manifest = %manifest_ref,
                skipped = reader.skipped(),
                "records without a path skipped"
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::Recorder;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, data: &[u8]) -> String {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn manifest_for(contents: &[&str]) -> Vec<u8> {
        let mut manifest = Stream::memory();
        Recorder::default().record_to(contents, &mut manifest).unwrap();
        manifest.into_bytes().unwrap()
    }

    fn authenticate(manifest: Vec<u8>) -> (RunSummary, String) {
        let mut source = Stream::from_bytes(manifest);
        let mut report = Stream::memory();
        let summary = Authenticator::default()
            .authenticate_stream(&mut source, &mut report)
            .unwrap();
        (summary, String::from_utf8(report.into_bytes().unwrap()).unwrap())
    }

    #[test]
    fn unchanged_then_mutated_content() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "hello.txt", b"hello");
        let manifest = manifest_for(&[path.as_str()]);
        let text = String::from_utf8(manifest.clone()).unwrap();
        assert!(text.contains(
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        ));

        let (summary, report) = authenticate(manifest.clone());
        assert_eq!(summary.verified, 1);
        assert_eq!(summary.discrepancies, 0);
        assert!(report.is_empty());

        std::fs::write(&path, b"hellp").unwrap();
        let (summary, report) = authenticate(manifest);
        assert_eq!(summary.verified, 0);
        assert_eq!(summary.discrepancies, 1);
        assert_eq!(report.matches("Path: ").count(), 1);
        assert!(report.starts_with(&format!("Path: {path}\n")));
        assert!(report.contains(&HashKind::Sha256.hash(b"hellp").to_hex()));
        assert!(!summary.succeeded(false));
    }

    #[test]
    fn record_algorithm_wins_over_config() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.txt", b"abc");
        let mut manifest = Stream::memory();
        Recorder::new(DigestConfig {
            hash: HashKind::Sha224,
            ..DigestConfig::default()
        })
        .record_to(&[&path], &mut manifest)
        .unwrap();

        let (summary, _) = authenticate(manifest.into_bytes().unwrap());
        assert_eq!(summary.verified, 1);
    }

    #[test]
    fn unverifiable_and_unreadable_are_warnings() {
        let dir = TempDir::new().unwrap();
        let present = write(dir.path(), "present.txt", b"x");
        let gone = dir.path().join("gone.txt").to_string_lossy().into_owned();
        let manifest = format!(
            "<rdf:RDF>\
             <digest:Content rdf:about=\"{present}\"><digest:md5>00</digest:md5></digest:Content>\
             <digest:Content rdf:about=\"{gone}\"><digest:sha256>{}</digest:sha256></digest:Content>\
             </rdf:RDF>",
            "00".repeat(32)
        );
        let (summary, report) = authenticate(manifest.into_bytes());
        assert_eq!(summary.discrepancies, 0);
        assert_eq!(summary.warnings.len(), 2);
        assert_eq!(summary.warnings[0].reference, present);
        assert_eq!(summary.warnings[1].reference, gone);
        assert!(report.is_empty());
        assert!(summary.succeeded(false));
        assert!(!summary.succeeded(true));
    }

    #[test]
    fn manifest_paths_are_not_commands() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("marker");
        let manifest = format!(
            "<digest:Content rdf:about=\"|touch {}\"><digest:sha256>{}</digest:sha256></digest:Content>\
             <digest:Content rdf:about=\"fd:0\"><digest:sha256>{}</digest:sha256></digest:Content>",
            marker.display(),
            "00".repeat(32),
            "00".repeat(32)
        );
        let (summary, report) = authenticate(manifest.into_bytes());
        assert!(!marker.exists());
        assert_eq!(summary.discrepancies, 0);
        assert_eq!(summary.warnings.len(), 2);
        assert!(summary.warnings[0].reference.starts_with("|touch"));
        assert_eq!(summary.warnings[1].reference, "fd:0");
        assert!(report.is_empty());
    }

    #[test]
    fn missing_manifest_list() {
        let err = Authenticator::default()
            .authenticate::<&str>(&[], "report.txt")
            .unwrap_err();
        assert!(matches!(err, ManifestError::NoManifest { .. }));
    }

    #[test]
    fn unreadable_manifest_is_fatal() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("report.txt");
        let missing = dir.path().join("missing.rdf");
        let err = Authenticator::default()
            .authenticate(&[missing.to_string_lossy()], &report.to_string_lossy())
            .unwrap_err();
        assert!(matches!(err, ManifestError::Source { .. }));
    }

    #[test]
    fn compressed_manifest_roundtrip() {
        let dir = TempDir::new().unwrap();
        let content = write(dir.path(), "data.bin", &[7u8; 1000]);
        let manifest = dir.path().join("manifest.rdf.gz").to_string_lossy().into_owned();
        let report = dir.path().join("report.txt").to_string_lossy().into_owned();

        let recorded = Recorder::default().record(&[&content], &manifest).unwrap();
        assert_eq!(recorded.recorded, 1);
        let raw = std::fs::read(&manifest).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let summary = Authenticator::default()
            .authenticate(&[&manifest], &report)
            .unwrap();
        assert_eq!(summary.verified, 1);
        assert!(std::fs::read_to_string(&report).unwrap().is_empty());
    }
}
