use chrono::Utc;
use seal_stream::{OpenOptions, Stream, StreamError, StreamResult};
use tracing::{debug, info, warn};

use crate::compute::{digest_stream, ContentDigest};
use crate::config::DigestConfig;
use crate::error::{ManifestError, ManifestResult};
use crate::rdf::ManifestWriter;
use crate::record::ManifestRecord;
use crate::report::{RunSummary, Warning};

/// Computes content digests and writes them to a manifest.
///
/// Each content reference is handled on its own: one that cannot be opened
/// or read becomes a warning and the rest are still recorded. Failing to
/// open, write, or close the manifest itself aborts the run.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    config: DigestConfig,
}

impl Recorder {
    pub fn new(config: DigestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Open `reference` and digest all of it.
    pub fn digest_content(&self, reference: &str) -> StreamResult<ContentDigest> {
        let mut stream = Stream::open(reference, &self.config.content_options())?;
        let digest = digest_stream(&mut stream, self.config.hash, self.config.chunk_size)?;
        stream.close()?;
        Ok(digest)
    }

    /// Open, digest, and describe one content item.
    pub fn record_content(&self, reference: &str) -> StreamResult<ManifestRecord> {
        let mut stream = Stream::open(reference, &self.config.content_options())?;
        let content = digest_stream(&mut stream, self.config.hash, self.config.chunk_size)?;
        let metadata = stream.metadata().cloned();
        stream.close()?;
        Ok(ManifestRecord::new(
            reference,
            content.digest,
            content.extent,
            metadata.as_ref(),
            Utc::now(),
        ))
    }

    /// Record `contents` into the manifest at `manifest`.
    ///
    /// A compression suffix on the manifest reference compresses it.
    pub fn record<S: AsRef<str>>(
        &self,
        contents: &[S],
        manifest: &str,
    ) -> ManifestResult<RunSummary> {
        let options = OpenOptions::write().with_detect_format(true);
        let mut stream =
            Stream::open(manifest, &options).map_err(|source| ManifestError::Destination {
                reference: manifest.to_string(),
                source,
            })?;
        let summary = self.record_to(contents, &mut stream)?;
        stream.close().map_err(|source| ManifestError::Destination {
            reference: manifest.to_string(),
            source,
        })?;
        Ok(summary)
    }

    /// Record `contents` into an already open manifest stream.
    pub fn record_to<S: AsRef<str>>(
        &self,
        contents: &[S],
        manifest: &mut Stream,
    ) -> ManifestResult<RunSummary> {
        let destination = manifest.reference().to_string();
        let fatal = |source: StreamError| ManifestError::Destination {
            reference: destination.clone(),
            source,
        };

        let mut summary = RunSummary::default();
        let mut writer = ManifestWriter::begin(manifest).map_err(fatal)?;
        for reference in contents {
            let reference = reference.as_ref();
            match self.record_content(reference) {
                Ok(record) => {
                    debug!(
                        reference,
                        digest = %record.digest,
                        extent = record.extent,
                        "content recorded"
                    );
                    writer.write_record(&record).map_err(fatal)?;
                }
                Err(e) => {
                    warn!(reference, error = %e, "content skipped");
                    summary.warn(Warning::new(reference, e));
                }
            }
        }
        summary.recorded = writer.finish().map_err(fatal)?;
        info!(
            manifest = %destination,
            recorded = summary.recorded,
            warnings = summary.warnings.len(),
            "manifest written"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seal_crypto::HashKind;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, data: &[u8]) -> String {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn missing_content_does_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        let first = write(dir.path(), "first.txt", b"one");
        let missing = dir.path().join("missing.txt").to_string_lossy().into_owned();
        let third = write(dir.path(), "third.txt", b"three");

        let mut manifest = Stream::memory();
        let summary = Recorder::default()
            .record_to(&[&first, &missing, &third], &mut manifest)
            .unwrap();
        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].reference, missing);

        let text = String::from_utf8(manifest.into_bytes().unwrap()).unwrap();
        assert!(text.contains(&format!("rdf:about=\"{first}\"")));
        assert!(text.contains(&format!("rdf:about=\"{third}\"")));
        assert!(!text.contains("missing.txt"));
        assert!(text.ends_with("</rdf:RDF>\n"));
    }

    #[test]
    fn record_uses_configured_hash() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "hello.txt", b"hello");
        let recorder = Recorder::new(DigestConfig {
            hash: HashKind::Sha224,
            ..DigestConfig::default()
        });
        let record = recorder.record_content(&path).unwrap();
        assert_eq!(record.digest, HashKind::Sha224.hash(b"hello"));
        assert_eq!(record.extent, 5);
        assert!(record.modified <= record.captured);
    }

    #[test]
    fn decompress_digests_uncompressed_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.gz").to_string_lossy().into_owned();
        let mut out = Stream::open(&path, &OpenOptions::write().with_detect_format(true)).unwrap();
        out.write_str("hello").unwrap();
        out.close().unwrap();

        let raw = Recorder::default().digest_content(&path).unwrap();
        assert_ne!(raw.digest, HashKind::Sha256.hash(b"hello"));

        let decompressing = Recorder::new(DigestConfig {
            decompress: true,
            ..DigestConfig::default()
        });
        let inflated = decompressing.digest_content(&path).unwrap();
        assert_eq!(inflated.digest, HashKind::Sha256.hash(b"hello"));
        assert_eq!(inflated.extent, 5);
    }

    #[test]
    fn unwritable_manifest_is_fatal() {
        let dir = TempDir::new().unwrap();
        let content = write(dir.path(), "a.txt", b"a");
        let manifest = dir.path().join("no/such/dir/manifest.rdf");
        let err = Recorder::default()
            .record(&[content], &manifest.to_string_lossy())
            .unwrap_err();
        assert!(matches!(err, ManifestError::Destination { .. }));
    }

    #[test]
    fn record_writes_file() {
        let dir = TempDir::new().unwrap();
        let content = write(dir.path(), "a.txt", b"abc");
        let manifest = dir.path().join("manifest.rdf");
        let summary = Recorder::default()
            .record(&[content], &manifest.to_string_lossy())
            .unwrap();
        assert_eq!(summary.recorded, 1);
        let text = std::fs::read_to_string(&manifest).unwrap();
        assert!(text.contains(
            "<digest:sha256>ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad</digest:sha256>"
        ));
    }
}
