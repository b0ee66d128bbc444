//! Content digest manifests for seal.
//!
//! Two workflows share one manifest format, an RDF/XML document with one
//! `digest:Content` element per content item:
//!
//! - **Record**: digest each content reference and write its record. A
//!   reference that cannot be read is a warning; the rest are still recorded.
//! - **Authenticate**: read a manifest incrementally, re-digest the content
//!   each record names, and write a discrepancy entry for every mismatch.
//!
//! # Key Types
//!
//! - [`Recorder`] -- Compute-and-record workflow
//! - [`Authenticator`] -- Record-and-authenticate workflow
//! - [`ManifestWriter`] / [`ManifestReader`] -- RDF encoding and incremental parsing
//! - [`ManifestRecord`] / [`ParsedRecord`] -- A record as written and as read back
//! - [`Discrepancy`] -- A recorded digest that no longer matches its content
//! - [`RunSummary`] -- Counters and warnings for one run
//! - [`DigestConfig`] -- Hash, decompression, and buffering settings

pub mod authenticator;
pub mod compute;
pub mod config;
pub mod error;
pub mod parser;
pub mod rdf;
pub mod record;
pub mod recorder;
pub mod report;

pub use authenticator::{Authenticator, Verification};
pub use compute::{digest_stream, ContentDigest};
pub use config::{DigestConfig, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use error::{ManifestError, ManifestResult};
pub use parser::ManifestReader;
pub use rdf::ManifestWriter;
pub use record::{ManifestRecord, ParsedRecord, RecordedDigest, Unverifiable};
pub use recorder::Recorder;
pub use report::{Discrepancy, RunSummary, Warning};
