//! Hash engine for seal content digests.
//!
//! Implements the SHA-2 Merkle–Damgård construction over 32-bit words
//! (SHA-224 and SHA-256) as an incremental context: feed arbitrarily chunked
//! input through [`HashContext::update`], drain the padding once with
//! [`HashContext::finalize`], then read the digest out.
//!
//! # Key Types
//!
//! - [`HashKind`] -- Algorithm selector and mnemonic (`sha224`, `sha256`)
//! - [`HashContext`] -- In-progress digest computation
//! - [`Digest`] -- Finalized digest bytes with hex rendering
//!
//! # Contract
//!
//! A context must be finalized exactly once, and its digest is only
//! meaningful after that. Use [`HashContext::finish`] to have ownership
//! enforce this.

pub mod context;
pub mod digest;
pub mod error;
pub mod kind;

pub use context::{HashContext, BLOCK_SIZE};
pub use digest::{Digest, MAX_DIGEST_SIZE};
pub use error::{HashError, HashResult};
pub use kind::HashKind;
