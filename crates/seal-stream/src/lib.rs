//! Unified byte streams for seal.
//!
//! One read/write/seek/close contract over plain files, standard I/O,
//! inherited descriptors, shell pipes, gzip and bzip2 files, and growable
//! in-memory buffers. Small regular files are memory-mapped on open.
//!
//! # Key Types
//!
//! - [`Stream`] -- An open byte conduit over any transport
//! - [`OpenOptions`] -- Mode, format detection, and mapping policy
//! - [`MemoryBuffer`] -- Growable or memory-mapped backing storage
//! - [`SharedStream`] -- Reference-counted handle with last-holder close
//! - [`StreamKind`] / [`StreamMode`] -- Transport and access mode

pub mod detect;
pub mod error;
pub mod kind;
pub mod memory;
pub mod options;
pub mod shared;
pub mod stream;

pub use detect::Compression;
pub use error::{StreamError, StreamResult};
pub use kind::{StreamKind, StreamMode};
pub use memory::{MemoryBuffer, INITIAL_QUANTUM};
pub use options::{OpenOptions, MAX_BUFFER_EXTENT};
pub use shared::SharedStream;
pub use stream::{Stream, DESCRIPTOR_PREFIX, PIPE_PREFIX, STANDARD_REFERENCE};
