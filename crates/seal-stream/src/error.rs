use std::io;
use std::path::PathBuf;

use crate::kind::StreamKind;

/// Errors from byte stream operations.
///
/// End of stream is never an error; it is reported through
/// [`Stream::eof`](crate::Stream::eof) and short reads.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The reference could not be opened.
    #[error("unable to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The operation is not available for this kind of stream.
    #[error("{operation} is not supported on {kind} streams")]
    Unsupported {
        kind: StreamKind,
        operation: &'static str,
    },

    /// A memory-mapped buffer cannot grow past its mapped extent.
    #[error("memory-mapped stream cannot grow beyond {extent} bytes")]
    FixedExtent { extent: u64 },

    /// Growing an in-memory buffer failed; the buffer has been detached.
    #[error("memory allocation of {requested} bytes failed")]
    Allocation { requested: usize },

    /// The in-memory buffer was detached by an earlier failure.
    #[error("stream buffer is detached")]
    Detached,

    /// The stream has already been closed.
    #[error("stream is closed")]
    Closed,

    /// A pipe subprocess exited unsuccessfully.
    #[error("command `{command}` failed: {status}")]
    Subprocess { command: String, status: String },

    /// A `fd:N` reference did not name a usable descriptor.
    #[error("invalid descriptor reference: {0}")]
    InvalidDescriptor(String),
}

/// Result alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(e) => e,
            StreamError::Open { source, .. } => source,
            StreamError::Unsupported { .. } => io::Error::new(io::ErrorKind::Unsupported, err),
            StreamError::Allocation { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err),
            other => io::Error::other(other),
        }
    }
}
