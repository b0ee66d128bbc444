use std::fmt;

use serde::{Deserialize, Serialize};

/// The transport behind a [`Stream`](crate::Stream). Fixed at open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// A regular file or named pipe on disk.
    File,
    /// Standard input/output or an inherited descriptor.
    Standard,
    /// A subprocess spawned through the shell.
    Pipe,
    /// A gzip-compressed file.
    Gzip,
    /// A bzip2-compressed file.
    Bzip2,
    /// A growable in-memory buffer.
    Memory,
}

impl StreamKind {
    /// Whether arbitrary seeking is possible.
    pub fn is_seekable(&self) -> bool {
        matches!(self, Self::File | Self::Memory)
    }

    /// Whether the stream passes through a codec.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Gzip | Self::Bzip2)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::Standard => "standard",
            Self::Pipe => "pipe",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// Access mode requested at open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamMode {
    #[default]
    Read,
    /// Create or truncate.
    Write,
    /// Create or truncate, then allow both directions.
    ReadWrite,
}

impl StreamMode {
    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}
