use crate::kind::StreamMode;

/// Largest regular file that is memory-mapped instead of read through a buffer.
pub const MAX_BUFFER_EXTENT: u64 = 256 * 1024;

/// How a [`Stream`](crate::Stream) should be opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenOptions {
    /// Access mode.
    pub mode: StreamMode,
    /// Route gzip/bzip2 content through a codec (magic bytes on read, suffix on write).
    pub detect_format: bool,
    /// Allow the memory-mapped fast path for small regular files.
    pub memory_map: bool,
    /// Upper bound on the size of a mapped file.
    pub map_limit: u64,
}

impl OpenOptions {
    pub fn new(mode: StreamMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Options for reading.
    pub fn read() -> Self {
        Self::new(StreamMode::Read)
    }

    /// Options for writing (create or truncate).
    pub fn write() -> Self {
        Self::new(StreamMode::Write)
    }

    pub fn with_detect_format(mut self, detect: bool) -> Self {
        self.detect_format = detect;
        self
    }

    pub fn with_memory_map(mut self, map: bool) -> Self {
        self.memory_map = map;
        self
    }

    pub fn with_map_limit(mut self, limit: u64) -> Self {
        self.map_limit = limit;
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            mode: StreamMode::Read,
            detect_format: false,
            memory_map: true,
            map_limit: MAX_BUFFER_EXTENT,
        }
    }
}
