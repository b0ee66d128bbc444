use std::fs::File;
use std::io::{self, SeekFrom};

use memmap2::{MmapMut, MmapOptions};
use tracing::trace;

use crate::error::{StreamError, StreamResult};

/// Initial growth quantum for in-memory buffers. Doubles on every growth.
pub const INITIAL_QUANTUM: usize = 8192;

enum Storage {
    Owned(Vec<u8>),
    /// Private copy-on-write mapping; writes never reach the file.
    Mapped(MmapMut),
    Detached,
}

/// Growable in-memory backing for a [`Stream`](crate::Stream).
///
/// Maintains `length <= capacity`, and `position <= length` except after a
/// seek past the end; a write there zero-fills the gap.
/// Mapped buffers have a fixed extent and never grow.
pub struct MemoryBuffer {
    storage: Storage,
    length: usize,
    offset: usize,
    quantum: usize,
    eof: bool,
}

impl MemoryBuffer {
    /// An empty owned buffer.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Attach existing bytes. The position starts at zero.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            length: data.len(),
            storage: Storage::Owned(data),
            offset: 0,
            quantum: INITIAL_QUANTUM,
            eof: false,
        }
    }

    /// Map `file` copy-on-write.
    pub fn map(file: &File) -> io::Result<Self> {
        // SAFETY: the mapping is private, so concurrent writers to the file
        // cannot alias our writes; truncation by another process is the
        // usual caveat for any file mapping.
        let map = unsafe { MmapOptions::new().map_copy(file)? };
        Ok(Self {
            length: map.len(),
            storage: Storage::Mapped(map),
            offset: 0,
            quantum: INITIAL_QUANTUM,
            eof: false,
        })
    }

    /// Logical length in bytes.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes that can be held without growing.
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Owned(vec) => vec.capacity(),
            Storage::Mapped(map) => map.len(),
            Storage::Detached => 0,
        }
    }

    /// Current read/write position.
    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn eof(&self) -> bool {
        self.eof
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.storage, Storage::Mapped(_))
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.storage, Storage::Detached)
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(vec) => &vec[..self.length],
            Storage::Mapped(map) => &map[..self.length],
            Storage::Detached => &[],
        }
    }

    /// Take the contents, copying out of a mapping if necessary.
    pub fn into_vec(mut self) -> Vec<u8> {
        match std::mem::replace(&mut self.storage, Storage::Detached) {
            Storage::Owned(mut vec) => {
                vec.truncate(self.length);
                vec
            }
            Storage::Mapped(map) => map[..self.length].to_vec(),
            Storage::Detached => Vec::new(),
        }
    }

    /// Drop the backing storage. Subsequent I/O fails with [`StreamError::Detached`].
    pub fn detach(&mut self) {
        self.storage = Storage::Detached;
        self.length = 0;
        self.offset = 0;
    }

    /// Copy up to `buf.len()` bytes from the current position.
    ///
    /// A short read sets the end-of-stream flag.
    pub fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        if self.is_detached() {
            return Err(StreamError::Detached);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if self.offset >= self.length {
            self.eof = true;
            return Ok(0);
        }
        let n = buf.len().min(self.length - self.offset);
        buf[..n].copy_from_slice(&self.as_bytes()[self.offset..self.offset + n]);
        self.offset += n;
        if n < buf.len() {
            self.eof = true;
        }
        Ok(n)
    }

    /// Read one byte, or `None` at end of stream.
    pub fn read_byte(&mut self) -> StreamResult<Option<u8>> {
        if self.is_detached() {
            return Err(StreamError::Detached);
        }
        if self.offset >= self.length {
            self.eof = true;
            return Ok(None);
        }
        let byte = self.as_bytes()[self.offset];
        self.offset += 1;
        Ok(Some(byte))
    }

    /// Write `data` at the current position, growing if needed.
    pub fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        if self.is_detached() {
            return Err(StreamError::Detached);
        }
        if data.is_empty() {
            return Ok(0);
        }
        let end = self
            .offset
            .checked_add(data.len())
            .ok_or(StreamError::Allocation {
                requested: usize::MAX,
            })?;
        self.grow(end)?;

        let offset = self.offset;
        match &mut self.storage {
            Storage::Owned(vec) => {
                if offset > vec.len() {
                    vec.resize(offset, 0);
                }
                let overlap = end.min(vec.len());
                let split = overlap.saturating_sub(offset);
                if split > 0 {
                    vec[offset..overlap].copy_from_slice(&data[..split]);
                }
                vec.extend_from_slice(&data[split..]);
            }
            Storage::Mapped(map) => map[offset..end].copy_from_slice(data),
            Storage::Detached => return Err(StreamError::Detached),
        }
        self.offset = end;
        self.length = self.length.max(end);
        Ok(data.len())
    }

    /// Move the position. Seeking past the end is allowed.
    pub fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(d) => (self.offset as u64).checked_add_signed(d),
            SeekFrom::End(d) => (self.length as u64).checked_add_signed(d),
        };
        let target = target
            .and_then(|t| usize::try_from(t).ok())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing position")
            })?;
        self.offset = target;
        self.eof = target > self.length;
        Ok(target as u64)
    }

    /// Reserve room for `extent` bytes so writes up to it cannot fail.
    pub fn set_extent(&mut self, extent: u64) -> StreamResult<()> {
        let extent = usize::try_from(extent).map_err(|_| StreamError::Allocation {
            requested: usize::MAX,
        })?;
        match &mut self.storage {
            Storage::Detached => Err(StreamError::Detached),
            Storage::Mapped(map) if extent > map.len() => Err(StreamError::FixedExtent {
                extent: map.len() as u64,
            }),
            Storage::Mapped(_) => Ok(()),
            Storage::Owned(vec) => {
                if extent <= vec.capacity() {
                    return Ok(());
                }
                if vec.try_reserve_exact(extent - vec.len()).is_err() {
                    self.detach();
                    return Err(StreamError::Allocation { requested: extent });
                }
                trace!(extent, "memory extent reserved");
                Ok(())
            }
        }
    }

    fn grow(&mut self, end: usize) -> StreamResult<()> {
        let vec = match &mut self.storage {
            Storage::Owned(vec) => vec,
            Storage::Mapped(map) if end > map.len() => {
                return Err(StreamError::FixedExtent {
                    extent: map.len() as u64,
                })
            }
            _ => return Ok(()),
        };
        if end <= vec.capacity() {
            return Ok(());
        }
        self.quantum = self.quantum.saturating_mul(2);
        let extent = end.saturating_add(self.quantum);
        if vec.try_reserve_exact(extent - vec.len()).is_err() {
            self.detach();
            return Err(StreamError::Allocation { requested: extent });
        }
        trace!(extent, quantum = self.quantum, "memory buffer grown");
        Ok(())
    }
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBuffer")
            .field("length", &self.length)
            .field("offset", &self.offset)
            .field("capacity", &self.capacity())
            .field("mapped", &self.is_mapped())
            .field("detached", &self.is_detached())
            .finish()
    }
}
