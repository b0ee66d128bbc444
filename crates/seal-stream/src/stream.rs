use std::fs::{self, File, Metadata};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use tracing::{debug, trace, warn};

use crate::detect::{detect_suffix, sniff, Compression};
use crate::error::{StreamError, StreamResult};
use crate::kind::{StreamKind, StreamMode};
use crate::memory::MemoryBuffer;
use crate::options::OpenOptions;

/// Reference that binds to standard input or output.
pub const STANDARD_REFERENCE: &str = "-";

/// Prefix of references that run a shell command.
pub const PIPE_PREFIX: char = '|';

/// Prefix of references that bind to an inherited descriptor.
pub const DESCRIPTOR_PREFIX: &str = "fd:";

enum Transport {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
    /// Unbuffered: named pipes and read-write files.
    File(File),
    Stdin(io::Stdin),
    Stdout(io::Stdout),
    #[cfg(unix)]
    Descriptor(std::mem::ManuallyDrop<File>),
    Pipe(Pipe),
    GzipReader(MultiGzDecoder<BufReader<File>>),
    GzipWriter(GzEncoder<BufWriter<File>>),
    Bzip2Reader(MultiBzDecoder<BufReader<File>>),
    Bzip2Writer(BzEncoder<BufWriter<File>>),
    Memory(MemoryBuffer),
    Closed,
}

struct Pipe {
    command: String,
    child: Child,
    stdout: Option<ChildStdout>,
    stdin: Option<ChildStdin>,
}

impl Pipe {
    fn finish(self) -> StreamResult<()> {
        let Pipe {
            command,
            mut child,
            stdout,
            stdin,
        } = self;
        // Closing our ends lets the child see EOF before we wait on it.
        drop(stdin);
        drop(stdout);
        let status = child.wait()?;
        debug!(command = %command, %status, "pipe finished");
        if status.success() {
            Ok(())
        } else {
            Err(StreamError::Subprocess {
                command,
                status: status.to_string(),
            })
        }
    }
}

/// One open byte conduit.
///
/// The transport is chosen at open from the reference and [`OpenOptions`]:
///
/// | Reference | Kind |
/// |---|---|
/// | `-` | standard input or output |
/// | `fd:N` | inherited descriptor (Unix) |
/// | `\|command` | shell subprocess |
/// | gzip/bzip2 file with detection on | codec over the file |
/// | small regular file, read mode | memory-mapped |
/// | anything else | buffered file |
///
/// Standard streams and inherited descriptors are externally owned: closing
/// the stream flushes them but never releases the descriptor. Dropping an
/// open stream closes it.
pub struct Stream {
    reference: String,
    kind: StreamKind,
    mode: StreamMode,
    transport: Transport,
    position: u64,
    eof: bool,
    exempt: bool,
    mapped: bool,
    metadata: Option<Metadata>,
    status: Option<io::ErrorKind>,
}

impl Stream {
    /// Open `reference` as described on [`Stream`].
    pub fn open(reference: &str, options: &OpenOptions) -> StreamResult<Self> {
        trace!(reference, mode = ?options.mode, "open stream");
        if reference == STANDARD_REFERENCE {
            return Self::open_standard(options.mode);
        }
        if let Some(fd) = reference.strip_prefix(DESCRIPTOR_PREFIX) {
            return Self::open_descriptor(reference, fd, options.mode);
        }
        if let Some(command) = reference.strip_prefix(PIPE_PREFIX) {
            return Self::open_pipe(command, options.mode);
        }
        Self::open_path(Path::new(reference), options)
    }

    /// Open a filesystem path. Never interprets `-`, `fd:` or `|`.
    pub fn open_path(path: &Path, options: &OpenOptions) -> StreamResult<Self> {
        let reference = path.display().to_string();
        let open_err = |source| StreamError::Open {
            path: path.to_path_buf(),
            source,
        };
        let mode = options.mode;

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if let Ok(meta) = fs::metadata(path) {
                if meta.file_type().is_fifo() {
                    let file = file_options(mode).open(path).map_err(open_err)?;
                    let mut stream =
                        Self::with_transport(reference, StreamKind::File, mode, Transport::File(file));
                    stream.metadata = Some(meta);
                    debug!(reference = %stream.reference, "opened named pipe unbuffered");
                    return Ok(stream);
                }
            }
        }

        if mode.is_writable() {
            let compression = if options.detect_format {
                detect_suffix(path)
            } else {
                None
            };
            if compression.is_some() && mode == StreamMode::ReadWrite {
                return Err(StreamError::Unsupported {
                    kind: compression_kind(compression),
                    operation: "read-write open",
                });
            }
            let file = file_options(mode).open(path).map_err(open_err)?;
            let metadata = file.metadata().ok();
            let transport = match compression {
                Some(Compression::Gzip) => Transport::GzipWriter(GzEncoder::new(
                    BufWriter::new(file),
                    flate2::Compression::default(),
                )),
                Some(Compression::Bzip2) => Transport::Bzip2Writer(BzEncoder::new(
                    BufWriter::new(file),
                    bzip2::Compression::default(),
                )),
                None if mode == StreamMode::Write => Transport::Writer(BufWriter::new(file)),
                None => Transport::File(file),
            };
            let mut stream =
                Self::with_transport(reference, compression_kind(compression), mode, transport);
            stream.metadata = metadata;
            return Ok(stream);
        }

        let mut file = File::open(path).map_err(open_err)?;
        let metadata = file.metadata().map_err(open_err)?;
        let regular = metadata.is_file();

        if options.detect_format && regular {
            if let Some(compression) = sniff(&mut file).map_err(open_err)? {
                let transport = match compression {
                    Compression::Gzip => {
                        Transport::GzipReader(MultiGzDecoder::new(BufReader::new(file)))
                    }
                    Compression::Bzip2 => {
                        Transport::Bzip2Reader(MultiBzDecoder::new(BufReader::new(file)))
                    }
                };
                let kind = compression_kind(Some(compression));
                debug!(reference = %reference, %kind, "compressed content detected");
                let mut stream = Self::with_transport(reference, kind, mode, transport);
                stream.metadata = Some(metadata);
                return Ok(stream);
            }
        }

        Self::buffered_or_mapped(reference, file, metadata, options)
    }

    /// An empty growable in-memory stream.
    pub fn memory() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// An in-memory stream over existing bytes, positioned at the start.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::with_transport(
            "memory".to_string(),
            StreamKind::Memory,
            StreamMode::ReadWrite,
            Transport::Memory(MemoryBuffer::from_vec(data)),
        )
    }

    /// Map `path` copy-on-write. Writes stay private and cannot grow the map.
    pub fn map_file(path: &Path) -> StreamResult<Self> {
        let open_err = |source| StreamError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let metadata = file.metadata().map_err(open_err)?;
        let buffer = MemoryBuffer::map(&file).map_err(open_err)?;
        let mut stream = Self::with_transport(
            path.display().to_string(),
            StreamKind::File,
            StreamMode::ReadWrite,
            Transport::Memory(buffer),
        );
        stream.mapped = true;
        stream.metadata = Some(metadata);
        Ok(stream)
    }

    /// Detach an in-memory stream and return its bytes.
    pub fn into_bytes(mut self) -> StreamResult<Vec<u8>> {
        match std::mem::replace(&mut self.transport, Transport::Closed) {
            Transport::Memory(buffer) => Ok(buffer.into_vec()),
            other => {
                self.transport = other;
                Err(unsupported(self.kind, "into_bytes"))
            }
        }
    }

    /// The reference this stream was opened with.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Whether reads come from a memory map.
    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// Whether close leaves the underlying descriptor open.
    pub fn is_exempt(&self) -> bool {
        self.exempt
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.transport, Transport::Closed)
    }

    /// End-of-stream flag, set by a short or empty read.
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// File metadata captured at open, when there is a file.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Kind of the last I/O error, cleared by the next successful operation.
    pub fn status(&self) -> Option<io::ErrorKind> {
        self.status
    }

    /// Read up to `buf.len()` bytes. A short read is not an error.
    pub fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        let kind = self.kind;
        let readable = self.mode.is_readable();
        let result = match &mut self.transport {
            Transport::Memory(_) if !readable => return Err(unsupported(kind, "read")),
            Transport::Memory(buffer) => {
                let n = buffer.read(buf)?;
                self.eof = buffer.eof();
                self.position = buffer.position() as u64;
                return Ok(n);
            }
            Transport::Reader(r) => r.read(buf),
            Transport::File(f) => f.read(buf),
            Transport::Stdin(s) => s.read(buf),
            #[cfg(unix)]
            Transport::Descriptor(f) => f.read(buf),
            Transport::Pipe(Pipe {
                stdout: Some(out), ..
            }) => out.read(buf),
            Transport::GzipReader(d) => d.read(buf),
            Transport::Bzip2Reader(d) => d.read(buf),
            Transport::Closed => return Err(StreamError::Closed),
            _ => return Err(unsupported(kind, "read")),
        };
        let n = self.track(result)?;
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        Ok(n)
    }

    /// Read one byte, or `None` at end of stream.
    pub fn read_byte(&mut self) -> StreamResult<Option<u8>> {
        let readable = self.mode.is_readable();
        if let (Transport::Memory(buffer), true) = (&mut self.transport, readable) {
            let byte = buffer.read_byte()?;
            self.eof = buffer.eof();
            self.position = buffer.position() as u64;
            return Ok(byte);
        }
        let mut byte = [0u8; 1];
        Ok((self.read_chunk(&mut byte)? == 1).then_some(byte[0]))
    }

    /// Fill `buf`, retrying short and interrupted reads until it is full or
    /// the transport reports end of stream.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(StreamError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Write `data`, returning how many bytes the transport accepted.
    pub fn write(&mut self, data: &[u8]) -> StreamResult<usize> {
        let kind = self.kind;
        let writable = self.mode.is_writable();
        let result = match &mut self.transport {
            Transport::Memory(_) if !writable => return Err(unsupported(kind, "write")),
            Transport::Memory(buffer) => {
                let n = buffer.write(data)?;
                self.position = buffer.position() as u64;
                return Ok(n);
            }
            Transport::Writer(w) => w.write(data),
            Transport::File(f) => f.write(data),
            Transport::Stdout(s) => s.write(data),
            #[cfg(unix)]
            Transport::Descriptor(f) => f.write(data),
            Transport::Pipe(Pipe {
                stdin: Some(input), ..
            }) => input.write(data),
            Transport::GzipWriter(e) => e.write(data),
            Transport::Bzip2Writer(e) => e.write(data),
            Transport::Closed => return Err(StreamError::Closed),
            _ => return Err(unsupported(kind, "write")),
        };
        self.track(result)
    }

    /// Write all of `data`, retrying interrupted writes.
    pub fn write_chunk(&mut self, data: &[u8]) -> StreamResult<usize> {
        let mut written = 0;
        while written < data.len() {
            match self.write(&data[written..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => written += n,
                Err(StreamError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    /// Write a string in full.
    pub fn write_str(&mut self, s: &str) -> StreamResult<usize> {
        self.write_chunk(s.as_bytes())
    }

    /// Reposition. Codec, pipe and standard streams only accept a seek to
    /// the current position.
    pub fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        let kind = self.kind;
        let position = self.position;
        let result = match &mut self.transport {
            Transport::Memory(buffer) => match buffer.seek(pos) {
                Ok(p) => {
                    self.eof = buffer.eof();
                    self.position = p;
                    self.status = None;
                    return Ok(p);
                }
                Err(StreamError::Io(e)) => return self.track(Err(e)),
                Err(e) => return Err(e),
            },
            Transport::Reader(r) => r.seek(pos),
            Transport::Writer(w) => w.seek(pos),
            Transport::File(f) => f.seek(pos),
            #[cfg(unix)]
            Transport::Descriptor(f) => f.seek(pos),
            Transport::Closed => return Err(StreamError::Closed),
            _ => {
                let target = match pos {
                    SeekFrom::Start(n) => Some(n),
                    SeekFrom::Current(0) => Some(position),
                    _ => None,
                };
                if target == Some(position) {
                    return Ok(position);
                }
                return Err(unsupported(kind, "seek"));
            }
        };
        let p = self.track(result)?;
        self.position = p;
        self.eof = false;
        trace!(reference = %self.reference, position = p, "seek");
        Ok(p)
    }

    /// Current position, or `None` where the transport cannot report one.
    pub fn tell(&self) -> Option<u64> {
        match &self.transport {
            Transport::Pipe(_) | Transport::Closed => None,
            Transport::Memory(buffer) => Some(buffer.position() as u64),
            _ => Some(self.position),
        }
    }

    /// Size of the backing content: the buffer length for memory streams,
    /// the on-disk size for files (compressed size for codec streams), and
    /// zero for pipes and standard streams.
    pub fn size(&mut self) -> StreamResult<u64> {
        let len = match &mut self.transport {
            Transport::Memory(buffer) => buffer.len() as u64,
            Transport::Reader(r) => r.get_ref().metadata()?.len(),
            Transport::Writer(w) => {
                w.flush()?;
                w.get_ref().metadata()?.len()
            }
            Transport::File(f) => f.metadata()?.len(),
            Transport::GzipReader(d) => d.get_ref().get_ref().metadata()?.len(),
            Transport::GzipWriter(e) => e.get_ref().get_ref().metadata()?.len(),
            Transport::Bzip2Reader(d) => d.get_ref().get_ref().metadata()?.len(),
            Transport::Bzip2Writer(e) => e.get_ref().get_ref().metadata()?.len(),
            #[cfg(unix)]
            Transport::Descriptor(f) => f.metadata().map(|m| m.len()).unwrap_or(0),
            Transport::Stdin(_) | Transport::Stdout(_) | Transport::Pipe(_) => 0,
            Transport::Closed => return Err(StreamError::Closed),
        };
        Ok(len)
    }

    /// Push buffered output to the transport.
    pub fn flush(&mut self) -> StreamResult<()> {
        let result = match &mut self.transport {
            Transport::Writer(w) => w.flush(),
            Transport::File(f) => f.flush(),
            Transport::Stdout(s) => s.flush(),
            #[cfg(unix)]
            Transport::Descriptor(f) => f.flush(),
            Transport::Pipe(Pipe {
                stdin: Some(input), ..
            }) => input.flush(),
            Transport::GzipWriter(e) => e.flush(),
            Transport::Bzip2Writer(e) => e.flush(),
            Transport::Closed => return Err(StreamError::Closed),
            _ => Ok(()),
        };
        self.track(result)
    }

    /// Reserve `extent` bytes so later writes up to it do not fail for lack
    /// of space. Files are extended on disk; memory buffers are reserved.
    pub fn set_extent(&mut self, extent: u64) -> StreamResult<()> {
        let kind = self.kind;
        let result = match &mut self.transport {
            Transport::Memory(buffer) => return buffer.set_extent(extent),
            Transport::Writer(w) => w.flush().and_then(|()| extend_file(w.get_ref(), extent)),
            Transport::File(f) => extend_file(f, extent),
            Transport::Closed => return Err(StreamError::Closed),
            _ => return Err(unsupported(kind, "set_extent")),
        };
        self.track(result)?;
        trace!(reference = %self.reference, extent, "extent set");
        Ok(())
    }

    /// Flush and release the transport. Externally owned descriptors are
    /// flushed but left open; in-memory data is detached. Closing twice is
    /// a no-op.
    pub fn close(&mut self) -> StreamResult<()> {
        let transport = std::mem::replace(&mut self.transport, Transport::Closed);
        let result: StreamResult<()> = match transport {
            Transport::Closed => return Ok(()),
            Transport::Reader(_)
            | Transport::Stdin(_)
            | Transport::GzipReader(_)
            | Transport::Bzip2Reader(_) => Ok(()),
            Transport::File(mut f) => f.flush().map_err(Into::into),
            Transport::Writer(w) => w.into_inner().map(drop).map_err(|e| e.into_error().into()),
            Transport::Stdout(mut s) => s.flush().map_err(Into::into),
            #[cfg(unix)]
            Transport::Descriptor(mut f) => f.flush().map_err(Into::into),
            Transport::Pipe(pipe) => pipe.finish(),
            Transport::GzipWriter(e) => e.finish().and_then(|mut w| w.flush()).map_err(Into::into),
            Transport::Bzip2Writer(e) => e.finish().and_then(|mut w| w.flush()).map_err(Into::into),
            Transport::Memory(mut buffer) => {
                buffer.detach();
                Ok(())
            }
        };
        match &result {
            Ok(()) => trace!(reference = %self.reference, kind = %self.kind, "stream closed"),
            Err(e) => debug!(reference = %self.reference, error = %e, "stream close failed"),
        }
        result
    }

    fn open_standard(mode: StreamMode) -> StreamResult<Self> {
        let transport = match mode {
            StreamMode::Read => Transport::Stdin(io::stdin()),
            StreamMode::Write => Transport::Stdout(io::stdout()),
            StreamMode::ReadWrite => {
                return Err(unsupported(StreamKind::Standard, "read-write open"))
            }
        };
        let mut stream = Self::with_transport(
            STANDARD_REFERENCE.to_string(),
            StreamKind::Standard,
            mode,
            transport,
        );
        stream.exempt = true;
        Ok(stream)
    }

    #[cfg(unix)]
    fn open_descriptor(reference: &str, digits: &str, mode: StreamMode) -> StreamResult<Self> {
        use std::mem::ManuallyDrop;
        use std::os::unix::io::FromRawFd;

        let fd: i32 = digits
            .parse()
            .ok()
            .filter(|fd| *fd >= 0)
            .ok_or_else(|| StreamError::InvalidDescriptor(reference.to_string()))?;
        // SAFETY: an `fd:N` reference asserts that descriptor N is open and
        // outlives the stream. ManuallyDrop keeps us from closing it.
        let file = ManuallyDrop::new(unsafe { File::from_raw_fd(fd) });
        let metadata = file.metadata().map_err(|source| StreamError::Open {
            path: PathBuf::from(reference),
            source,
        })?;
        let mut stream = Self::with_transport(
            reference.to_string(),
            StreamKind::Standard,
            mode,
            Transport::Descriptor(file),
        );
        stream.exempt = true;
        stream.metadata = Some(metadata);
        Ok(stream)
    }

    #[cfg(not(unix))]
    fn open_descriptor(_reference: &str, _digits: &str, _mode: StreamMode) -> StreamResult<Self> {
        Err(unsupported(StreamKind::Standard, "descriptor open"))
    }

    fn open_pipe(command: &str, mode: StreamMode) -> StreamResult<Self> {
        let mut shell = shell_command(command);
        match mode {
            StreamMode::Read => {
                shell.stdout(Stdio::piped());
            }
            StreamMode::Write => {
                shell.stdin(Stdio::piped());
            }
            StreamMode::ReadWrite => return Err(unsupported(StreamKind::Pipe, "read-write open")),
        }
        let mut child = shell.spawn().map_err(|source| StreamError::Open {
            path: PathBuf::from(command),
            source,
        })?;
        debug!(command, pid = child.id(), "pipe spawned");
        let pipe = Pipe {
            command: command.to_string(),
            stdout: child.stdout.take(),
            stdin: child.stdin.take(),
            child,
        };
        Ok(Self::with_transport(
            format!("{PIPE_PREFIX}{command}"),
            StreamKind::Pipe,
            mode,
            Transport::Pipe(pipe),
        ))
    }

    fn buffered_or_mapped(
        reference: String,
        file: File,
        metadata: Metadata,
        options: &OpenOptions,
    ) -> StreamResult<Self> {
        let size = metadata.len();
        if options.memory_map && metadata.is_file() && size > 0 && size <= options.map_limit {
            match MemoryBuffer::map(&file) {
                Ok(buffer) => {
                    let mut stream = Self::with_transport(
                        reference,
                        StreamKind::File,
                        StreamMode::Read,
                        Transport::Memory(buffer),
                    );
                    stream.mapped = true;
                    stream.metadata = Some(metadata);
                    trace!(reference = %stream.reference, size, "file memory-mapped");
                    return Ok(stream);
                }
                Err(e) => debug!(reference = %reference, error = %e, "memory map failed, falling back to buffered reads"),
            }
        }
        let mut stream = Self::with_transport(
            reference,
            StreamKind::File,
            StreamMode::Read,
            Transport::Reader(BufReader::new(file)),
        );
        stream.metadata = Some(metadata);
        Ok(stream)
    }

    fn with_transport(
        reference: String,
        kind: StreamKind,
        mode: StreamMode,
        transport: Transport,
    ) -> Self {
        Self {
            reference,
            kind,
            mode,
            transport,
            position: 0,
            eof: false,
            exempt: false,
            mapped: false,
            metadata: None,
            status: None,
        }
    }

    /// Record the outcome of a transport call and advance the position.
    fn track<T: TrackPosition + Copy>(&mut self, result: io::Result<T>) -> StreamResult<T> {
        match result {
            Ok(value) => {
                self.status = None;
                value.advance(&mut self.position);
                Ok(value)
            }
            Err(e) => {
                self.status = Some(e.kind());
                Err(e.into())
            }
        }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(reference = %self.reference, error = %e, "failed to close stream on drop");
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("reference", &self.reference)
            .field("kind", &self.kind)
            .field("mode", &self.mode)
            .field("position", &self.tell())
            .field("eof", &self.eof)
            .field("mapped", &self.mapped)
            .field("exempt", &self.exempt)
            .finish_non_exhaustive()
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Stream::read(self, buf).map_err(Into::into)
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Stream::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Stream::flush(self).map_err(Into::into)
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Stream::seek(self, pos).map_err(Into::into)
    }
}

/// How a successful transport result moves the logical position.
trait TrackPosition {
    fn advance(self, position: &mut u64);
}

impl TrackPosition for usize {
    fn advance(self, position: &mut u64) {
        *position += self as u64;
    }
}

impl TrackPosition for u64 {
    fn advance(self, position: &mut u64) {
        *position = self;
    }
}

impl TrackPosition for () {
    fn advance(self, _position: &mut u64) {}
}

fn unsupported(kind: StreamKind, operation: &'static str) -> StreamError {
    StreamError::Unsupported { kind, operation }
}

fn compression_kind(compression: Option<Compression>) -> StreamKind {
    match compression {
        Some(Compression::Gzip) => StreamKind::Gzip,
        Some(Compression::Bzip2) => StreamKind::Bzip2,
        None => StreamKind::File,
    }
}

fn file_options(mode: StreamMode) -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    match mode {
        StreamMode::Read => {
            options.read(true);
        }
        StreamMode::Write => {
            options.write(true).create(true).truncate(true);
        }
        StreamMode::ReadWrite => {
            options.read(true).write(true).create(true).truncate(true);
        }
    }
    options
}

fn extend_file(file: &File, extent: u64) -> io::Result<()> {
    if file.metadata()?.len() < extent {
        file.set_len(extent)?;
    }
    Ok(())
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut shell = Command::new("sh");
    shell.arg("-c").arg(command);
    shell
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut shell = Command::new("cmd");
    shell.arg("/C").arg(command);
    shell
}
