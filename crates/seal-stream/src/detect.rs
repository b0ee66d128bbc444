use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Compression formats recognized on open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compression {
    Gzip,
    Bzip2,
}

/// Identify a compression format from the leading bytes of a file.
pub fn detect_magic(header: &[u8]) -> Option<Compression> {
    match header {
        [0x1F, 0x8B, 0x08, ..] => Some(Compression::Gzip),
        [b'B', b'Z', b'h', ..] => Some(Compression::Bzip2),
        _ => None,
    }
}

/// Identify a compression format from a file name suffix.
pub fn detect_suffix(path: &Path) -> Option<Compression> {
    let ext = path.extension()?.to_str()?;
    // `.Z` is case sensitive: `.z` is pack(1), which we do not read.
    if ext == "Z" {
        return Some(Compression::Gzip);
    }
    match ext.to_ascii_lowercase().as_str() {
        "gz" | "wmz" | "svgz" => Some(Compression::Gzip),
        "bz2" => Some(Compression::Bzip2),
        _ => None,
    }
}

/// Peek the first three bytes of `file` and rewind.
pub fn sniff(file: &mut File) -> io::Result<Option<Compression>> {
    let mut header = [0u8; 3];
    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    file.seek(SeekFrom::Start(0))?;
    Ok(detect_magic(&header[..filled]))
}
