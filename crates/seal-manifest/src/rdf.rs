use std::borrow::Cow;
use std::fmt::Write as _;

use seal_stream::{Stream, StreamResult};
use tracing::trace;

use crate::record::{format_timestamp, ManifestRecord};

pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const DIGEST_NAMESPACE: &str = "http://www.wizards-toolkit.org/digest/1.0/";

/// Element that wraps one record.
pub const CONTENT_ELEMENT: &str = "digest:Content";

/// Record element used by older manifests.
pub const DESCRIPTION_ELEMENT: &str = "rdf:Description";

/// Manifest preamble up to and including the `rdf:RDF` open tag.
pub fn header() -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<rdf:RDF xmlns:rdf=\"{RDF_NAMESPACE}\"\n         xmlns:digest=\"{DIGEST_NAMESPACE}\">\n"
    )
}

pub const FOOTER: &str = "</rdf:RDF>\n";

/// Escape text for an XML attribute or element body.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Resolve the predefined entities and numeric character references.
/// Unrecognized entities are kept verbatim.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let resolved = rest
            .find(';')
            .and_then(|semi| resolve_entity(&rest[1..semi]).map(|c| (c, semi)));
        match resolved {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Render one `digest:Content` element.
pub fn render_record(record: &ManifestRecord) -> String {
    let algorithm = record.algorithm().mnemonic();
    let mut out = String::with_capacity(512);
    let _ = writeln!(
        out,
        "  <{CONTENT_ELEMENT} rdf:about=\"{}\">",
        escape(&record.path)
    );
    let _ = writeln!(
        out,
        "    <digest:timestamp>{}</digest:timestamp>",
        format_timestamp(&record.captured)
    );
    let _ = writeln!(
        out,
        "    <digest:modify-date>{}</digest:modify-date>",
        format_timestamp(&record.modified)
    );
    let _ = writeln!(
        out,
        "    <digest:create-date>{}</digest:create-date>",
        format_timestamp(&record.created)
    );
    let _ = writeln!(out, "    <digest:extent>{}</digest:extent>", record.extent);
    let _ = writeln!(
        out,
        "    <digest:{algorithm}>{}</digest:{algorithm}>",
        record.digest.to_hex()
    );
    let _ = writeln!(out, "  </{CONTENT_ELEMENT}>");
    out
}

/// Writes a manifest document to a stream: header on [`begin`](Self::begin),
/// one element per record, footer on [`finish`](Self::finish).
pub struct ManifestWriter<'a> {
    stream: &'a mut Stream,
    records: usize,
}

impl<'a> ManifestWriter<'a> {
    pub fn begin(stream: &'a mut Stream) -> StreamResult<Self> {
        stream.write_str(&header())?;
        Ok(Self { stream, records: 0 })
    }

    pub fn write_record(&mut self, record: &ManifestRecord) -> StreamResult<()> {
        self.stream.write_str(&render_record(record))?;
        self.records += 1;
        trace!(path = %record.path, records = self.records, "manifest record written");
        Ok(())
    }

    /// Records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Write the footer and flush. Returns the record count.
    pub fn finish(self) -> StreamResult<usize> {
        self.stream.write_str(FOOTER)?;
        self.stream.flush()?;
        Ok(self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use seal_crypto::HashKind;

    fn sample(path: &str) -> ManifestRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ManifestRecord {
            path: path.into(),
            digest: HashKind::Sha256.hash(b"hello"),
            extent: 5,
            created: at,
            modified: at,
            captured: at,
        }
    }

    #[test]
    fn escape_roundtrip() {
        let raw = r#"a&b <c> "d" 'e'"#;
        let escaped = escape(raw);
        assert_eq!(escaped, "a&amp;b &lt;c&gt; &quot;d&quot; &apos;e&apos;");
        assert_eq!(unescape(&escaped), raw);
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape("plain/path.txt"), Cow::Borrowed(_)));
        assert!(matches!(unescape("plain/path.txt"), Cow::Borrowed(_)));
    }

    #[test]
    fn unescape_numeric_and_unknown() {
        assert_eq!(unescape("&#65;&#x42;"), "AB");
        assert_eq!(unescape("&nbsp; & x"), "&nbsp; & x");
    }

    #[test]
    fn header_layout() {
        let h = header();
        assert!(h.starts_with("<?xml version=\"1.0\"?>\n<rdf:RDF xmlns:rdf="));
        assert!(h.contains("\n         xmlns:digest=\"http://www.wizards-toolkit.org/digest/1.0/\">\n"));
    }

    #[test]
    fn record_element_order() {
        let text = render_record(&sample("dir/a&b.txt"));
        let expected = "  <digest:Content rdf:about=\"dir/a&amp;b.txt\">\n\
             \x20   <digest:timestamp>2024-05-01T12:00:00Z</digest:timestamp>\n\
             \x20   <digest:modify-date>2024-05-01T12:00:00Z</digest:modify-date>\n\
             \x20   <digest:create-date>2024-05-01T12:00:00Z</digest:create-date>\n\
             \x20   <digest:extent>5</digest:extent>\n\
             \x20   <digest:sha256>2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824</digest:sha256>\n\
             \x20 </digest:Content>\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn writer_frames_records() {
        let mut stream = Stream::memory();
        let mut writer = ManifestWriter::begin(&mut stream).unwrap();
        writer.write_record(&sample("one")).unwrap();
        writer.write_record(&sample("two")).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);
        let text = String::from_utf8(stream.into_bytes().unwrap()).unwrap();
        assert!(text.starts_with(&header()));
        assert!(text.ends_with("  </digest:Content>\n</rdf:RDF>\n"));
        assert_eq!(text.matches("<digest:Content ").count(), 2);
    }
}
