use seal_crypto::HashKind;
use seal_stream::{Stream, StreamResult};
use tracing::{debug, trace};

use crate::rdf::{unescape, CONTENT_ELEMENT, DESCRIPTION_ELEMENT};
use crate::record::{ParsedRecord, RecordedDigest};

enum Token {
    Tag(String),
    Text(String),
}

/// Incremental manifest parser.
///
/// Reads the manifest as a flat sequence of tags and text rather than a
/// tree. An `rdf:about` attribute starts a new record, a closing
/// `digest:Content` or `rdf:Description` completes it, and `digest:*`
/// elements in between fill in its fields. Tag names are matched without
/// regard to case. Anything unrecognized is skipped, so damaged or foreign
/// markup only loses the fields it touches.
pub struct ManifestReader<'a> {
    stream: &'a mut Stream,
    peeked: Option<u8>,
    current: Option<ParsedRecord>,
    /// Open element name and the text seen since it opened.
    pending: Option<(String, String)>,
    skipped: usize,
    done: bool,
}

impl<'a> ManifestReader<'a> {
    pub fn new(stream: &'a mut Stream) -> Self {
        Self {
            stream,
            peeked: None,
            current: None,
            pending: None,
            skipped: 0,
            done: false,
        }
    }

    /// Records closed without a usable path, so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The next complete record, or `None` at end of manifest.
    pub fn next_record(&mut self) -> StreamResult<Option<ParsedRecord>> {
        while !self.done {
            match self.next_token()? {
                None => {
                    self.done = true;
                    if let Some(record) = self.current.take() {
                        debug!(path = %record.path, "manifest ended inside an unterminated record");
                    }
                }
                Some(Token::Text(text)) => {
                    if let Some((_, body)) = &mut self.pending {
                        body.push_str(&text);
                    }
                }
                Some(Token::Tag(tag)) => {
                    if let Some(record) = self.handle_tag(&tag) {
                        return Ok(Some(record));
                    }
                }
            }
        }
        Ok(None)
    }

    fn handle_tag(&mut self, tag: &str) -> Option<ParsedRecord> {
        let tag = tag.trim();
        if tag.starts_with('?') || tag.starts_with('!') {
            return None;
        }

        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            if is_record_element(name) {
                self.pending = None;
                return match self.current.take() {
                    Some(record) if !record.path.is_empty() => {
                        trace!(path = %record.path, "manifest record parsed");
                        Some(record)
                    }
                    _ => {
                        self.skipped += 1;
                        debug!(element = name, "manifest record without a path skipped");
                        None
                    }
                };
            }
            if let Some((key, body)) = self.pending.take() {
                if key.eq_ignore_ascii_case(name) {
                    self.assign(&key, &body);
                }
            }
            return None;
        }

        let self_closing = tag.ends_with('/');
        let body = tag.trim_end_matches('/');
        let (name, attributes) = match body.find(char::is_whitespace) {
            Some(at) => (&body[..at], &body[at..]),
            None => (body, ""),
        };

        for (key, value) in parse_attributes(attributes) {
            if key.eq_ignore_ascii_case("rdf:about") {
                self.current = Some(ParsedRecord::new(unescape(value.trim())));
            }
        }
        if is_record_element(name) && !attributes.to_ascii_lowercase().contains("rdf:about") {
            // A record element with no path: collect fields, then skip it on close.
            self.current = Some(ParsedRecord::default());
        }

        self.pending = if self_closing {
            None
        } else {
            Some((name.to_string(), String::new()))
        };
        None
    }

    fn assign(&mut self, key: &str, body: &str) {
        let Some(record) = self.current.as_mut() else {
            return;
        };
        let value = unescape(body.trim()).into_owned();
        let key = key.to_ascii_lowercase();
        match key.as_str() {
            "digest:timestamp" => record.timestamp = Some(value),
            "digest:modify-date" => record.modify_date = Some(value),
            "digest:create-date" => record.create_date = Some(value),
            "digest:extent" => record.extent = value.parse().ok(),
            _ => {
                let Some(mnemonic) = key.strip_prefix("digest:") else {
                    return;
                };
                let algorithm = HashKind::from_mnemonic(mnemonic);
                // A recognized digest is never displaced by an unrecognized one.
                let keep_existing = algorithm.is_none()
                    && record.digest.as_ref().is_some_and(|d| d.algorithm.is_some());
                if keep_existing {
                    return;
                }
                if algorithm.is_none() {
                    debug!(mnemonic, path = %record.path, "unrecognized digest algorithm");
                }
                record.digest = Some(RecordedDigest {
                    mnemonic: mnemonic.to_string(),
                    algorithm,
                    hex: value,
                });
            }
        }
    }

    fn next_byte(&mut self) -> StreamResult<Option<u8>> {
        match self.peeked.take() {
            Some(b) => Ok(Some(b)),
            None => self.stream.read_byte(),
        }
    }

    fn next_token(&mut self) -> StreamResult<Option<Token>> {
        let Some(first) = self.next_byte()? else {
            return Ok(None);
        };
        let mut bytes = Vec::new();

        if first == b'<' {
            let mut quote = None;
            loop {
                let Some(b) = self.next_byte()? else {
                    debug!("manifest ended inside a tag");
                    return Ok(None);
                };
                match (quote, b) {
                    (None, b'>') => break,
                    (None, b'"' | b'\'') => quote = Some(b),
                    (Some(q), _) if q == b => quote = None,
                    _ => {}
                }
                bytes.push(b);
            }
            return Ok(Some(Token::Tag(String::from_utf8_lossy(&bytes).into_owned())));
        }

        bytes.push(first);
        loop {
            match self.next_byte()? {
                None => break,
                Some(b'<') => {
                    self.peeked = Some(b'<');
                    break;
                }
                Some(b) => bytes.push(b),
            }
        }
        Ok(Some(Token::Text(String::from_utf8_lossy(&bytes).into_owned())))
    }
}

impl Iterator for ManifestReader<'_> {
    type Item = StreamResult<ParsedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn is_record_element(name: &str) -> bool {
    name.eq_ignore_ascii_case(CONTENT_ELEMENT) || name.eq_ignore_ascii_case(DESCRIPTION_ELEMENT)
}

/// Split `key="value"` pairs. Values may use either quote, or none.
fn parse_attributes(text: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        rest = rest[key_end..].trim_start();
        let Some(after_eq) = rest.strip_prefix('=') else {
            // Bare attribute; no value.
            if key.is_empty() {
                break;
            }
            continue;
        };
        rest = after_eq.trim_start();
        let value = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let inner = &rest[1..];
                let end = inner.find(q).unwrap_or(inner.len());
                rest = inner.get(end + 1..).unwrap_or("");
                &inner[..end]
            }
            _ => {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                let value = &rest[..end];
                rest = &rest[end..];
                value
            }
        };
        pairs.push((key, value));
        rest = rest.trim_start();
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn parse(text: &str) -> Vec<ParsedRecord> {
        let mut stream = Stream::from_bytes(text.as_bytes().to_vec());
        let reader = ManifestReader::new(&mut stream);
        reader.collect::<StreamResult<Vec<_>>>().unwrap()
    }

    #[test]
    fn parses_written_manifest() {
        let text = format!(
            "{}  <digest:Content rdf:about=\"a&amp;b.txt\">\n    <digest:timestamp>2024-05-01T12:00:00Z</digest:timestamp>\n    <digest:modify-date>M</digest:modify-date>\n    <digest:create-date>C</digest:create-date>\n    <digest:extent>5</digest:extent>\n    <digest:sha256>{HELLO_256}</digest:sha256>\n  </digest:Content>\n</rdf:RDF>\n",
            crate::rdf::header()
        );
        let records = parse(&text);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.path, "a&b.txt");
        assert_eq!(r.timestamp.as_deref(), Some("2024-05-01T12:00:00Z"));
        assert_eq!(r.modify_date.as_deref(), Some("M"));
        assert_eq!(r.create_date.as_deref(), Some("C"));
        assert_eq!(r.extent, Some(5));
        let d = r.digest.as_ref().unwrap();
        assert_eq!(d.algorithm, Some(HashKind::Sha256));
        assert_eq!(d.hex, HELLO_256);
    }

    #[test]
    fn path_resets_fields_between_records() {
        let text = "<digest:Content rdf:about='one'><digest:sha224>aa</digest:sha224>\
                    <digest:timestamp>T1</digest:timestamp></digest:Content>\
                    <digest:Content rdf:about='two'></digest:Content>";
        let records = parse(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "one");
        assert_eq!(records[0].timestamp.as_deref(), Some("T1"));
        assert_eq!(records[1].path, "two");
        assert!(records[1].digest.is_none());
        assert!(records[1].timestamp.is_none());
    }

    #[test]
    fn legacy_description_element() {
        let text = "<RDF:rdf><rdf:Description rdf:about=\"x\">\
                    <digest:SHA256>ABC</digest:SHA256></rdf:Description>";
        let records = parse(text);
        assert_eq!(records.len(), 1);
        let d = records[0].digest.as_ref().unwrap();
        assert_eq!(d.algorithm, Some(HashKind::Sha256));
        assert_eq!(d.hex, "ABC");
    }

    #[test]
    fn record_without_path_is_skipped() {
        let text = "<digest:Content><digest:sha256>00</digest:sha256></digest:Content>\
                    <digest:Content rdf:about=\"kept\"></digest:Content>";
        let mut stream = Stream::from_bytes(text.as_bytes().to_vec());
        let mut reader = ManifestReader::new(&mut stream);
        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.path, "kept");
        assert_eq!(reader.skipped(), 1);
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn unrecognized_algorithm_does_not_displace_known() {
        let text = "<digest:Content rdf:about=\"p\"><digest:sha256>11</digest:sha256>\
                    <digest:md5>22</digest:md5></digest:Content>";
        let d = parse(text).remove(0).digest.unwrap();
        assert_eq!(d.mnemonic, "sha256");
        assert_eq!(d.hex, "11");

        let text = "<digest:Content rdf:about=\"p\"><digest:md5>22</digest:md5></digest:Content>";
        let d = parse(text).remove(0).digest.unwrap();
        assert_eq!(d.mnemonic, "md5");
        assert_eq!(d.algorithm, None);
    }

    #[test]
    fn unterminated_record_is_dropped() {
        assert!(parse("<digest:Content rdf:about=\"p\"><digest:sha256>11").is_empty());
        assert!(parse("<digest:Content rdf:about=\"p").is_empty());
    }

    #[test]
    fn quoted_gt_inside_attribute() {
        let records = parse("<digest:Content rdf:about=\"a>b\"></digest:Content>");
        assert_eq!(records[0].path, "a>b");
    }

    #[test]
    fn garbage_is_tolerated() {
        let text = "junk & <<> <!-- note --> <digest:Content rdf:about=\"ok\">\
                    <digest:extent>nope</digest:extent></digest:Content> trailing";
        let records = parse(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "ok");
        assert_eq!(records[0].extent, None);
    }

    #[test]
    fn attributes() {
        assert_eq!(
            parse_attributes(r#" a="1" b='2'  c=3 d "#),
            vec![("a", "1"), ("b", "2"), ("c", "3")]
        );
    }
}
