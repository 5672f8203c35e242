//! Table writer: [`Document`] back to raw .tbl bytes

use crate::document::{Document, Entry, TblError};
use std::path::Path;

/// Reassembles a document into the exact original byte layout
pub struct TblWriter {
    // Currently stateless, but reserved for future options
}

impl TblWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self {}
    }

    /// Produce the byte stream: header, then per group the tag bytes, the
    /// binary prefix, each entry's canonical bytes and a single null
    /// terminator. No other separators, no padding.
    ///
    /// # Errors
    /// Fails if an entry's text can no longer be converted back to bytes.
    pub fn write(&self, doc: &Document) -> Result<Vec<u8>, TblError> {
        let mut out = Vec::with_capacity(doc.header.len());
        out.extend_from_slice(&doc.header);

        for group in &doc.groups {
            out.extend_from_slice(group.tag.as_bytes());
            out.extend_from_slice(&group.prefix);
            for entry in &group.entries {
                out.extend_from_slice(&entry.to_bytes()?);
            }
            out.push(0);
        }

        tracing::debug!(bytes = out.len(), groups = doc.groups.len(), "reassembled table");
        Ok(out)
    }

    /// Reassemble a document directly into a file
    pub fn write_to_file<P: AsRef<Path>>(&self, doc: &Document, path: P) -> Result<(), TblError> {
        let bytes = self.write(doc)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Default for TblWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Dump the readable side of a document: an index line per group, then one
/// line per text entry. Opaque entries contribute nothing.
pub fn dump_text(doc: &Document) -> String {
    let mut out = String::new();
    for (idx, group) in doc.groups.iter().enumerate() {
        out.push_str(&format!("{})\n", idx));
        for entry in &group.entries {
            if let Entry::Text { text, .. } = entry {
                out.push_str(text);
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EntryGroup;
    use crate::parser::TblParser;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn roundtrip(data: &[u8], markers: &[&str]) {
        let doc = TblParser::new().parse(data, &tags(markers)).unwrap();
        let rebuilt = TblWriter::new().write(&doc).unwrap();
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn test_roundtrip_identity_basic() {
        roundtrip(b"HDR\x00TAG1AB\x00Hello\x01World\x00", &["TAG1", "TAG2"]);
    }

    #[test]
    fn test_roundtrip_identity_control_codes() {
        roundtrip(
            b"\x05\x07SIG\x00TAG1PFX\x00Take %d of %s#3C done\x00TAG2\x00",
            &["TAG1", "TAG2"],
        );
    }

    #[test]
    fn test_roundtrip_identity_invalid_shift_jis() {
        // The undecodable span survives through the base64 fallback
        roundtrip(b"TAG1\x00AB\x82\x00", &["TAG1"]);
    }

    #[test]
    fn test_roundtrip_identity_high_byte_escapes() {
        roundtrip(
            b"hdr\x00TAG1p\x00\xE5\x10\x20mid\xEF\x01\x02end\x00",
            &["TAG1"],
        );
    }

    #[test]
    fn test_roundtrip_identity_shift_jis_text() {
        // "日本" in Shift-JIS between two control codes
        roundtrip(b"TAG1\x00%s\x93\xFA\x96\x7B%d\x00", &["TAG1"]);
    }

    #[test]
    fn test_roundtrip_preserves_empty_group() {
        roundtrip(b"H\x00TAG1\x00TAG2Hi\x00", &["TAG1", "TAG2"]);
    }

    #[test]
    fn test_write_to_file_roundtrip() {
        let data = b"HDR\x00TAG1AB\x00Hello\x00";
        let doc = TblParser::new().parse(data, &tags(&["TAG1"])).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tbl");
        TblWriter::new().write_to_file(&doc, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[test]
    fn test_dump_text_skips_opaque_entries() {
        let doc = Document {
            header: Vec::new(),
            tags: tags(&["TAG1"]),
            groups: vec![
                EntryGroup {
                    tag: "TAG1".to_string(),
                    prefix: Vec::new(),
                    entries: vec![
                        Entry::Text {
                            text: "Hello".to_string(),
                            fallback: false,
                        },
                        Entry::Opaque {
                            data: b"o\x01".to_vec(),
                        },
                        Entry::Text {
                            text: "World".to_string(),
                            fallback: false,
                        },
                    ],
                },
                EntryGroup {
                    tag: "TAG1".to_string(),
                    prefix: Vec::new(),
                    entries: Vec::new(),
                },
            ],
        };

        assert_eq!(dump_text(&doc), "0)\nHello\nWorld\n1)\n");
    }
}
