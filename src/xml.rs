//! Document serialization: [`Document`] to and from the editable XML tree
//!
//! The tree carries everything needed for exact reconstruction: the header
//! bytes and every group prefix as base64 attributes/text, the tag marker
//! list on the header element, and the fallback flag on entries whose
//! bytes were not valid Shift-JIS.

use crate::document::{Document, Entry, EntryGroup, TblError};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

// XML tree constants
const ROOT_TAG: &str = "root";
const DOC_TAG: &str = "doc";
const HEADER_TAG: &str = "header";
const GROUP_TAG: &str = "Group";
const ENTRY_TAG: &str = "Entry";

/// Serialize a document to the editable XML form.
///
/// # Errors
/// Returns an error if XML serialization fails.
pub fn to_xml(doc: &Document) -> Result<String, TblError> {
    let mut output = Vec::new();
    let mut writer = Writer::new_with_indent(&mut output, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT_TAG)))?;
    writer.write_event(Event::Start(BytesStart::new(DOC_TAG)))?;

    let mut header = BytesStart::new(HEADER_TAG);
    if !doc.tags.is_empty() {
        header.push_attribute(("tags", doc.tags.join(",").as_str()));
    }
    if doc.header.is_empty() {
        writer.write_event(Event::Empty(header))?;
    } else {
        writer.write_event(Event::Start(header))?;
        writer.write_event(Event::Text(BytesText::new(&STANDARD.encode(&doc.header))))?;
        writer.write_event(Event::End(BytesEnd::new(HEADER_TAG)))?;
    }

    for (idx, group) in doc.groups.iter().enumerate() {
        let mut el = BytesStart::new(GROUP_TAG);
        el.push_attribute(("type", group.tag.as_str()));
        el.push_attribute(("data", STANDARD.encode(&group.prefix).as_str()));
        el.push_attribute(("idx", idx.to_string().as_str()));

        if group.entries.is_empty() {
            writer.write_event(Event::Empty(el))?;
            continue;
        }

        writer.write_event(Event::Start(el))?;
        for entry in &group.entries {
            write_entry(&mut writer, entry)?;
        }
        writer.write_event(Event::End(BytesEnd::new(GROUP_TAG)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(DOC_TAG)))?;
    writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;

    let mut xml = String::from_utf8(output)
        .map_err(|e| TblError::Encoding(format!("serializer produced invalid UTF-8: {}", e)))?;
    xml.push('\n');

    tracing::debug!(groups = doc.groups.len(), "serialized document");
    Ok(xml)
}

fn write_entry<W: std::io::Write>(
    writer: &mut Writer<W>,
    entry: &Entry,
) -> Result<(), TblError> {
    match entry {
        Entry::Opaque { data } => {
            let mut el = BytesStart::new(ENTRY_TAG);
            el.push_attribute(("data", STANDARD.encode(data).as_str()));
            writer.write_event(Event::Empty(el))?;
        }
        Entry::Text { text, fallback } => {
            let mut el = BytesStart::new(ENTRY_TAG);
            if *fallback {
                el.push_attribute(("b64_encoded", "true"));
            }
            writer.write_event(Event::Start(el))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new(ENTRY_TAG)))?;
        }
    }
    Ok(())
}

/// Entry element state while its text content is still pending
struct PendingEntry {
    data: Option<Vec<u8>>,
    fallback: bool,
    text: String,
}

/// Deserialize the editable XML form back to a document.
///
/// # Errors
/// Fails on XML that violates the tree shape: a group without `type` or
/// `data`, an entry with neither payload nor text, or a `b64_encoded`
/// value that is not exactly `true` or `false`.
pub fn from_xml(content: &str) -> Result<Document, TblError> {
    let mut reader = Reader::from_str(content);
    // Entry text is translation content; never trim it
    reader.trim_text(false);

    let mut doc = Document {
        header: Vec::new(),
        tags: Vec::new(),
        groups: Vec::new(),
    };

    let mut buf = Vec::new();
    let mut in_header = false;
    let mut header_b64 = String::new();
    let mut current_group: Option<EntryGroup> = None;
    let mut current_entry: Option<PendingEntry> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"header" => {
                    doc.tags = read_header_tags(&e)?;
                    in_header = true;
                }
                b"Group" => {
                    current_group = Some(read_group_start(&e)?);
                }
                b"Entry" => {
                    current_entry = Some(read_entry_start(&e)?);
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"header" => {
                    doc.tags = read_header_tags(&e)?;
                }
                b"Group" => {
                    doc.groups.push(read_group_start(&e)?);
                }
                b"Entry" => {
                    let pending = read_entry_start(&e)?;
                    finish_entry(&mut doc, &mut current_group, pending)?;
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_header {
                    header_b64.push_str(&e.unescape()?);
                } else if let Some(entry) = current_entry.as_mut() {
                    entry.text.push_str(&e.unescape()?);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"header" => {
                    in_header = false;
                    doc.header = STANDARD.decode(header_b64.trim()).map_err(|e| {
                        TblError::Encoding(format!("invalid base64 in header: {}", e))
                    })?;
                }
                b"Group" => {
                    let group = current_group.take().ok_or_else(|| {
                        TblError::Structure("group end without a group start".to_string())
                    })?;
                    doc.groups.push(group);
                }
                b"Entry" => {
                    let pending = current_entry.take().ok_or_else(|| {
                        TblError::Structure("entry end without an entry start".to_string())
                    })?;
                    finish_entry(&mut doc, &mut current_group, pending)?;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(TblError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    tracing::debug!(groups = doc.groups.len(), "deserialized document");
    Ok(doc)
}

fn read_header_tags(el: &BytesStart<'_>) -> Result<Vec<String>, TblError> {
    for attr in el.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"tags" {
            let raw = attr.unescape_value()?;
            return Ok(raw.split(',').map(str::to_string).collect());
        }
    }
    Ok(Vec::new())
}

fn read_group_start(el: &BytesStart<'_>) -> Result<EntryGroup, TblError> {
    let mut tag: Option<String> = None;
    let mut prefix: Option<Vec<u8>> = None;

    for attr in el.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"type" => tag = Some(attr.unescape_value()?.into_owned()),
            b"data" => {
                let raw = attr.unescape_value()?;
                prefix = Some(STANDARD.decode(raw.as_ref()).map_err(|e| {
                    TblError::Encoding(format!("invalid base64 in group data: {}", e))
                })?);
            }
            _ => {}
        }
    }

    Ok(EntryGroup {
        tag: tag.ok_or_else(|| {
            TblError::Structure("group element without a type attribute".to_string())
        })?,
        prefix: prefix.ok_or_else(|| {
            TblError::Structure("group element without a data attribute".to_string())
        })?,
        entries: Vec::new(),
    })
}

fn read_entry_start(el: &BytesStart<'_>) -> Result<PendingEntry, TblError> {
    let mut pending = PendingEntry {
        data: None,
        fallback: false,
        text: String::new(),
    };

    for attr in el.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"data" => {
                let raw = attr.unescape_value()?;
                pending.data = Some(STANDARD.decode(raw.as_ref()).map_err(|e| {
                    TblError::Encoding(format!("invalid base64 in entry data: {}", e))
                })?);
            }
            b"b64_encoded" => pending.fallback = parse_bool(&attr.unescape_value()?)?,
            _ => {}
        }
    }

    Ok(pending)
}

fn finish_entry(
    doc: &mut Document,
    current_group: &mut Option<EntryGroup>,
    pending: PendingEntry,
) -> Result<(), TblError> {
    let group = current_group.as_mut().ok_or_else(|| {
        TblError::Structure("entry element outside of a group".to_string())
    })?;

    let entry = if let Some(data) = pending.data {
        Entry::Opaque { data }
    } else if !pending.text.is_empty() {
        Entry::Text {
            text: pending.text,
            fallback: pending.fallback,
        }
    } else {
        return Err(TblError::MalformedEntry {
            group: doc.groups.len(),
            entry: group.entries.len(),
        });
    };

    group.entries.push(entry);
    Ok(())
}

/// Strict boolean attribute parse. Only the exact literals are accepted;
/// anything else aborts the deserialize.
fn parse_bool(raw: &str) -> Result<bool, TblError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(TblError::Structure(format!(
            "invalid boolean attribute value: {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TblParser;
    use crate::writer::TblWriter;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample_document() -> Document {
        Document {
            header: b"HDR\x00".to_vec(),
            tags: tags(&["TAG1", "TAG2"]),
            groups: vec![
                EntryGroup {
                    tag: "TAG1".to_string(),
                    prefix: b"AB\x00".to_vec(),
                    entries: vec![
                        Entry::Text {
                            text: "Hello".to_string(),
                            fallback: false,
                        },
                        Entry::Opaque {
                            data: b"o\x01".to_vec(),
                        },
                        Entry::Text {
                            text: "gg==".to_string(),
                            fallback: true,
                        },
                    ],
                },
                EntryGroup {
                    tag: "TAG2".to_string(),
                    prefix: Vec::new(),
                    entries: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_document_roundtrip() {
        let doc = sample_document();
        let xml = to_xml(&doc).unwrap();
        let parsed = from_xml(&xml).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_xml_shape() {
        let xml = to_xml(&sample_document()).unwrap();
        assert!(xml.contains(r#"<header tags="TAG1,TAG2">"#));
        assert!(xml.contains(r#"<Group type="TAG1" data="QUIA" idx="0">"#));
        assert!(xml.contains("<Entry>Hello</Entry>"));
        assert!(xml.contains(r#"b64_encoded="true""#));
        // Empty group serializes as a childless element
        assert!(xml.contains(r#"<Group type="TAG2" data="" idx="1"/>"#));
    }

    #[test]
    fn test_empty_group_survives_roundtrip() {
        let doc = sample_document();
        let parsed = from_xml(&to_xml(&doc).unwrap()).unwrap();
        assert_eq!(parsed.groups.len(), 2);
        assert!(parsed.groups[1].entries.is_empty());
    }

    #[test]
    fn test_entry_text_with_markup_characters() {
        let doc = Document {
            header: Vec::new(),
            tags: tags(&["TAG1"]),
            groups: vec![EntryGroup {
                tag: "TAG1".to_string(),
                prefix: Vec::new(),
                entries: vec![Entry::Text {
                    text: "a < b & c".to_string(),
                    fallback: false,
                }],
            }],
        };
        let parsed = from_xml(&to_xml(&doc).unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_strict_boolean_rejects_other_literals() {
        let xml = r#"<root><doc><header tags="TAG1">SERFUAA=</header>
<Group type="TAG1" data="" idx="0"><Entry b64_encoded="True">gg==</Entry></Group>
</doc></root>"#;
        assert!(matches!(from_xml(xml), Err(TblError::Structure(_))));
    }

    #[test]
    fn test_entry_without_payload_or_text_is_malformed() {
        let xml = r#"<root><doc><header tags="TAG1">SERFUAA=</header>
<Group type="TAG1" data="" idx="0"><Entry></Entry></Group>
</doc></root>"#;
        assert!(matches!(
            from_xml(xml),
            Err(TblError::MalformedEntry { group: 0, entry: 0 })
        ));
    }

    #[test]
    fn test_group_without_type_is_structural_error() {
        let xml = r#"<root><doc><header/><Group data="" idx="0"/></doc></root>"#;
        assert!(matches!(from_xml(xml), Err(TblError::Structure(_))));
    }

    #[test]
    fn test_full_pipeline_byte_identity() {
        let data = b"\x10\x20ITEM\x00ITEMAB\x00Hello\x01World%s\x00ITEM\x00ITEM\x82\xF0\x00";
        let markers = tags(&["ITEM"]);

        let doc = TblParser::new().parse(data, &markers).unwrap();
        let xml = to_xml(&doc).unwrap();
        let edited = from_xml(&xml).unwrap();
        assert_eq!(edited, doc);

        let rebuilt = TblWriter::new().write(&edited).unwrap();
        assert_eq!(rebuilt, &data[..]);
    }
}
