//! Table parser: raw .tbl bytes to [`Document`]

use crate::codec;
use crate::document::{Document, Entry, EntryGroup, TblError, TBL_SIGNATURE_LEN};
use crate::patterns::{control_patterns, ControlPatterns};

use regex::bytes::Regex;
use std::io::Read;
use std::path::Path;

/// Longest header region scanned for the tag field
const TAG_FIELD_MAX_LEN: usize = 200;

/// Splits a raw table buffer into a header and tagged entry groups
pub struct TblParser {
    patterns: &'static ControlPatterns,
}

impl TblParser {
    /// Create a parser over the process-wide control-code pattern table
    pub fn new() -> Self {
        Self {
            patterns: control_patterns(),
        }
    }

    /// Parse raw table bytes with the given tag markers.
    ///
    /// Everything before the first marker occurrence becomes the header.
    /// Each marker occurrence opens a group; the bytes up to the next
    /// marker (or end of file) are split into the group's binary prefix
    /// and its entry text by the last-null boundary rule.
    ///
    /// # Errors
    /// Fails on an empty or unusable marker list, or on entry data that is
    /// not preceded by a tag marker.
    pub fn parse(&self, data: &[u8], tags: &[String]) -> Result<Document, TblError> {
        if tags.is_empty() || tags.iter().any(|t| t.is_empty()) {
            return Err(TblError::Structure(
                "tag marker list is empty or contains an empty marker".to_string(),
            ));
        }

        let segments = split_on_tags(data, tags)?;

        let mut doc = Document {
            header: segments[0].bytes.to_vec(),
            tags: tags.to_vec(),
            groups: Vec::new(),
        };

        let mut pending_tag: Option<String> = None;
        for segment in &segments[1..] {
            if segment.is_marker {
                pending_tag = tags
                    .iter()
                    .find(|t| t.as_bytes() == segment.bytes)
                    .cloned();
                continue;
            }

            let tag = pending_tag.take().ok_or_else(|| {
                TblError::Structure("entry data without a preceding tag marker".to_string())
            })?;

            let (prefix, raw_text) = split_group_segment(segment.bytes);
            doc.groups.push(EntryGroup {
                tag,
                prefix: prefix.to_vec(),
                entries: self.parse_entries(raw_text),
            });
        }

        tracing::debug!(
            groups = doc.groups.len(),
            header_len = doc.header.len(),
            "parsed table"
        );
        Ok(doc)
    }

    /// Split a group's text region into entries: control-code matches stay
    /// opaque, everything else goes through the text codec. Empty segments
    /// contribute no entry.
    fn parse_entries(&self, raw_text: &[u8]) -> Vec<Entry> {
        let mut entries = Vec::new();
        for piece in self.patterns.split(raw_text) {
            if piece.is_empty() {
                continue;
            }
            if self.patterns.is_control(piece) {
                entries.push(Entry::Opaque {
                    data: piece.to_vec(),
                });
            } else {
                let (text, fallback) = codec::decode(piece);
                entries.push(Entry::Text { text, fallback });
            }
        }
        entries
    }
}

impl Default for TblParser {
    fn default() -> Self {
        Self::new()
    }
}

struct Segment<'a> {
    bytes: &'a [u8],
    is_marker: bool,
}

/// Split `data` on tag-marker occurrences, keeping each marker as its own
/// segment. Gap segments are kept even when empty so that a marker at the
/// start or end of the buffer still produces its (possibly empty) group
/// body. Leftmost occurrence wins; at equal positions the earlier marker
/// in `tags` wins.
fn split_on_tags<'a>(data: &'a [u8], tags: &[String]) -> Result<Vec<Segment<'a>>, TblError> {
    let pattern = tags
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let marker_re = Regex::new(&pattern)
        .map_err(|e| TblError::Structure(format!("unusable tag marker list: {}", e)))?;

    let mut segments = Vec::new();
    let mut last = 0;
    for m in marker_re.find_iter(data) {
        segments.push(Segment {
            bytes: &data[last..m.start()],
            is_marker: false,
        });
        segments.push(Segment {
            bytes: &data[m.start()..m.end()],
            is_marker: true,
        });
        last = m.end();
    }
    segments.push(Segment {
        bytes: &data[last..],
        is_marker: false,
    });
    Ok(segments)
}

/// The last-null boundary rule: within a group segment, `prefix` runs
/// through the last null byte of the body (the segment minus its final
/// terminator byte) and the remainder minus the terminator is the text
/// region. The rule is a fixed contract of the file format; do not
/// simplify it.
fn split_group_segment(segment: &[u8]) -> (&[u8], &[u8]) {
    if segment.is_empty() {
        return (&[], &[]);
    }
    let body = &segment[..segment.len() - 1];
    let text_start = body.iter().rposition(|&b| b == 0).map_or(0, |p| p + 1);
    (&segment[..text_start], &segment[text_start..segment.len() - 1])
}

/// Read the tag marker a .tbl file declares about itself: the
/// null-terminated field following the signature bytes.
///
/// # Errors
/// Fails if the file is shorter than the signature, the field has no null
/// terminator within the scanned region, or the field is not valid UTF-8.
pub fn discover_tag<P: AsRef<Path>>(path: P) -> Result<String, TblError> {
    let mut head = Vec::new();
    std::fs::File::open(path.as_ref())?
        .take(TAG_FIELD_MAX_LEN as u64)
        .read_to_end(&mut head)?;

    if head.len() < TBL_SIGNATURE_LEN {
        return Err(TblError::Structure(format!(
            "file too short for a table signature: {} bytes",
            head.len()
        )));
    }

    let field = &head[TBL_SIGNATURE_LEN..];
    let end = field.iter().position(|&b| b == 0).ok_or_else(|| {
        TblError::Structure(format!(
            "no tag terminator within the first {} bytes",
            TAG_FIELD_MAX_LEN
        ))
    })?;

    let tag = std::str::from_utf8(&field[..end])
        .map_err(|_| TblError::Structure("tag field is not valid UTF-8".to_string()))?;
    if tag.is_empty() {
        return Err(TblError::Structure("tag field is empty".to_string()));
    }

    tracing::debug!(tag, "discovered tag marker");
    Ok(tag.to_string())
}
