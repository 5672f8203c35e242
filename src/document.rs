//! Table document data structures

use crate::codec;

/// Number of signature bytes preceding the tag field in a .tbl file
pub const TBL_SIGNATURE_LEN: usize = 2;

/// A parsed .tbl file: opaque header bytes followed by tagged entry groups.
///
/// `tags` records the marker list the file was parsed with, so a serialized
/// document can be turned back into a table without re-discovering markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Raw bytes preceding the first tag marker
    pub header: Vec<u8>,
    /// Tag markers supplied to (or discovered by) the parser
    pub tags: Vec<String>,
    /// Entry groups in file order
    pub groups: Vec<EntryGroup>,
}

/// One tagged section of a .tbl file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryGroup {
    /// The tag marker that introduced this group
    pub tag: String,
    /// Opaque bytes between the marker and the group's text region.
    /// Runs through the last null byte of the section body; preserved
    /// byte-for-byte, never interpreted as text.
    pub prefix: Vec<u8>,
    /// Entries in on-disk order (order defines reconstruction order)
    pub entries: Vec<Entry>,
}

/// One unit of group content: translatable text or an opaque control code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A byte span matching a control-code pattern; kept verbatim
    Opaque { data: Vec<u8> },
    /// A decoded text span. When `fallback` is set the span was not valid
    /// Shift-JIS and `text` holds a base64 rendition of the raw bytes.
    Text { text: String, fallback: bool },
}

impl Entry {
    /// The canonical on-disk byte form of this entry.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TblError> {
        match self {
            Entry::Opaque { data } => Ok(data.clone()),
            Entry::Text { text, fallback } => codec::encode(text, *fallback),
        }
    }

    /// Whether this entry carries human-editable text
    pub fn is_text(&self) -> bool {
        matches!(self, Entry::Text { .. })
    }
}

/// Error type for table parsing, reassembly and XML conversion
#[derive(Debug)]
pub enum TblError {
    /// The file or document violates the expected structure (entry data
    /// without a preceding tag marker, bad tag field, invalid attribute)
    Structure(String),

    /// An XML entry element carries neither a payload nor text content.
    /// Guessing here would corrupt the binary file, so this is fatal.
    MalformedEntry { group: usize, entry: usize },

    /// Text could not be converted back to bytes (unmappable characters
    /// after an edit, or a corrupt base64 payload)
    Encoding(String),

    /// XML read or write error
    Xml(quick_xml::Error),

    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for TblError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TblError::Structure(msg) => {
                write!(f, "Structural error: {}", msg)
            }
            TblError::MalformedEntry { group, entry } => {
                write!(
                    f,
                    "Malformed entry {} in group {}: neither payload nor text",
                    entry, group
                )
            }
            TblError::Encoding(msg) => {
                write!(f, "Encoding error: {}", msg)
            }
            TblError::Xml(err) => {
                write!(f, "XML error: {}", err)
            }
            TblError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for TblError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TblError::Xml(err) => Some(err),
            TblError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TblError {
    fn from(err: std::io::Error) -> Self {
        TblError::Io(err)
    }
}

impl From<quick_xml::Error> for TblError {
    fn from(err: quick_xml::Error) -> Self {
        TblError::Xml(err)
    }
}

impl From<quick_xml::events::attributes::AttrError> for TblError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        TblError::Xml(quick_xml::Error::InvalidAttr(err))
    }
}
