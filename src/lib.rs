//! # tbledit
//!
//! Lossless conversion between proprietary binary table (.tbl) resource
//! files and an editable XML document, so translators can change embedded
//! text without corrupting the binary control data around it.
//!
//! ## Table Format
//!
//! A .tbl file is a header blob followed by tagged groups:
//!
//! ```text
//! [header bytes][TAG][prefix bytes][entry bytes...][0x00]
//!               [TAG][prefix bytes][entry bytes...][0x00]
//!               ...
//! ```
//!
//! The tag markers come from the file's own header field (or are supplied
//! by the caller). Within a group, the binary prefix runs through the last
//! null byte of the section and the remainder is entry text: Shift-JIS
//! strings interleaved with control codes (cursor pairs, printf
//! specifiers, color escapes).
//!
//! ## Dual Representation
//!
//! Every byte span gets exactly one of two renditions:
//! - control codes and undecodable spans stay **opaque** (base64 in the
//!   XML document), preserved byte-for-byte
//! - everything else becomes **text**, decoded from Shift-JIS
//!
//! Spans that fail Shift-JIS decoding are carried as base64 with a
//! `b64_encoded` flag, so no input sequence is ever lost. The pipeline
//!
//! ```text
//! .tbl → TblParser → Document → to_xml → XML (edit) → from_xml → TblWriter → .tbl
//! ```
//!
//! reproduces the original file byte-for-byte when the text is unchanged.

pub mod codec;
pub mod document;
pub mod parser;
pub mod patterns;
pub mod writer;
pub mod xml;

pub use document::{Document, Entry, EntryGroup, TblError, TBL_SIGNATURE_LEN};
pub use parser::{discover_tag, TblParser};
pub use patterns::{control_patterns, ControlPatterns, CONTROL_PATTERNS};
pub use writer::{dump_text, TblWriter};
pub use xml::{from_xml, to_xml};
