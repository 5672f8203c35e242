//! Text codec for entry spans
//!
//! Entry text in a .tbl file is Shift-JIS. Spans that do not form a valid
//! Shift-JIS sequence are carried as base64 so that no byte is ever lost;
//! the flag travels with the entry and back through [`encode`].

use crate::document::TblError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use encoding_rs::SHIFT_JIS;

/// Decode a raw byte span to display text.
///
/// Returns the decoded string and `false` on a clean Shift-JIS decode, or
/// a base64 rendition of the original bytes and `true` when the span is
/// not valid Shift-JIS.
pub fn decode(raw: &[u8]) -> (String, bool) {
    match SHIFT_JIS.decode_without_bom_handling_and_without_replacement(raw) {
        Some(text) => (text.into_owned(), false),
        None => (STANDARD.encode(raw), true),
    }
}

/// Exact inverse of [`decode`]: recover the original byte span.
///
/// # Errors
/// Fails on a corrupt base64 payload, or on text containing characters
/// with no Shift-JIS mapping (both can only happen after a human edit).
pub fn encode(text: &str, fallback: bool) -> Result<Vec<u8>, TblError> {
    if fallback {
        STANDARD
            .decode(text)
            .map_err(|e| TblError::Encoding(format!("invalid base64 payload: {}", e)))
    } else {
        let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
        if had_errors {
            return Err(TblError::Encoding(format!(
                "text not representable in Shift-JIS: {:?}",
                text
            )));
        }
        Ok(bytes.into_owned())
    }
}
