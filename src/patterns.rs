//! Control-code pattern table
//!
//! Byte sequences matching any of these patterns are embedded control codes
//! (cursor movement, printf specifiers, color escapes) and must never be
//! treated as translatable text. The table is a fixed policy: patterns are
//! tried in declaration order and the earliest match wins.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Control-code patterns, in precedence order.
///
/// Compiled with Unicode mode off so classes and `.` operate on raw bytes
/// (`.` matches any byte except 0x0A). The shapes are:
/// lead byte 0xE0-0xEF plus up to two bytes, a two-byte pair ending in
/// 0x01, printf `%s`/`%d`, a decimal-count `#..C` escape, and a
/// hex-digit `#..` escape.
pub const CONTROL_PATTERNS: [&str; 5] = [
    r"[\xE0-\xEF].?.?",
    r".?\x01",
    r"%[ds]",
    r"#[0-9]*C",
    r"#[0-9a-f]*",
];

/// Compiled form of [`CONTROL_PATTERNS`]: one alternation for splitting,
/// one start-anchored regex per pattern for classification.
#[derive(Debug)]
pub struct ControlPatterns {
    splitter: Regex,
    anchored: Vec<Regex>,
}

static CONTROL_SET: Lazy<ControlPatterns> = Lazy::new(ControlPatterns::compile);

/// The process-wide pattern table. Read-only; callers hold it by reference.
pub fn control_patterns() -> &'static ControlPatterns {
    &CONTROL_SET
}

impl ControlPatterns {
    fn compile() -> Self {
        // The regex engine's leftmost-first alternation gives the required
        // precedence: at any position, the earliest-declared pattern wins.
        let splitter = Regex::new(&format!("(?-u){}", CONTROL_PATTERNS.join("|")))
            .expect("control pattern table must compile");
        let anchored = CONTROL_PATTERNS
            .iter()
            .map(|p| {
                Regex::new(&format!(r"(?-u)\A(?:{})", p))
                    .expect("control pattern table must compile")
            })
            .collect();
        Self { splitter, anchored }
    }

    /// Index of the first pattern matching at the start of `span`, if any.
    pub fn match_index(&self, span: &[u8]) -> Option<usize> {
        self.anchored.iter().position(|re| re.is_match(span))
    }

    /// Whether `span` begins with a control code
    pub fn is_control(&self, span: &[u8]) -> bool {
        self.match_index(span).is_some()
    }

    /// Split `haystack` on control-code occurrences, retaining each match
    /// as its own segment. Empty segments between adjacent matches (and at
    /// either end) are kept; callers drop them.
    pub fn split<'h>(&self, haystack: &'h [u8]) -> Vec<&'h [u8]> {
        let mut parts = Vec::new();
        let mut last = 0;
        for m in self.splitter.find_iter(haystack) {
            parts.push(&haystack[last..m.start()]);
            parts.push(&haystack[m.start()..m.end()]);
            last = m.end();
        }
        parts.push(&haystack[last..]);
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_earliest_pattern_wins() {
        // "#12C" matches both the decimal-count escape (index 3) and the
        // hex escape (index 4); classification must pick index 3.
        let set = control_patterns();
        assert_eq!(set.match_index(b"#12C"), Some(3));
        // "#ab" only matches the hex escape
        assert_eq!(set.match_index(b"#ab"), Some(4));
        assert_eq!(set.match_index(b"%s"), Some(2));
        assert_eq!(set.match_index(b"plain text"), None);
    }

    #[test]
    fn test_high_byte_escape_consumes_up_to_two_bytes() {
        let set = control_patterns();
        let parts = set.split(b"A\xE5XYZB");
        assert_eq!(parts, vec![&b"A"[..], b"\xE5XY", b"ZB"]);
    }

    #[test]
    fn test_high_byte_escape_stops_at_newline() {
        // `.` does not cross 0x0A, so a lead byte before a newline matches
        // alone.
        let set = control_patterns();
        let parts = set.split(b"\xE5\nAB");
        assert_eq!(parts, vec![&b""[..], b"\xE5", b"\nAB"]);
    }

    #[test]
    fn test_control_pair_takes_preceding_byte() {
        let set = control_patterns();
        let parts = set.split(b"Hello\x01World");
        assert_eq!(parts, vec![&b"Hell"[..], b"o\x01", b"World"]);
        assert!(set.is_control(b"o\x01"));
        assert!(!set.is_control(b"Hell"));
    }

    #[test]
    fn test_split_retains_matches_and_empty_gaps() {
        let set = control_patterns();
        // Adjacent matches keep the empty gap between them
        let parts = set.split(b"%s%d");
        assert_eq!(parts, vec![&b""[..], b"%s", b"", b"%d", b""]);
    }

    #[test]
    fn test_split_without_matches_is_identity() {
        let set = control_patterns();
        assert_eq!(set.split(b"just text"), vec![&b"just text"[..]]);
    }
}
