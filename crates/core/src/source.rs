//! Source text helpers: excerpt slicing, offset-to-line mapping and solc's
//! `"start:length:fileIndex"` location strings.
//!
//! Offsets are byte offsets into the UTF-8 file text, which is what solc
//! reports.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// File path (as displayed in reports) -> full UTF-8 text.
pub type SourceTexts = BTreeMap<String, String>;

/// Extract `length` bytes of `text` starting at `start`.
///
/// Returns an empty excerpt when `start` or `length` is zero or `start` lies
/// past the end of the text. An empty excerpt means "unavailable": callers
/// must not read it as "no signals present". The end is clamped to the text
/// length; a range that splits a multi-byte character is decoded lossily
/// rather than rejected.
pub fn slice(text: &str, start: usize, length: usize) -> Cow<'_, str> {
    if start == 0 || length == 0 || start >= text.len() {
        return Cow::Borrowed("");
    }
    let end = text.len().min(start.saturating_add(length));
    match text.get(start..end) {
        Some(excerpt) => Cow::Borrowed(excerpt),
        None => String::from_utf8_lossy(&text.as_bytes()[start..end]),
    }
}

/// 1-based line number of byte `offset`; `1` for an unknown (zero) offset.
pub fn offset_to_line(text: &str, offset: usize) -> usize {
    if offset == 0 {
        return 1;
    }
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Parse solc's `"start:length:fileIndex"` into `(start, length)`.
///
/// Anything malformed, including solc's `-1` placeholders, yields `(0, 0)`.
pub fn parse_src_triplet(src: &str) -> (usize, usize) {
    let parts: Vec<&str> = src.split(':').collect();
    if parts.len() != 3 {
        return (0, 0);
    }
    match (parts[0].trim().parse::<usize>(), parts[1].trim().parse::<usize>()) {
        (Ok(start), Ok(length)) => (start, length),
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_returns_empty_for_unavailable_ranges() {
        let text = "abcdef";
        assert_eq!(slice(text, 0, 5), "");
        assert_eq!(slice(text, 3, 0), "");
        assert_eq!(slice(text, text.len() + 1, 10), "");
        assert_eq!(slice(text, text.len(), 1), "");
    }

    #[test]
    fn slice_extracts_and_clamps() {
        assert_eq!(slice("abcdef", 2, 3), "cde");
        assert_eq!(slice("abcdef", 4, 100), "ef");
    }

    #[test]
    fn slice_tolerates_split_characters() {
        // "é" is two bytes; start in the middle of it.
        let text = "aé bc";
        assert_eq!(slice(text, 2, 3), "\u{FFFD} b");
    }

    #[test]
    fn offset_to_line_counts_newlines() {
        let text = "line1\nline2\nline3";
        assert_eq!(offset_to_line(text, 0), 1);
        assert_eq!(offset_to_line(text, 3), 1);
        assert_eq!(offset_to_line(text, 6), 2);
        assert_eq!(offset_to_line(text, 12), 3);
        assert_eq!(offset_to_line(text, 10_000), 3);
    }

    #[test]
    fn parse_src_triplet_defaults_on_malformed() {
        assert_eq!(parse_src_triplet("120:45:0"), (120, 45));
        assert_eq!(parse_src_triplet("-1:-1:-1"), (0, 0));
        assert_eq!(parse_src_triplet("12:4"), (0, 0));
        assert_eq!(parse_src_triplet("abc:4:0"), (0, 0));
        assert_eq!(parse_src_triplet(""), (0, 0));
    }
}
