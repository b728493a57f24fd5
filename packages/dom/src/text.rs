//! Character-offset helpers.
//!
//! Offsets throughout the tree count Unicode scalar values, not bytes, so a
//! selection over multi-byte text splits on character boundaries.

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the character at `chars`, clamped to `s.len()`.
pub fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

/// Substring by character range. Out-of-range bounds are clamped.
pub fn slice_chars(s: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(s, start);
    let to = byte_offset(s, end.max(start));
    &s[from..to]
}

/// True when `s` has no non-whitespace characters.
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
