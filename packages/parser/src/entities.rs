//! Character reference decoding and escaping

use std::borrow::Cow;

/// Decode named, decimal and hex character references.
/// Unknown references are kept verbatim.
pub fn decode(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        match after.find(';').and_then(|semi| {
            decode_reference(&after[1..semi]).map(|c| (c, semi))
        }) {
            Some((decoded, semi)) => {
                out.push(decoded);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Escape text content
pub fn escape_text(input: &str) -> Cow<'_, str> {
    escape(input, |c| matches!(c, '&' | '<' | '>'))
}

/// Escape a double-quoted attribute value
pub fn escape_attr(input: &str) -> Cow<'_, str> {
    escape(input, |c| matches!(c, '&' | '"' | '<'))
}

fn escape(input: &str, needs_escape: impl Fn(char) -> bool) -> Cow<'_, str> {
    if !input.chars().any(&needs_escape) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' if needs_escape('>') => out.push_str("&gt;"),
            '"' if needs_escape('"') => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}
