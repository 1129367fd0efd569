//! Character reference decoding and HTML escaping.

use std::borrow::Cow;

use pulldown_cmark_escape::{FmtWriter, escape_html, escape_html_body_text};

/// Escape text content: `&`, `<` and `>`.
pub fn escape_text(text: &str, out: &mut String) {
    let _ = escape_html_body_text(FmtWriter(&mut *out), text);
}

/// Escape an attribute value for use inside double quotes.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    let _ = escape_html(FmtWriter(&mut out), value);
    Cow::Owned(out)
}

/// Decode named (`amp lt gt quot apos nbsp`) and numeric character
/// references. Numeric references to NUL, to surrogates or past U+10FFFF
/// decode to U+FFFD. Unknown or malformed references are kept verbatim.
pub fn decode(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_one(rest) {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode the reference at the start of `s` (which begins with `&`).
fn decode_one(s: &str) -> Option<(char, usize)> {
    let semi = s[1..].find(';')? + 1;
    if semi > 32 {
        return None;
    }
    let body = &s[1..semi];
    let c = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let num = body.strip_prefix('#')?;
            let (digits, radix) = match num.strip_prefix(['x', 'X']) {
                Some(hex) => (hex, 16),
                None => (num, 10),
            };
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            u32::from_str_radix(digits, radix)
                .ok()
                .filter(|&code| code != 0)
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        }
    };
    Some((c, semi + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_and_numeric() {
        assert_eq!(
            decode("a &amp; b &lt;c&gt; &quot;&apos;&nbsp;"),
            "a & b <c> \"'\u{a0}"
        );
        assert_eq!(decode("&#65;&#x42;&#X43;"), "ABC");
    }

    #[test]
    fn invalid_code_points_become_replacement_chars() {
        assert_eq!(decode("a&#0;b"), "a\u{FFFD}b");
        assert_eq!(decode("&#xD800;&#xdfff;"), "\u{FFFD}\u{FFFD}");
        assert_eq!(decode("&#x110000;"), "\u{FFFD}");
        assert_eq!(decode("&#99999999999999;"), "\u{FFFD}");
        assert_eq!(decode("&#x10FFFF;"), "\u{10FFFF}");
        assert_eq!(decode("&#;&#x;"), "&#;&#x;");
    }

    #[test]
    fn keeps_unknown_references() {
        assert_eq!(decode("&copy; & &#xZZ; &"), "&copy; & &#xZZ; &");
    }

    #[test]
    fn borrowed_when_nothing_to_do() {
        assert!(matches!(decode("plain"), Cow::Borrowed(_)));
        assert!(matches!(escape_attribute("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut out = String::new();
        escape_text("a < b & \"c\"", &mut out);
        assert_eq!(out, "a &lt; b &amp; \"c\"");
        assert_eq!(escape_attribute("say \"hi\""), "say &quot;hi&quot;");
    }
}
