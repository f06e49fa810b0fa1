//! XML Entity Decoding
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text or attribute content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy). Unknown named
/// entities are kept verbatim; a malformed character reference is an error.
#[inline]
pub fn decode_text(input: &str) -> Result<Cow<'_, str>, &'static str> {
    // Fast path: check if there are any entities using SIMD
    if memchr(b'&', input.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_entities(input).map(Cow::Owned)
}

fn decode_entities(input: &str) -> Result<String, &'static str> {
    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp_offset) = memchr(b'&', &bytes[pos..]) {
        result.push_str(&input[pos..pos + amp_offset]);
        pos += amp_offset;

        // '&' and ';' are ASCII, so both slice ends are char boundaries
        let Some(semi_offset) = memchr(b';', &bytes[pos..]) else {
            result.push('&');
            pos += 1;
            continue;
        };
        match decode_entity(&input[pos + 1..pos + semi_offset])? {
            Some(c) => {
                result.push(c);
                pos += semi_offset + 1;
            }
            None => {
                result.push('&');
                pos += 1;
            }
        }
    }
    result.push_str(&input[pos..]);
    Ok(result)
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &str) -> Result<Option<char>, &'static str> {
    if let Some(numeric) = entity.strip_prefix('#') {
        return decode_numeric_entity(numeric)
            .map(Some)
            .ok_or("invalid character reference");
    }
    Ok(match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    })
}

/// Decode a numeric character reference body: `123` or `x7B`
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let codepoint = match entity.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => entity.parse::<u32>().ok()?,
    };
    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities_borrowed() {
        assert!(matches!(decode_text("plain text"), Ok(Cow::Borrowed("plain text"))));
    }

    #[test]
    fn test_builtin_entities() {
        assert_eq!(decode_text("&lt;a&gt; &amp; &quot;b&apos;").unwrap(), "<a> & \"b'");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_text("&#65;&#x42;&#X43;").unwrap(), "ABC");
        assert_eq!(decode_text("&#x1F600;").unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_unknown_and_unterminated_kept() {
        assert_eq!(decode_text("&custom; & more").unwrap(), "&custom; & more");
    }

    #[test]
    fn test_invalid_character_reference() {
        assert!(decode_text("&#0;").is_err());
        assert!(decode_text("&#xZZ;").is_err());
        assert!(decode_text("&#xD800;").is_err());
    }
}
