//! Byte payload ⇄ display text conversion.
//!
//! Two projections exist: hex (uppercase two-digit pairs, single-space
//! separated) and text (Latin-1 characters with carriage returns and
//! backslashes escaped so payloads stay on one editable line).  Both
//! round-trip exactly: `decode(encode(b, m), m) == b` for every byte
//! sequence `b` and both modes.  Mode switching and history recall
//! depend on this holding without exception.

use crate::terminal::types::{DisplayMode, TerminalError};

/// Encode a byte payload for display under the given mode.
pub fn encode(data: &[u8], mode: DisplayMode) -> String {
    match mode {
        DisplayMode::Hex => encode_hex(data),
        DisplayMode::Text => encode_text(data),
    }
}

/// Decode display text back into payload bytes under the given mode.
pub fn decode(text: &str, mode: DisplayMode) -> Result<Vec<u8>, TerminalError> {
    match mode {
        DisplayMode::Hex => decode_hex(text),
        DisplayMode::Text => decode_text(text),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Hex mode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render bytes as uppercase hex pairs separated by single spaces.
pub fn encode_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a spaced hex string back into bytes.
///
/// All whitespace is stripped first; the remainder must be an even-length
/// stream of hex digits.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, TerminalError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if let Some(bad) = cleaned.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(TerminalError::invalid_encoding(format!(
            "invalid hex character {:?}",
            bad
        )));
    }
    if cleaned.len() % 2 != 0 {
        return Err(TerminalError::invalid_encoding(format!(
            "odd number of hex digits ({})",
            cleaned.len()
        )));
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&cleaned[i..i + 2], 16).map_err(|e| {
                TerminalError::invalid_encoding(format!("invalid hex at position {}: {}", i, e))
            })
        })
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Text mode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render bytes as Latin-1 text.
///
/// A carriage return (0x0D) becomes the two-character escape `\r` so a
/// multi-line-looking payload stays on one editable line, and a literal
/// backslash becomes `\\` to keep the escape unambiguous on decode.
pub fn encode_text(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &b in data {
        match b {
            0x0D => out.push_str("\\r"),
            b'\\' => out.push_str("\\\\"),
            _ => out.push(char::from(b)),
        }
    }
    out
}

/// Parse Latin-1 text back into bytes.
///
/// `\r` unescapes to 0x0D and `\\` to a literal backslash; a backslash
/// followed by anything else is taken literally.  Characters above U+00FF
/// have no single-byte representation and reject the input.
pub fn decode_text(text: &str) -> Result<Vec<u8>, TerminalError> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('r') => {
                    chars.next();
                    out.push(0x0D);
                }
                Some('\\') => {
                    chars.next();
                    out.push(b'\\');
                }
                _ => out.push(b'\\'),
            }
        } else {
            let code = c as u32;
            if code > 0xFF {
                return Err(TerminalError::invalid_encoding(format!(
                    "character {:?} (U+{:04X}) is outside the single-byte range",
                    c, code
                )));
            }
            out.push(code as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_hex_spacing() {
        assert_eq!(encode_hex(&[0xDE, 0xAD, 0xBE, 0xEF]), "DE AD BE EF");
        assert_eq!(encode_hex(&[0x00]), "00");
        assert_eq!(encode_hex(&[]), "");
    }

    #[test]
    fn test_decode_hex_strips_whitespace() {
        assert_eq!(decode_hex("DE AD").unwrap(), vec![0xDE, 0xAD]);
        assert_eq!(decode_hex("de\tad\n be").unwrap(), vec![0xDE, 0xAD, 0xBE]);
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_hex_odd_length_rejected() {
        let err = decode_hex("12 3").unwrap_err();
        assert_eq!(err.kind, crate::terminal::types::TerminalErrorKind::InvalidEncoding);
    }

    #[test]
    fn test_decode_hex_bad_character_rejected() {
        let err = decode_hex("12 GG").unwrap_err();
        assert_eq!(err.kind, crate::terminal::types::TerminalErrorKind::InvalidEncoding);
        assert!(err.message.contains("'G'"));
    }

    #[test]
    fn test_hex_roundtrip_all_byte_values() {
        let data: Vec<u8> = (0..=255).collect();
        let encoded = encode(&data, DisplayMode::Hex);
        assert_eq!(decode(&encoded, DisplayMode::Hex).unwrap(), data);
    }

    #[test]
    fn test_encode_text_escapes_cr() {
        assert_eq!(encode_text(b"AB\r"), "AB\\r");
        assert_eq!(encode_text(b"\r\r"), "\\r\\r");
    }

    #[test]
    fn test_encode_text_escapes_backslash() {
        assert_eq!(encode_text(b"a\\b"), "a\\\\b");
    }

    #[test]
    fn test_decode_text_unescapes() {
        assert_eq!(decode_text("AB\\r").unwrap(), b"AB\r");
        assert_eq!(decode_text("\\\\r").unwrap(), b"\\r");
        // Trailing lone backslash is literal.
        assert_eq!(decode_text("ok\\").unwrap(), b"ok\\");
        // Backslash before an unrecognized escape char is literal.
        assert_eq!(decode_text("\\n").unwrap(), b"\\n");
    }

    #[test]
    fn test_decode_text_rejects_wide_characters() {
        let err = decode_text("héllo\u{1F600}").unwrap_err();
        assert_eq!(err.kind, crate::terminal::types::TerminalErrorKind::InvalidEncoding);
    }

    #[test]
    fn test_decode_text_accepts_latin1_upper_half() {
        assert_eq!(decode_text("é").unwrap(), vec![0xE9]);
        assert_eq!(encode_text(&[0xE9]), "é");
    }

    #[test]
    fn test_text_roundtrip_all_byte_values() {
        let data: Vec<u8> = (0..=255).collect();
        let encoded = encode(&data, DisplayMode::Text);
        assert_eq!(decode(&encoded, DisplayMode::Text).unwrap(), data);
    }

    #[test]
    fn test_text_roundtrip_literal_backslash_r_bytes() {
        // The payload 5C 72 must not collapse into a carriage return.
        let data = vec![0x5C, 0x72];
        let encoded = encode(&data, DisplayMode::Text);
        assert_eq!(encoded, "\\\\r");
        assert_eq!(decode(&encoded, DisplayMode::Text).unwrap(), data);
    }

    #[test]
    fn test_mode_switch_fidelity() {
        // Hex → text → hex reproduces the identical hex string.
        let data = vec![0x41, 0x42, 0x0D, 0x5C, 0xFF];
        let hex1 = encode(&data, DisplayMode::Hex);
        let text = encode(&decode(&hex1, DisplayMode::Hex).unwrap(), DisplayMode::Text);
        let hex2 = encode(&decode(&text, DisplayMode::Text).unwrap(), DisplayMode::Hex);
        assert_eq!(hex1, hex2);
    }
}
