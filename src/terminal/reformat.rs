//! Pending-input reformatting.
//!
//! Keeps the on-screen pending input canonical under two triggers: live
//! keystrokes in hex mode (strip, uppercase, regroup into byte pairs
//! while keeping the caret anchored to the same logical digit) and
//! display-mode switches (decode under the old mode, re-encode under the
//! new one so a partially typed payload survives the toggle).

use crate::terminal::codec;
use crate::terminal::types::{DisplayMode, TerminalError};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Live keystroke reformat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Reformat free-form hex input into canonical grouping.
///
/// Every character that is not a hex digit is stripped, the rest is
/// uppercased and a single space is inserted before every second digit,
/// so typing `1 2 3 4 5` displays `1`, `12`, `12 3`, `12 34`, `12 34 5`.
/// The returned cursor is positioned after the same number of hex digits
/// that preceded `cursor` in `raw`, so the caret does not jump when
/// spaces move around it.
pub fn reformat_hex(raw: &str, cursor: usize) -> (String, usize) {
    let cursor = cursor.min(raw.chars().count());
    let digits_before = raw
        .chars()
        .take(cursor)
        .filter(char::is_ascii_hexdigit)
        .count();

    let mut display = String::with_capacity(raw.len() + raw.len() / 2);
    let mut digits = 0usize;
    for c in raw.chars().filter(char::is_ascii_hexdigit) {
        if digits > 0 && digits % 2 == 0 {
            display.push(' ');
        }
        display.push(c.to_ascii_uppercase());
        digits += 1;
    }

    (display, display_offset(digits_before))
}

/// Display offset of the caret sitting after `digits` hex digits.
fn display_offset(digits: usize) -> usize {
    if digits == 0 {
        0
    } else {
        digits + (digits - 1) / 2
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Mode-switch reformat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bytes represented by hex-mode pending input.
///
/// Live reformatting guarantees the text is hex digits and spaces only,
/// but a lone trailing digit is legal while typing; that incomplete byte
/// is not part of the payload yet and is dropped.
pub fn hex_pending_bytes(text: &str) -> Result<Vec<u8>, TerminalError> {
    let mut cleaned: String = text.chars().filter(char::is_ascii_hexdigit).collect();
    if cleaned.len() % 2 != 0 {
        cleaned.pop();
    }
    codec::decode_hex(&cleaned)
}

/// Bytes represented by pending input under the given mode.
pub fn pending_bytes(mode: DisplayMode, text: &str) -> Result<Vec<u8>, TerminalError> {
    match mode {
        DisplayMode::Hex => hex_pending_bytes(text),
        DisplayMode::Text => codec::decode_text(text),
    }
}

/// Re-render pending input for a display-mode switch.
///
/// Decodes `text` under `from` and re-encodes it under `to`; the cursor
/// lands at the end of the re-rendered text.  Text-mode input holding a
/// character with no single-byte representation rejects the switch with
/// `InvalidEncoding`; the caller must leave mode and input untouched.
pub fn reformat_for_mode_switch(
    from: DisplayMode,
    to: DisplayMode,
    text: &str,
) -> Result<(String, usize), TerminalError> {
    let bytes = pending_bytes(from, text)?;
    let display = codec::encode(&bytes, to);
    let cursor = display.chars().count();
    Ok((display, cursor))
}
