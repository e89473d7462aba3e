#![forbid(unsafe_code)]

//! Raw input decoder.
//!
//! Turns the byte stream of a terminal in raw mode into [`KeyEvent`]s. The
//! decoder pulls bytes from a [`ByteSource`] whose reads time out after a
//! short window; that timeout is what separates a bare Escape from the start
//! of a CSI (`ESC [`) or SS3 (`ESC O`) sequence.
//!
//! # Recognized sequences
//!
//! | Bytes                 | Key      |
//! |-----------------------|----------|
//! | `ESC [ A/B/C/D`       | arrows   |
//! | `ESC [ H`, `ESC O H`  | Home     |
//! | `ESC [ F`, `ESC O F`  | End      |
//! | `ESC [ 1~`, `ESC [ 7~`| Home     |
//! | `ESC [ 4~`, `ESC [ 8~`| End      |
//! | `ESC [ 3~`            | Delete   |
//! | `ESC [ 5~`, `ESC [ 6~`| PgUp/PgDn|
//!
//! Anything else after ESC, including a timeout mid-sequence, decodes to a
//! bare [`KeyCode::Escape`].

use std::collections::VecDeque;
use std::io;

use crate::event::{KeyCode, KeyEvent};

const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;

/// Longest cursor position report accepted by [`parse_cursor_report`].
pub const MAX_REPORT_LEN: usize = 32;

/// A source of input bytes with a bounded wait per read.
pub trait ByteSource {
    /// Read a single byte.
    ///
    /// Returns `Ok(None)` when the read window elapsed without input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Scripted input: each `pop_front` is one byte, an empty queue is a timeout.
impl ByteSource for VecDeque<u8> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.pop_front())
    }
}

/// Decode the next key from `src`.
///
/// Returns `Ok(None)` if no byte arrived within one read window, which lets
/// callers interleave other checks (resize, termination) with key reads.
pub fn read_key<S: ByteSource + ?Sized>(src: &mut S) -> io::Result<Option<KeyEvent>> {
    let Some(byte) = src.read_byte()? else {
        return Ok(None);
    };
    let key = match byte {
        ESC => decode_escape(src)?,
        0x80.. => decode_utf8(src, byte)?,
        _ => decode_byte(byte),
    };
    Ok(Some(key))
}

fn decode_byte(byte: u8) -> KeyEvent {
    match byte {
        b'\r' => KeyEvent::new(KeyCode::Enter),
        b'\t' => KeyEvent::new(KeyCode::Tab),
        0x08 | DEL => KeyEvent::new(KeyCode::Backspace),
        0x00 => KeyEvent::new(KeyCode::Null),
        0x01..=0x1a => KeyEvent::ctrl_char(char::from(b'a' + byte - 1)),
        0x1c..=0x1f => KeyEvent::ctrl_char(char::from(byte + 0x40)),
        _ => KeyEvent::char(char::from(byte)),
    }
}

fn decode_escape<S: ByteSource + ?Sized>(src: &mut S) -> io::Result<KeyEvent> {
    let escape = KeyEvent::new(KeyCode::Escape);
    let Some(first) = src.read_byte()? else {
        return Ok(escape);
    };
    let Some(second) = src.read_byte()? else {
        return Ok(escape);
    };

    let code = match (first, second) {
        (b'[', b'0'..=b'9') => {
            let Some(b'~') = src.read_byte()? else {
                return Ok(escape);
            };
            match second {
                b'1' | b'7' => KeyCode::Home,
                b'3' => KeyCode::Delete,
                b'4' | b'8' => KeyCode::End,
                b'5' => KeyCode::PageUp,
                b'6' => KeyCode::PageDown,
                _ => KeyCode::Escape,
            }
        }
        (b'[' | b'O', b'A') => KeyCode::Up,
        (b'[' | b'O', b'B') => KeyCode::Down,
        (b'[' | b'O', b'C') => KeyCode::Right,
        (b'[' | b'O', b'D') => KeyCode::Left,
        (b'[' | b'O', b'H') => KeyCode::Home,
        (b'[' | b'O', b'F') => KeyCode::End,
        _ => KeyCode::Escape,
    };
    Ok(KeyEvent::new(code))
}

fn decode_utf8<S: ByteSource + ?Sized>(src: &mut S, lead: u8) -> io::Result<KeyEvent> {
    let width = match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return Ok(KeyEvent::char(char::REPLACEMENT_CHARACTER)),
    };
    let mut buf = [lead, 0, 0, 0];
    for slot in buf.iter_mut().take(width).skip(1) {
        match src.read_byte()? {
            Some(b) if b & 0xc0 == 0x80 => *slot = b,
            _ => return Ok(KeyEvent::char(char::REPLACEMENT_CHARACTER)),
        }
    }
    let c = std::str::from_utf8(&buf[..width])
        .ok()
        .and_then(|s| s.chars().next())
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Ok(KeyEvent::char(c))
}

/// Parse the body of a cursor position report (`ESC [ rows ; cols`).
///
/// The terminating `R` must already be stripped. Returns 1-based
/// `(rows, cols)`.
#[must_use]
pub fn parse_cursor_report(report: &[u8]) -> Option<(u16, u16)> {
    let body = report.strip_prefix(&[ESC, b'['])?;
    let body = std::str::from_utf8(body).ok()?;
    let (rows, cols) = body.split_once(';')?;
    Some((rows.parse().ok()?, cols.parse().ok()?))
}
