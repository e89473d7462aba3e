#![forbid(unsafe_code)]

//! ANSI escape sequence helpers.
//!
//! Pure byte generation; callers own any state tracking.
//!
//! | Sequence | Meaning |
//! |----------|---------|
//! | `ESC [ n m` | SGR color / attribute |
//! | `ESC [ row ; col H` | cursor position (1-indexed) |
//! | `ESC [ 0 K` | erase to end of line |
//! | `ESC [ 2 J` | erase screen |
//! | `ESC [ ? 25 l/h` | hide / show cursor |

use std::io::{self, Write};

use vilo_text::HighlightClass;

// =============================================================================
// SGR
// =============================================================================

/// SGR reset: `CSI 0 m`
pub const SGR_RESET: &[u8] = b"\x1b[0m";

/// Reverse video on: `CSI 7 m`
pub const SGR_REVERSE_ON: &[u8] = b"\x1b[7m";

/// Reverse video off: `CSI 27 m`
pub const SGR_REVERSE_OFF: &[u8] = b"\x1b[27m";

/// Default foreground: `CSI 39 m`
pub const SGR_FG_DEFAULT: &[u8] = b"\x1b[39m";

/// Write a single SGR code, e.g. `31` → `CSI 31 m`.
pub fn sgr<W: Write>(w: &mut W, code: u8) -> io::Result<()> {
    write!(w, "\x1b[{code}m")
}

/// Foreground color for a highlight class. `None` means the terminal default.
#[must_use]
pub const fn color_for(class: HighlightClass) -> Option<u8> {
    match class {
        HighlightClass::Normal | HighlightClass::NonPrint => None,
        HighlightClass::Comment | HighlightClass::MlComment => Some(36),
        HighlightClass::Keyword1 => Some(33),
        HighlightClass::Keyword2 => Some(32),
        HighlightClass::String => Some(35),
        HighlightClass::Number => Some(31),
        HighlightClass::Match => Some(34),
    }
}

// =============================================================================
// Cursor and erase
// =============================================================================

/// Hide cursor: `CSI ? 25 l`
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Show cursor: `CSI ? 25 h`
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

/// Cursor to top-left: `CSI H`
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// Erase the whole screen: `CSI 2 J`
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Erase from cursor to end of line: `CSI 0 K`
pub const ERASE_TO_EOL: &[u8] = b"\x1b[0K";

/// CUP (Cursor Position): `CSI row ; col H`.
///
/// Takes 0-indexed coordinates and emits 1-indexed ones.
pub fn cup<W: Write>(w: &mut W, row: usize, col: usize) -> io::Result<()> {
    write!(
        w,
        "\x1b[{};{}H",
        row.saturating_add(1),
        col.saturating_add(1)
    )
}
