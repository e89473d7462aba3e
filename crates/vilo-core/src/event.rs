#![forbid(unsafe_code)]

//! Logical key events.
//!
//! Raw terminal bytes are decoded by [`crate::input`] into these types. The
//! modal engine only ever sees a [`KeyEvent`], never raw bytes.

use bitflags::bitflags;

/// A decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Shorthand for a plain character key.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    /// Shorthand for Ctrl+`c`.
    #[must_use]
    pub const fn ctrl_char(c: char) -> Self {
        Self::new(KeyCode::Char(c)).with_modifiers(Modifiers::CTRL)
    }

    /// Check if this is a specific character key without Ctrl.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        !self.ctrl() && matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if this is Ctrl+`c`.
    #[must_use]
    pub fn is_ctrl(&self, c: char) -> bool {
        self.ctrl() && matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// The character this key would insert, if any.
    ///
    /// Control chords and named keys produce `None`; Tab produces `'\t'`.
    #[must_use]
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.ctrl() && !c.is_control() => Some(c),
            KeyCode::Tab => Some('\t'),
            _ => None,
        }
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::new(code)
    }
}

/// Key codes recognized by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key (with Ctrl chords reported via [`Modifiers::CTRL`]).
    Char(char),
    /// Enter / Return (CR).
    Enter,
    /// Escape, or an escape sequence that could not be recognized.
    Escape,
    /// Backspace (DEL or Ctrl-H).
    Backspace,
    /// Horizontal tab.
    Tab,
    /// Forward delete (`ESC [ 3 ~`).
    Delete,
    /// Home.
    Home,
    /// End.
    End,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// NUL byte (Ctrl-Space / Ctrl-@).
    Null,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
    }
}
