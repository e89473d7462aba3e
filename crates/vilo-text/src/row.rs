#![forbid(unsafe_code)]

//! A single line of text in raw and display form.
//!
//! A [`Row`] keeps three views of one line in lockstep:
//!
//! - `raw`: the bytes as stored on disk.
//! - `rendered`: what the terminal shows. Tabs are expanded and control bytes
//!   replaced by a placeholder.
//! - `highlight`: one [`HighlightClass`] per rendered byte.
//!
//! `rendered` and `highlight` are derived; only [`crate::RowStore`] mutates
//! a row, and it refreshes both before returning.

use crate::syntax::{self, HighlightClass, SyntaxProfile};

/// Tab stops every 8 columns (VT100 convention).
pub const TAB_STOP: usize = 8;

/// Output of [`render_row`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedLine {
    /// Display bytes.
    pub text: Vec<u8>,
    /// Baseline classes: `NonPrint` for placeholders, `Normal` otherwise.
    pub classes: Vec<HighlightClass>,
}

/// Derive the display form of a raw line.
///
/// Each tab becomes one or more spaces ending on the next multiple of
/// [`TAB_STOP`]. A control byte `b` becomes `'@' + b` when `b <= 26`, else
/// `'?'`, classed [`HighlightClass::NonPrint`] so the painter shows it in
/// inverse video.
#[must_use]
pub fn render_row(raw: &[u8]) -> RenderedLine {
    let tabs = raw.iter().filter(|&&b| b == b'\t').count();
    let mut text = Vec::with_capacity(raw.len() + tabs * (TAB_STOP - 1));
    let mut classes = Vec::with_capacity(text.capacity());

    for &byte in raw {
        match byte {
            b'\t' => {
                text.push(b' ');
                while text.len() % TAB_STOP != 0 {
                    text.push(b' ');
                }
                classes.resize(text.len(), HighlightClass::Normal);
            }
            b if is_control(b) => {
                text.push(placeholder(b));
                classes.push(HighlightClass::NonPrint);
            }
            b => {
                text.push(b);
                classes.push(HighlightClass::Normal);
            }
        }
    }
    RenderedLine { text, classes }
}

fn is_control(byte: u8) -> bool {
    byte < 0x20 || byte == 0x7f
}

fn placeholder(byte: u8) -> u8 {
    if byte <= 26 { b'@' + byte } else { b'?' }
}

/// One line of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub(crate) index: usize,
    pub(crate) raw: Vec<u8>,
    rendered: Vec<u8>,
    highlight: Vec<HighlightClass>,
    open_comment: bool,
    /// Comment state this row was last highlighted with.
    pub(crate) entered_in_comment: bool,
}

impl Row {
    pub(crate) fn new(index: usize, raw: Vec<u8>) -> Self {
        Self {
            index,
            raw,
            rendered: Vec::new(),
            highlight: Vec::new(),
            open_comment: false,
            entered_in_comment: false,
        }
    }

    /// Position of this row in its store.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw bytes, without the line terminator.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    #[must_use]
    pub fn rendered(&self) -> &[u8] {
        &self.rendered
    }

    #[must_use]
    pub fn highlight(&self) -> &[HighlightClass] {
        &self.highlight
    }

    /// Whether a multi-line comment was still open at the end of this row.
    #[must_use]
    pub fn open_comment(&self) -> bool {
        self.open_comment
    }

    /// Raw length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Rendered column of raw column `cx`.
    #[must_use]
    pub fn cx_to_rx(&self, cx: usize) -> usize {
        self.raw.iter().take(cx).fold(0, |rx, &b| {
            if b == b'\t' {
                rx + TAB_STOP - rx % TAB_STOP
            } else {
                rx + 1
            }
        })
    }

    /// Raw column whose rendered span contains rendered column `rx`.
    #[must_use]
    pub fn rx_to_cx(&self, rx: usize) -> usize {
        let mut cur = 0;
        for (cx, &b) in self.raw.iter().enumerate() {
            cur = if b == b'\t' {
                cur + TAB_STOP - cur % TAB_STOP
            } else {
                cur + 1
            };
            if cur > rx {
                return cx;
            }
        }
        self.raw.len()
    }

    /// Overlay the search-match class on `len` rendered bytes from `start`.
    ///
    /// Returns the previous classes, to be handed back to
    /// [`Row::restore_highlight`].
    pub fn overlay_match(&mut self, start: usize, len: usize) -> Vec<HighlightClass> {
        let saved = self.highlight.clone();
        let end = (start + len).min(self.highlight.len());
        for slot in &mut self.highlight[start.min(end)..end] {
            *slot = HighlightClass::Match;
        }
        saved
    }

    /// Put back classes saved by [`Row::overlay_match`].
    ///
    /// Ignored if the row was re-rendered to a different length meanwhile.
    pub fn restore_highlight(&mut self, saved: Vec<HighlightClass>) {
        if saved.len() == self.highlight.len() {
            self.highlight = saved;
        }
    }

    /// Re-render and re-highlight. Returns the new open-comment state.
    pub(crate) fn refresh(&mut self, profile: Option<&SyntaxProfile>, in_comment: bool) -> bool {
        let RenderedLine { text, classes } = render_row(&self.raw);
        let (highlight, open) = syntax::highlight_line(&text, &classes, profile, in_comment);
        self.rendered = text;
        self.highlight = highlight;
        self.open_comment = open;
        self.entered_in_comment = in_comment;
        open
    }
}
