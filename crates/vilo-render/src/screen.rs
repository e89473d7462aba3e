#![forbid(unsafe_code)]

//! Full-screen frame composition.
//!
//! Layout, top to bottom:
//!
//! - `text_rows` lines of buffer text (or `~` past end of file);
//! - one inverse-video status line: filename, line count, dirty flag on the
//!   left, mode and cursor row on the right;
//! - one message line.
//!
//! Colors change only at highlight-class boundaries, so a run of same-class
//! bytes costs one SGR sequence.

use std::io::{self, Write};

use vilo_text::{HighlightClass, Point, Row, RowStore};

use crate::ansi::{self, color_for};
use crate::buffer::OutputBuffer;

/// Visual selection shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Char,
    Line,
}

/// An inclusive selection in raw coordinates, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    pub start: Point,
    pub end: Point,
}

impl Selection {
    /// Build from two endpoints in either order.
    #[must_use]
    pub fn between(kind: SelectionKind, a: Point, b: Point) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self { kind, start, end }
    }

    /// Selected rendered columns of `row` as a half-open range.
    fn rendered_span(&self, row: &Row) -> Option<(usize, usize)> {
        let y = row.index();
        if y < self.start.y || y > self.end.y {
            return None;
        }
        match self.kind {
            SelectionKind::Line => Some((0, usize::MAX)),
            SelectionKind::Char => {
                let from = if y == self.start.y {
                    row.cx_to_rx(self.start.x)
                } else {
                    0
                };
                let to = if y == self.end.y {
                    row.cx_to_rx(self.end.x + 1)
                } else {
                    usize::MAX
                };
                Some((from, to))
            }
        }
    }
}

/// Status-line fields.
#[derive(Debug, Clone, Copy)]
pub struct StatusLine<'a> {
    pub filename: &'a str,
    pub dirty: bool,
    pub mode: &'a str,
    /// 0-based cursor row.
    pub cursor_row: usize,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub rows: &'a RowStore,
    pub row_offset: usize,
    /// Rendered-column offset.
    pub col_offset: usize,
    /// Screen rows available for text (terminal rows minus two).
    pub text_rows: usize,
    pub cols: usize,
    pub status: StatusLine<'a>,
    /// Message-line text; empty for none.
    pub message: &'a str,
    /// Shown a third of the way down when the buffer is empty.
    pub welcome: Option<&'a str>,
    pub selection: Option<Selection>,
    /// 0-based screen position for the visible cursor.
    pub cursor: (usize, usize),
}

/// Compose a complete frame into `out`.
///
/// # Errors
///
/// Only fails if `out` fails, which an [`OutputBuffer`] never does.
pub fn compose(view: &View<'_>, out: &mut OutputBuffer) -> io::Result<()> {
    out.append(ansi::CURSOR_HIDE);
    out.append(ansi::CURSOR_HOME);

    for y in 0..view.text_rows {
        let file_row = view.row_offset + y;
        match view.rows.row(file_row) {
            Some(row) => paint_row(out, row, view)?,
            None => paint_filler(out, view, y),
        }
        out.append(ansi::SGR_FG_DEFAULT);
        out.append(ansi::ERASE_TO_EOL);
        out.append(b"\r\n");
    }

    paint_status(out, view)?;
    out.append(ansi::ERASE_TO_EOL);
    out.append(truncate(view.message.as_bytes(), view.cols));

    ansi::cup(out, view.cursor.0, view.cursor.1)?;
    out.append(ansi::CURSOR_SHOW);
    #[cfg(feature = "tracing")]
    tracing::trace!(bytes = out.len(), "frame composed");
    Ok(())
}

fn paint_filler(out: &mut OutputBuffer, view: &View<'_>, y: usize) {
    let Some(welcome) = view.welcome.filter(|_| view.rows.is_empty()) else {
        out.append(b"~");
        return;
    };
    if y != view.text_rows / 3 {
        out.append(b"~");
        return;
    }
    let text = truncate(welcome.as_bytes(), view.cols);
    let padding = (view.cols - text.len()) / 2;
    if padding > 0 {
        out.append(b"~");
        out.append(&vec![b' '; padding - 1]);
    }
    out.append(text);
}

fn paint_row(out: &mut OutputBuffer, row: &Row, view: &View<'_>) -> io::Result<()> {
    let rendered = row.rendered();
    let highlight = row.highlight();
    let start = view.col_offset.min(rendered.len());
    let end = view.col_offset.saturating_add(view.cols).min(rendered.len());
    let selected = view.selection.and_then(|s| s.rendered_span(row));

    let mut color: Option<u8> = None;
    let mut inverted = false;
    for rx in start..end {
        let in_selection = selected.is_some_and(|(from, to)| rx >= from && rx < to);
        if in_selection != inverted {
            out.append(if in_selection {
                ansi::SGR_REVERSE_ON
            } else {
                ansi::SGR_REVERSE_OFF
            });
            inverted = in_selection;
        }

        let class = highlight[rx];
        if class == HighlightClass::NonPrint {
            out.append(ansi::SGR_REVERSE_ON);
            out.append(&rendered[rx..=rx]);
            out.append(ansi::SGR_RESET);
            // The reset also dropped color and selection inverse.
            color = None;
            if inverted {
                out.append(ansi::SGR_REVERSE_ON);
            }
            continue;
        }

        match color_for(class) {
            None => {
                if color.take().is_some() {
                    out.append(ansi::SGR_FG_DEFAULT);
                }
            }
            Some(code) if color != Some(code) => {
                ansi::sgr(out, code)?;
                color = Some(code);
            }
            Some(_) => {}
        }
        out.append(&rendered[rx..=rx]);
    }
    if inverted {
        out.append(ansi::SGR_REVERSE_OFF);
    }
    Ok(())
}

fn paint_status(out: &mut OutputBuffer, view: &View<'_>) -> io::Result<()> {
    let status = &view.status;
    let lines = view.rows.len();
    let name: String = status.filename.chars().take(20).collect();
    let left = format!(
        "{name} - {lines} lines {}",
        if status.dirty { "(modified)" } else { "" }
    );
    let right = format!("{} {}/{}", status.mode, status.cursor_row + 1, lines);

    out.append(ansi::ERASE_TO_EOL);
    out.append(ansi::SGR_REVERSE_ON);
    let left = truncate(left.as_bytes(), view.cols);
    out.append(left);
    let mut used = left.len();
    while used < view.cols {
        if view.cols - used == right.len() {
            write!(out, "{right}")?;
            break;
        }
        out.append(b" ");
        used += 1;
    }
    out.append(ansi::SGR_RESET);
    out.append(b"\r\n");
    Ok(())
}

fn truncate(bytes: &[u8], cols: usize) -> &[u8] {
    &bytes[..bytes.len().min(cols)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use vilo_text::select_profile;

    fn rows(lines: &[&str], filename: &str) -> RowStore {
        RowStore::from_lines(
            lines.iter().map(|l| l.as_bytes().to_vec()),
            select_profile(filename),
        )
    }

    fn view<'a>(rows: &'a RowStore) -> View<'a> {
        View {
            rows,
            row_offset: 0,
            col_offset: 0,
            text_rows: 4,
            cols: 40,
            status: StatusLine {
                filename: "main.c",
                dirty: false,
                mode: "NORMAL",
                cursor_row: 0,
            },
            message: "",
            welcome: None,
            selection: None,
            cursor: (0, 0),
        }
    }

    fn frame(view: &View<'_>) -> String {
        let mut out = OutputBuffer::new();
        compose(view, &mut out).unwrap();
        String::from_utf8_lossy(out.as_bytes()).into_owned()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn frame_is_bracketed_by_cursor_hide_and_show() {
        let store = rows(&["hello"], "notes.txt");
        let text = frame(&view(&store));
        assert!(text.starts_with("\x1b[?25l\x1b[H"));
        assert!(text.ends_with("\x1b[1;1H\x1b[?25h"));
    }

    #[test]
    fn rows_past_end_are_tildes() {
        let store = rows(&["only"], "notes.txt");
        let text = frame(&view(&store));
        assert_eq!(count(&text, "~"), 3);
        assert_eq!(count(&text, "\x1b[0K\r\n"), 4);
    }

    #[test]
    fn same_class_runs_share_one_color_code() {
        let store = rows(&["int x = 12345;"], "main.c");
        let text = frame(&view(&store));
        assert_eq!(count(&text, "\x1b[32m"), 1);
        assert_eq!(count(&text, "\x1b[31m"), 1);
        assert!(text.contains("\x1b[32mint\x1b[39m x = \x1b[31m12345\x1b[39m;"));
    }

    #[test]
    fn non_printables_are_inverse() {
        let store = rows(&["a\x01b"], "notes.txt");
        let text = frame(&view(&store));
        assert!(text.contains("a\x1b[7mA\x1b[0mb"));
    }

    #[test]
    fn column_offset_slices_rendered_text() {
        let store = rows(&["0123456789"], "notes.txt");
        let mut v = view(&store);
        v.col_offset = 4;
        v.cols = 3;
        let text = frame(&v);
        assert!(text.contains("\x1b[H456\x1b[39m"));
    }

    #[test]
    fn status_line_reports_dirty_and_position() {
        let store = rows(&["a", "b", "c"], "main.c");
        let mut v = view(&store);
        v.status.dirty = true;
        v.status.cursor_row = 1;
        let text = frame(&v);
        assert!(text.contains("main.c - 3 lines (modified)"));
        assert!(text.contains("NORMAL 2/3\x1b[0m"));
    }

    #[test]
    fn message_line_is_truncated() {
        let store = rows(&["a"], "notes.txt");
        let mut v = view(&store);
        v.cols = 5;
        v.message = "too long message";
        let text = frame(&v);
        assert!(text.contains("\x1b[0Ktoo l\x1b["));
    }

    #[test]
    fn welcome_shows_on_empty_buffer() {
        let store = RowStore::new();
        let mut v = view(&store);
        v.text_rows = 6;
        v.welcome = Some("vilo editor");
        let text = frame(&v);
        // (40 - 11) / 2 = 14 columns of padding, the first one a tilde.
        let expected = format!("~{}vilo editor", " ".repeat(13));
        assert!(text.contains(&expected));
    }

    #[test]
    fn char_selection_is_inverse() {
        let store = rows(&["abcdef"], "notes.txt");
        let mut v = view(&store);
        v.selection = Some(Selection::between(
            SelectionKind::Char,
            Point::new(3, 0),
            Point::new(1, 0),
        ));
        let text = frame(&v);
        assert!(text.contains("a\x1b[7mbcd\x1b[27mef"));
    }

    #[test]
    fn line_selection_covers_rows() {
        let store = rows(&["ab", "cd", "ef"], "notes.txt");
        let mut v = view(&store);
        v.selection = Some(Selection::between(
            SelectionKind::Line,
            Point::new(1, 1),
            Point::new(0, 2),
        ));
        let text = frame(&v);
        assert!(text.contains("ab\x1b[39m"));
        assert!(text.contains("\x1b[7mcd\x1b[27m"));
        assert!(text.contains("\x1b[7mef\x1b[27m"));
    }

    #[test]
    fn cursor_is_placed_last() {
        let store = rows(&["a"], "notes.txt");
        let mut v = view(&store);
        v.cursor = (2, 4);
        let text = frame(&v);
        assert!(text.ends_with("\x1b[3;5H\x1b[?25h"));
    }
}
