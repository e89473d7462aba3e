#![forbid(unsafe_code)]

//! Open files and the cursor state that goes with each.
//!
//! A [`Buffer`] is one file's rows plus its cursor, viewport, mode, and
//! visual-selection anchor. [`BufferManager`] owns every open buffer and
//! knows which one is active.
//!
//! # Cursor model
//!
//! The cursor `(cx, cy)` is in raw-byte coordinates. `cy` may equal the row
//! count (the virtual line after the last row, where typing appends a row),
//! and `cx` may equal the row length.

use std::io;
use std::path::{Path, PathBuf};

use vilo_text::{Point, RowStore, select_profile};

use crate::file;

/// Editing mode of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    VisualChar,
    VisualLine,
}

impl Mode {
    /// Label shown on the status bar.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::VisualChar => "VISUAL",
            Mode::VisualLine => "VISUAL LINE",
        }
    }

    #[must_use]
    pub const fn is_visual(self) -> bool {
        matches!(self, Mode::VisualChar | Mode::VisualLine)
    }
}

/// Visible window onto the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub row_offset: usize,
    /// Offset in rendered columns.
    pub col_offset: usize,
    /// Text rows on screen.
    pub rows: usize,
    pub cols: usize,
}

/// One open file.
#[derive(Debug)]
pub struct Buffer {
    rows: RowStore,
    cx: usize,
    cy: usize,
    viewport: Viewport,
    filename: PathBuf,
    mode: Mode,
    anchor: Option<Point>,
}

impl Buffer {
    /// Wrap already-loaded rows.
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>, rows: RowStore) -> Self {
        Self {
            rows,
            cx: 0,
            cy: 0,
            viewport: Viewport::default(),
            filename: filename.into(),
            mode: Mode::Normal,
            anchor: None,
        }
    }

    /// Load `path`, picking a syntax profile from its name.
    ///
    /// # Errors
    ///
    /// Any read error except a missing file.
    pub fn open(path: &Path) -> io::Result<Self> {
        let lines = file::load_lines(path)?;
        let syntax = select_profile(&path.to_string_lossy());
        Ok(Self::new(path, RowStore::from_lines(lines, syntax)))
    }

    #[must_use]
    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut RowStore {
        &mut self.rows
    }

    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.rows.is_dirty()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Option<Point>) {
        self.anchor = anchor;
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Restore a viewport saved earlier, e.g. when search is cancelled.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Resize the visible text area.
    pub fn set_screen_size(&mut self, rows: usize, cols: usize) {
        self.viewport.rows = rows;
        self.viewport.cols = cols;
    }

    // ── Cursor ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn cursor(&self) -> Point {
        Point::new(self.cx, self.cy)
    }

    /// Move to `at`, clamped to the buffer.
    pub fn set_cursor(&mut self, at: Point) {
        self.cy = at.y.min(self.rows.len());
        self.cx = at.x;
        self.clamp_cx();
    }

    fn clamp_cx(&mut self) {
        self.cx = self.cx.min(self.rows.row_len(self.cy));
    }

    pub fn move_left(&mut self) {
        if self.cx > 0 {
            self.cx -= 1;
        } else if self.cy > 0 {
            self.cy -= 1;
            self.cx = self.rows.row_len(self.cy);
        }
    }

    pub fn move_right(&mut self) {
        if self.cy >= self.rows.len() {
            return;
        }
        if self.cx < self.rows.row_len(self.cy) {
            self.cx += 1;
        } else {
            self.cy += 1;
            self.cx = 0;
        }
    }

    pub fn move_up(&mut self) {
        self.cy = self.cy.saturating_sub(1);
        self.clamp_cx();
    }

    pub fn move_down(&mut self) {
        if self.cy < self.rows.len() {
            self.cy += 1;
        }
        self.clamp_cx();
    }

    pub fn move_home(&mut self) {
        self.cx = 0;
    }

    pub fn move_end(&mut self) {
        self.cx = self.rows.row_len(self.cy);
    }

    /// Jump to the top of the screen, then up one screenful.
    pub fn page_up(&mut self) {
        self.cy = self.viewport.row_offset.min(self.rows.len());
        for _ in 0..self.viewport.rows {
            self.move_up();
        }
        self.clamp_cx();
    }

    /// Jump to the bottom of the screen, then down one screenful.
    pub fn page_down(&mut self) {
        let bottom = (self.viewport.row_offset + self.viewport.rows).saturating_sub(1);
        self.cy = bottom.min(self.rows.len());
        for _ in 0..self.viewport.rows {
            self.move_down();
        }
        self.clamp_cx();
    }

    /// Move to the first `target` byte after the cursor on this row.
    pub fn find_in_row(&mut self, target: u8) -> bool {
        let text = self.rows.row_text(self.cy);
        let from = (self.cx + 1).min(text.len());
        match text[from..].iter().position(|&b| b == target) {
            Some(offset) => {
                self.cx = from + offset;
                true
            }
            None => false,
        }
    }

    // ── Editing ─────────────────────────────────────────────────────────

    /// Insert `bytes` at the cursor, creating the row if the cursor sits on
    /// the virtual line past the end.
    pub fn insert_bytes(&mut self, bytes: &[u8]) {
        if self.cy == self.rows.len() {
            self.rows.insert_row(self.cy, b"");
        }
        if self.rows.insert_bytes(self.cy, self.cx, bytes) {
            self.cx += bytes.len();
        }
    }

    /// Split the row at the cursor and move to the start of the new row.
    pub fn insert_newline(&mut self) {
        let done = if self.cy == self.rows.len() {
            self.rows.insert_row(self.cy, b"")
        } else {
            self.rows.split_row(self.cy, self.cx)
        };
        if done {
            self.cy += 1;
            self.cx = 0;
        }
    }

    /// Delete the byte before the cursor, joining with the previous row at
    /// column 0. Returns `false` when there is nothing to delete.
    pub fn delete_backward(&mut self) -> bool {
        if self.cy >= self.rows.len() || (self.cx == 0 && self.cy == 0) {
            return false;
        }
        if self.cx == 0 {
            let joined_at = self.rows.row_len(self.cy - 1);
            if !self.rows.join_with_previous(self.cy) {
                return false;
            }
            self.cy -= 1;
            self.cx = joined_at;
            return true;
        }
        let deleted = self.rows.delete_char(self.cy, self.cx - 1);
        if deleted {
            self.cx -= 1;
        }
        deleted
    }

    /// Delete the byte under the cursor.
    pub fn delete_under_cursor(&mut self) -> bool {
        let deleted = self.rows.delete_char(self.cy, self.cx);
        self.clamp_cx();
        deleted
    }

    /// Open an empty row below (`below`) or above the cursor row and move
    /// onto it.
    pub fn open_row(&mut self, below: bool) {
        let at = if below {
            (self.cy + 1).min(self.rows.len())
        } else {
            self.cy.min(self.rows.len())
        };
        if self.rows.insert_row(at, b"") {
            self.cy = at;
            self.cx = 0;
        }
    }

    /// Serialize and write to the buffer's file, marking it clean on success.
    ///
    /// # Errors
    ///
    /// Propagates the write failure; the buffer stays dirty.
    pub fn save(&mut self) -> io::Result<usize> {
        let bytes = self.rows.rows_to_text();
        let written = file::save(&self.filename, &bytes)?;
        self.rows.mark_clean();
        Ok(written)
    }

    // ── Viewport ────────────────────────────────────────────────────────

    /// Scroll so the cursor is visible, measuring columns in rendered space.
    pub fn scroll(&mut self) {
        let rx = self.rows.row(self.cy).map_or(0, |row| row.cx_to_rx(self.cx));
        let vp = &mut self.viewport;
        if self.cy < vp.row_offset {
            vp.row_offset = self.cy;
        }
        if vp.rows > 0 && self.cy >= vp.row_offset + vp.rows {
            vp.row_offset = self.cy + 1 - vp.rows;
        }
        if rx < vp.col_offset {
            vp.col_offset = rx;
        }
        if vp.cols > 0 && rx >= vp.col_offset + vp.cols {
            vp.col_offset = rx + 1 - vp.cols;
        }
    }

    /// Cursor position on screen, relative to the viewport.
    #[must_use]
    pub fn cursor_on_screen(&self) -> (usize, usize) {
        let rx = self.rows.row(self.cy).map_or(0, |row| row.cx_to_rx(self.cx));
        (
            self.cy.saturating_sub(self.viewport.row_offset),
            rx.saturating_sub(self.viewport.col_offset),
        )
    }

    /// Put the cursor on rendered column `offset` of `row`, with `row` at the
    /// top of the screen.
    pub fn jump_to_match(&mut self, row: usize, offset: usize) {
        let Some(target) = self.rows.row(row) else {
            return;
        };
        self.cx = target.rx_to_cx(offset);
        self.cy = row;
        self.viewport.row_offset = row;
        self.viewport.col_offset = 0;
    }
}

// ---------------------------------------------------------------------------
// BufferManager
// ---------------------------------------------------------------------------

/// Handle to a buffer held by a [`BufferManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(usize);

/// Every open buffer, in opening order, plus the active one.
#[derive(Debug)]
pub struct BufferManager {
    buffers: Vec<Buffer>,
    active: usize,
}

impl BufferManager {
    /// Manager holding `first` as the active buffer.
    #[must_use]
    pub fn new(first: Buffer) -> Self {
        Self {
            buffers: vec![first],
            active: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Always `false`: a manager holds at least one buffer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    #[must_use]
    pub fn active_id(&self) -> BufferId {
        BufferId(self.active)
    }

    #[must_use]
    pub fn active(&self) -> &Buffer {
        &self.buffers[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.active]
    }

    #[must_use]
    pub fn get(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        (0..self.buffers.len()).map(BufferId)
    }

    /// Buffer already holding `path`, if any.
    #[must_use]
    pub fn find(&self, path: &Path) -> Option<BufferId> {
        self.buffers
            .iter()
            .position(|b| b.filename() == path)
            .map(BufferId)
    }

    /// Whether any buffer has unsaved changes.
    #[must_use]
    pub fn any_dirty(&self) -> bool {
        self.buffers.iter().any(Buffer::is_dirty)
    }

    /// Make `id` active. Returns `false` for an unknown id.
    pub fn switch_to(&mut self, id: BufferId) -> bool {
        if id.0 >= self.buffers.len() {
            return false;
        }
        self.active = id.0;
        tracing::info!(
            buffer = id.0,
            file = %self.active().filename().display(),
            "switched buffer"
        );
        true
    }

    /// Open `path` and make it active, reusing its buffer if already open.
    ///
    /// # Errors
    ///
    /// Read errors other than a missing file.
    pub fn open(&mut self, path: &Path) -> io::Result<BufferId> {
        if let Some(id) = self.find(path) {
            self.switch_to(id);
            return Ok(id);
        }
        let mut buffer = Buffer::open(path)?;
        let vp = self.active().viewport();
        buffer.set_screen_size(vp.rows, vp.cols);
        self.buffers.push(buffer);
        self.active = self.buffers.len() - 1;
        tracing::info!(
            buffer = self.active,
            file = %path.display(),
            lines = self.active().rows().len(),
            "opened buffer"
        );
        Ok(BufferId(self.active))
    }

    /// Activate the next buffer, wrapping.
    pub fn next(&mut self) -> BufferId {
        let id = BufferId((self.active + 1) % self.buffers.len());
        self.switch_to(id);
        id
    }

    /// Activate the previous buffer, wrapping.
    pub fn prev(&mut self) -> BufferId {
        let len = self.buffers.len();
        let id = BufferId((self.active + len - 1) % len);
        self.switch_to(id);
        id
    }

    /// Resize every buffer's text area.
    pub fn set_screen_size(&mut self, rows: usize, cols: usize) {
        for buffer in &mut self.buffers {
            buffer.set_screen_size(rows, cols);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(lines: &[&str]) -> Buffer {
        let rows = RowStore::from_lines(lines.iter().map(|l| l.as_bytes().to_vec()), None);
        let mut buf = Buffer::new("test.txt", rows);
        buf.set_screen_size(3, 10);
        buf
    }

    fn text(buf: &Buffer) -> String {
        String::from_utf8(buf.rows().rows_to_text()).unwrap()
    }

    #[test]
    fn left_wraps_to_previous_row_end() {
        let mut buf = buffer(&["abc", "de"]);
        buf.set_cursor(Point::new(0, 1));
        buf.move_left();
        assert_eq!(buf.cursor(), Point::new(3, 0));
    }

    #[test]
    fn right_wraps_to_next_row_start() {
        let mut buf = buffer(&["ab", "cd"]);
        buf.set_cursor(Point::new(2, 0));
        buf.move_right();
        assert_eq!(buf.cursor(), Point::new(0, 1));
    }

    #[test]
    fn vertical_motion_clamps_column() {
        let mut buf = buffer(&["a long row", "ab"]);
        buf.set_cursor(Point::new(8, 0));
        buf.move_down();
        assert_eq!(buf.cursor(), Point::new(2, 1));
        buf.move_down();
        assert_eq!(buf.cursor(), Point::new(0, 2));
        buf.move_down();
        assert_eq!(buf.cursor(), Point::new(0, 2));
    }

    #[test]
    fn typing_past_end_appends_row() {
        let mut buf = buffer(&["a"]);
        buf.set_cursor(Point::new(0, 1));
        buf.insert_bytes(b"xy");
        assert_eq!(text(&buf), "a\nxy\n");
        assert_eq!(buf.cursor(), Point::new(2, 1));
        assert!(buf.is_dirty());
    }

    #[test]
    fn newline_splits_row() {
        let mut buf = buffer(&["hello world"]);
        buf.set_cursor(Point::new(5, 0));
        buf.insert_newline();
        assert_eq!(text(&buf), "hello\n world\n");
        assert_eq!(buf.cursor(), Point::new(0, 1));
    }

    #[test]
    fn delete_backward_joins_lines() {
        let mut buf = buffer(&["hello", "world"]);
        buf.set_cursor(Point::new(0, 1));
        assert!(buf.delete_backward());
        assert_eq!(text(&buf), "helloworld\n");
        assert_eq!(buf.cursor(), Point::new(5, 0));
    }

    #[test]
    fn delete_backward_at_beginning() {
        let mut buf = buffer(&["hello"]);
        assert!(!buf.delete_backward());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn delete_under_cursor_clamps() {
        let mut buf = buffer(&["ab"]);
        buf.set_cursor(Point::new(1, 0));
        assert!(buf.delete_under_cursor());
        assert_eq!(text(&buf), "a\n");
        assert_eq!(buf.cursor(), Point::new(1, 0));
        assert!(!buf.delete_under_cursor());
    }

    #[test]
    fn open_row_above_and_below() {
        let mut buf = buffer(&["one", "two"]);
        buf.open_row(true);
        assert_eq!(text(&buf), "one\n\ntwo\n");
        assert_eq!(buf.cursor(), Point::new(0, 1));
        buf.open_row(false);
        assert_eq!(text(&buf), "one\n\n\ntwo\n");
        assert_eq!(buf.cursor(), Point::new(0, 1));
    }

    #[test]
    fn find_in_row_skips_cursor_byte() {
        let mut buf = buffer(&["a=b=c"]);
        buf.set_cursor(Point::new(1, 0));
        assert!(buf.find_in_row(b'='));
        assert_eq!(buf.cursor(), Point::new(3, 0));
        assert!(!buf.find_in_row(b'z'));
        assert_eq!(buf.cursor(), Point::new(3, 0));
    }

    #[test]
    fn scroll_follows_rendered_column() {
        let mut buf = buffer(&["\t\tx"]);
        buf.set_cursor(Point::new(2, 0));
        buf.scroll();
        // Rendered column 16 on a 10-column screen.
        assert_eq!(buf.viewport().col_offset, 7);
        assert_eq!(buf.cursor_on_screen(), (0, 9));
    }

    #[test]
    fn scroll_follows_rows() {
        let mut buf = buffer(&["1", "2", "3", "4", "5"]);
        buf.set_cursor(Point::new(0, 4));
        buf.scroll();
        assert_eq!(buf.viewport().row_offset, 2);
        buf.set_cursor(Point::new(0, 0));
        buf.scroll();
        assert_eq!(buf.viewport().row_offset, 0);
    }

    #[test]
    fn page_down_then_up() {
        let mut buf = buffer(&["1", "2", "3", "4", "5", "6", "7", "8"]);
        buf.page_down();
        assert_eq!(buf.cursor().y, 5);
        buf.scroll();
        buf.page_up();
        assert_eq!(buf.cursor().y, 0);
    }

    #[test]
    fn manager_reuses_open_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.c");
        let b = dir.path().join("b.rs");
        std::fs::write(&b, "fn main() {}\n").unwrap();

        let mut mgr = BufferManager::new(Buffer::open(&a).unwrap());
        let first = mgr.active_id();
        let second = mgr.open(&b).unwrap();
        assert_ne!(first, second);
        assert_eq!(mgr.len(), 2);
        assert_eq!(mgr.active().rows().len(), 1);
        assert_eq!(mgr.active().rows().syntax().map(|s| s.name), Some("rust"));

        assert_eq!(mgr.open(&a).unwrap(), first);
        assert_eq!(mgr.len(), 2);
        assert_eq!(mgr.find(&b), Some(second));
    }

    #[test]
    fn manager_cycles_buffers() {
        let mut mgr = BufferManager::new(buffer(&["x"]));
        assert_eq!(mgr.next(), mgr.active_id());
        let dir = tempfile::tempdir().unwrap();
        let other = mgr.open(&dir.path().join("other.txt")).unwrap();
        let first = mgr.prev();
        assert_ne!(first, other);
        assert_eq!(mgr.next(), other);
        assert_eq!(mgr.next(), first);
        assert_eq!(mgr.ids().count(), 2);
    }

    #[test]
    fn any_dirty_tracks_edits() {
        let mut mgr = BufferManager::new(buffer(&["x"]));
        assert!(!mgr.any_dirty());
        mgr.active_mut().insert_bytes(b"y");
        assert!(mgr.any_dirty());
    }
}
