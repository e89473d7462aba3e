#![forbid(unsafe_code)]

//! Ordered row storage for one buffer.
//!
//! # Invariants
//!
//! - `rows[i].index() == i` for every row, after every operation.
//! - Every row's `rendered`/`highlight` is current when a mutator returns.
//! - A row's recorded entering comment state equals the previous row's
//!   `open_comment` (false for row 0). Mutations restore this by cascading
//!   re-highlights downward until it holds again.
//!
//! Out-of-range positions are silent no-ops; mutators report whether they
//! changed anything.

use crate::row::Row;
use crate::syntax::SyntaxProfile;

/// The rows of one buffer plus its dirty flag and active syntax.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Vec<Row>,
    syntax: Option<&'static SyntaxProfile>,
    dirty: bool,
}

impl RowStore {
    /// Create an empty, clean store with no syntax.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a clean store from loaded lines.
    #[must_use]
    pub fn from_lines<I>(lines: I, syntax: Option<&'static SyntaxProfile>) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let rows = lines
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Row::new(index, raw))
            .collect();
        let mut store = Self {
            rows,
            syntax,
            dirty: false,
        };
        store.refresh_all();
        store
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, at: usize) -> Option<&Row> {
        self.rows.get(at)
    }

    /// Mutable access for highlight overlays. Text must go through the
    /// store's mutators.
    pub fn row_mut(&mut self, at: usize) -> Option<&mut Row> {
        self.rows.get_mut(at)
    }

    /// Raw bytes of row `at`, empty if out of range.
    #[must_use]
    pub fn row_text(&self, at: usize) -> &[u8] {
        self.rows.get(at).map(Row::raw).unwrap_or_default()
    }

    /// Raw length of row `at`, zero if out of range.
    #[must_use]
    pub fn row_len(&self, at: usize) -> usize {
        self.rows.get(at).map_or(0, Row::len)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    #[must_use]
    pub fn syntax(&self) -> Option<&'static SyntaxProfile> {
        self.syntax
    }

    /// Switch syntax and re-highlight everything. Does not dirty the store.
    pub fn set_syntax(&mut self, syntax: Option<&'static SyntaxProfile>) {
        self.syntax = syntax;
        self.refresh_all();
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a successful save.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // ── Row operations ──────────────────────────────────────────────────

    /// Insert a row at `at`, shifting later rows down. `at` may equal `len()`.
    pub fn insert_row(&mut self, at: usize, text: &[u8]) -> bool {
        if at > self.rows.len() {
            return false;
        }
        self.rows.insert(at, Row::new(at, text.to_vec()));
        self.renumber_from(at + 1);
        self.refresh_from(at);
        self.dirty = true;
        true
    }

    /// Remove row `at`, shifting later rows up.
    pub fn delete_row(&mut self, at: usize) -> bool {
        if at >= self.rows.len() {
            return false;
        }
        self.rows.remove(at);
        self.renumber_from(at);
        if at < self.rows.len() {
            self.refresh_from(at);
        }
        self.dirty = true;
        true
    }

    /// Remove rows `first..=last`.
    pub fn delete_rows(&mut self, first: usize, last: usize) -> bool {
        if first > last || last >= self.rows.len() {
            return false;
        }
        self.rows.drain(first..=last);
        self.renumber_from(first);
        if first < self.rows.len() {
            self.refresh_from(first);
        }
        self.dirty = true;
        true
    }

    /// Replace the text of row `at`.
    pub fn set_row_text(&mut self, at: usize, text: &[u8]) -> bool {
        let Some(row) = self.rows.get_mut(at) else {
            return false;
        };
        row.raw = text.to_vec();
        self.refresh_from(at);
        self.dirty = true;
        true
    }

    /// Insert byte `c` at column `at`, padding with spaces if `at` is past the
    /// end of the row.
    pub fn insert_char(&mut self, row: usize, at: usize, c: u8) -> bool {
        self.insert_bytes(row, at, &[c])
    }

    /// Insert `bytes` at column `at`, padding like [`RowStore::insert_char`].
    pub fn insert_bytes(&mut self, row: usize, at: usize, bytes: &[u8]) -> bool {
        let Some(target) = self.rows.get_mut(row) else {
            return false;
        };
        if at > target.raw.len() {
            target.raw.resize(at, b' ');
        }
        target.raw.splice(at..at, bytes.iter().copied());
        self.refresh_from(row);
        self.dirty = true;
        true
    }

    /// Delete the byte at column `at`.
    pub fn delete_char(&mut self, row: usize, at: usize) -> bool {
        let Some(target) = self.rows.get_mut(row) else {
            return false;
        };
        if at >= target.raw.len() {
            return false;
        }
        target.raw.remove(at);
        self.refresh_from(row);
        self.dirty = true;
        true
    }

    /// Append `text` to the end of row `row`.
    pub fn append_string(&mut self, row: usize, text: &[u8]) -> bool {
        let Some(target) = self.rows.get_mut(row) else {
            return false;
        };
        target.raw.extend_from_slice(text);
        self.refresh_from(row);
        self.dirty = true;
        true
    }

    /// Split row `row` at column `at`; the tail becomes a new row below.
    pub fn split_row(&mut self, row: usize, at: usize) -> bool {
        let Some(target) = self.rows.get_mut(row) else {
            return false;
        };
        let at = at.min(target.raw.len());
        let tail = target.raw.split_off(at);
        self.refresh_from(row);
        self.insert_row(row + 1, &tail)
    }

    /// Join row `row` onto the end of row `row - 1`.
    pub fn join_with_previous(&mut self, row: usize) -> bool {
        if row == 0 || row >= self.rows.len() {
            return false;
        }
        let moved = self.rows[row].raw.clone();
        self.append_string(row - 1, &moved) && self.delete_row(row)
    }

    /// Serialize to the on-disk form: each row followed by one `\n`.
    #[must_use]
    pub fn rows_to_text(&self) -> Vec<u8> {
        let total = self.rows.iter().map(|r| r.len() + 1).sum();
        let mut out = Vec::with_capacity(total);
        for row in &self.rows {
            out.extend_from_slice(row.raw());
            out.push(b'\n');
        }
        out
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn renumber_from(&mut self, start: usize) {
        for (index, row) in self.rows.iter_mut().enumerate().skip(start) {
            row.index = index;
        }
    }

    fn refresh_all(&mut self) {
        let mut in_comment = false;
        for row in &mut self.rows {
            in_comment = row.refresh(self.syntax, in_comment);
        }
    }

    /// Re-highlight row `at`, then each following row whose entering comment
    /// state no longer matches its predecessor.
    fn refresh_from(&mut self, at: usize) {
        let mut in_comment = at
            .checked_sub(1)
            .and_then(|prev| self.rows.get(prev))
            .is_some_and(Row::open_comment);
        let mut refreshed = 0usize;
        for row in self.rows.iter_mut().skip(at) {
            if refreshed > 0 && row.entered_in_comment == in_comment {
                break;
            }
            in_comment = row.refresh(self.syntax, in_comment);
            refreshed += 1;
        }
        if refreshed > 1 {
            tracing::trace!(row = at, refreshed, "highlight cascade");
        }
    }
}
