#![forbid(unsafe_code)]

//! Row-wise substring search over rendered text.

use memchr::memmem;

use crate::store::RowStore;

/// Direction of a search step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// First occurrence of the query on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub row: usize,
    /// Offset into the row's rendered bytes.
    pub offset: usize,
}

/// Row after `row` in `direction`, wrapping around `len` rows.
#[must_use]
pub fn step(row: usize, len: usize, direction: Direction) -> usize {
    if len == 0 {
        return 0;
    }
    match direction {
        Direction::Forward => (row + 1) % len,
        Direction::Backward => (row + len - 1) % len,
    }
}

/// Search every row once, beginning with `start` and moving in `direction`
/// with wraparound. Returns the first row containing `query`.
#[must_use]
pub fn find_from(
    rows: &RowStore,
    query: &[u8],
    start: usize,
    direction: Direction,
) -> Option<Match> {
    if query.is_empty() || rows.is_empty() {
        return None;
    }
    let finder = memmem::Finder::new(query);
    let mut current = start % rows.len();
    for _ in 0..rows.len() {
        if let Some(offset) = rows.row(current).and_then(|r| finder.find(r.rendered())) {
            return Some(Match {
                row: current,
                offset,
            });
        }
        current = step(current, rows.len(), direction);
    }
    None
}
