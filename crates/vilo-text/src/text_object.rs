#![forbid(unsafe_code)]

//! Cursor-relative spans: words, bracket and quote pairs, and matching
//! brackets.
//!
//! Scans walk a [`CharCursor`], which views the buffer as one byte stream in
//! which every row ends with a virtual `\n`. Stepping off either end of the
//! buffer yields the end-of-stream sentinel, and every scan treats that as
//! "no object" rather than wrapping or spinning.
//!
//! All objects are half-open: `[first, second)` in stream order.

use crate::store::RowStore;

/// A position in the buffer. Orders row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    // `y` first so the derived ordering is row-major.
    pub y: usize,
    pub x: usize,
}

impl Point {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { y, x }
    }
}

// ---------------------------------------------------------------------------
// CharCursor
// ---------------------------------------------------------------------------

/// Bounds-checked cursor over the buffer's byte stream.
///
/// Valid positions are `(x, y)` with `y < rows.len()` and
/// `x <= row_len(y)`; `x == row_len(y)` is the row's `\n`. Once the cursor
/// steps outside, it stays at the end-of-stream sentinel.
#[derive(Debug, Clone, Copy)]
pub struct CharCursor<'a> {
    rows: &'a RowStore,
    pos: Option<Point>,
}

impl<'a> CharCursor<'a> {
    /// Cursor at `at`, or `None` if `at` is not a valid stream position.
    #[must_use]
    pub fn new(rows: &'a RowStore, at: Point) -> Option<Self> {
        (at.y < rows.len() && at.x <= rows.row_len(at.y)).then_some(Self {
            rows,
            pos: Some(at),
        })
    }

    /// Current position, `None` at end of stream.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        self.pos
    }

    /// Byte under the cursor: the row byte, `\n` at row end, `None` at end
    /// of stream.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        let pos = self.pos?;
        let text = self.rows.row_text(pos.y);
        Some(text.get(pos.x).copied().unwrap_or(b'\n'))
    }

    /// Step forward. Returns `false` once the end of stream is reached.
    pub fn advance(&mut self) -> bool {
        let Some(pos) = self.pos else {
            return false;
        };
        self.pos = if pos.x < self.rows.row_len(pos.y) {
            Some(Point::new(pos.x + 1, pos.y))
        } else if pos.y + 1 < self.rows.len() {
            Some(Point::new(0, pos.y + 1))
        } else {
            None
        };
        self.pos.is_some()
    }

    /// Step backward. Returns `false` once the start of stream is passed.
    pub fn retreat(&mut self) -> bool {
        let Some(pos) = self.pos else {
            return false;
        };
        self.pos = if pos.x > 0 {
            Some(Point::new(pos.x - 1, pos.y))
        } else if pos.y > 0 {
            Some(Point::new(self.rows.row_len(pos.y - 1), pos.y - 1))
        } else {
            None
        };
        self.pos.is_some()
    }

    /// Position one step after the current one, without moving.
    fn next_position(&self) -> Option<Point> {
        let mut next = *self;
        next.advance().then_some(next.pos).flatten()
    }
}

// ---------------------------------------------------------------------------
// TextObject
// ---------------------------------------------------------------------------

/// A resolved half-open span `[first, second)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextObject {
    pub first: Point,
    pub second: Point,
}

impl TextObject {
    #[must_use]
    pub const fn new(first: Point, second: Point) -> Self {
        Self { first, second }
    }

    /// Whether the span covers nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first >= self.second
    }

    /// Whether both endpoints lie on existing rows and are ordered.
    #[must_use]
    pub fn is_valid_in(&self, rows: &RowStore) -> bool {
        let within = |p: Point| p.y < rows.len() && p.x <= rows.row_len(p.y);
        self.first <= self.second && within(self.first) && within(self.second)
    }

    /// Last position covered by the span.
    #[must_use]
    pub fn last(&self, rows: &RowStore) -> Option<Point> {
        let mut cursor = CharCursor::new(rows, self.second)?;
        cursor.retreat().then_some(cursor.pos).flatten()
    }

    /// Inclusive character selection between two points, in either order.
    ///
    /// The end is extended one position so the byte under it is covered; if
    /// that would step past the buffer, the span stops at the final row end.
    #[must_use]
    pub fn inclusive(rows: &RowStore, a: Point, b: Point) -> Option<Self> {
        let clamp = |p: Point| Point::new(p.x.min(rows.row_len(p.y)), p.y);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (lo, hi) = (clamp(lo), clamp(hi));
        let end = CharCursor::new(rows, hi)?;
        let second = end.next_position().unwrap_or(hi);
        Some(Self::new(lo, second))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Which word span to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    /// From the cursor to the end of the next word (`w`).
    Forward,
    /// From the start of the previous word to the cursor (`b`).
    Backward,
    /// The run of word or blank characters around the cursor (`iw`).
    Inner,
}

fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n')
}

/// Word span relative to `at`. `None` if the scan runs off the buffer.
#[must_use]
pub fn word_object(rows: &RowStore, at: Point, kind: WordKind) -> Option<TextObject> {
    let mut cursor = CharCursor::new(rows, at)?;
    match kind {
        WordKind::Forward => {
            while cursor.peek().is_some_and(is_blank) {
                if !cursor.advance() {
                    return None;
                }
            }
            while cursor.peek().is_some_and(|b| !is_blank(b)) {
                if !cursor.advance() {
                    return None;
                }
            }
            Some(TextObject::new(at, cursor.position()?))
        }
        WordKind::Backward => {
            if !cursor.retreat() {
                return None;
            }
            while cursor.peek().is_some_and(is_blank) {
                if !cursor.retreat() {
                    return None;
                }
            }
            let mut start = cursor.position()?;
            while let Some(b) = cursor.peek()
                && !is_blank(b)
            {
                start = cursor.position()?;
                if !cursor.retreat() {
                    break;
                }
            }
            Some(TextObject::new(start, at))
        }
        WordKind::Inner => {
            let class = |b: u8| match b {
                b'\n' => 0,
                b' ' | b'\t' => 1,
                _ => 2,
            };
            let here = class(cursor.peek()?);
            if here == 0 {
                return None;
            }
            let mut start = at;
            let mut back = cursor;
            while back.retreat() && back.peek().is_some_and(|b| class(b) == here) {
                start = back.position()?;
            }
            while cursor.peek().is_some_and(|b| class(b) == here) {
                if !cursor.advance() {
                    return None;
                }
            }
            Some(TextObject::new(start, cursor.position()?))
        }
    }
}

/// Bracket pair enclosing `at` (or starting at it).
///
/// Scanning backward counts `close` as one level deeper and stops on the
/// `open` that brings nesting back to zero; the forward scan mirrors it.
/// `inner` excludes the delimiters.
#[must_use]
pub fn pair_object(
    rows: &RowStore,
    at: Point,
    open: u8,
    close: u8,
    inner: bool,
) -> Option<TextObject> {
    let mut back = CharCursor::new(rows, at)?;
    let here = back.peek()?;
    if here != open {
        if here == close && !back.retreat() {
            return None;
        }
        let mut depth = 0usize;
        loop {
            let byte = back.peek()?;
            if byte == close {
                depth += 1;
            } else if byte == open {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            if !back.retreat() {
                return None;
            }
        }
    }

    let mut fwd = back;
    let mut depth = 0usize;
    loop {
        if !fwd.advance() {
            return None;
        }
        let byte = fwd.peek()?;
        if byte == open {
            depth += 1;
        } else if byte == close {
            if depth == 0 {
                break;
            }
            depth -= 1;
        }
    }

    if inner {
        Some(TextObject::new(back.next_position()?, fwd.position()?))
    } else {
        Some(TextObject::new(back.position()?, fwd.next_position()?))
    }
}

/// Quoted span on the cursor's row. Quotes do not nest: the nearest quote
/// before the cursor opens, the next one after it closes.
///
/// A quote under the cursor closes a string when an odd number of quotes
/// precede it on the row, and opens one otherwise.
#[must_use]
pub fn quote_object(rows: &RowStore, at: Point, quote: u8, inner: bool) -> Option<TextObject> {
    let text = rows.row_text(at.y);
    if at.y >= rows.len() || at.x >= text.len() {
        return None;
    }
    let before = &text[..at.x];
    let next_after = |from: usize| {
        text[from + 1..]
            .iter()
            .position(|&b| b == quote)
            .map(|i| from + 1 + i)
    };
    let (open, close) = if text[at.x] == quote {
        if before.iter().filter(|&&b| b == quote).count() % 2 == 1 {
            (before.iter().rposition(|&b| b == quote)?, at.x)
        } else {
            (at.x, next_after(at.x)?)
        }
    } else {
        let open = before.iter().rposition(|&b| b == quote)?;
        (open, next_after(open)?)
    };
    let (first, second) = if inner {
        (open + 1, close)
    } else {
        (open, close + 1)
    };
    Some(TextObject::new(
        Point::new(first, at.y),
        Point::new(second, at.y),
    ))
}

/// Partner of a bracket and whether the partner lies forward.
fn complement_of(byte: u8) -> Option<(u8, bool)> {
    match byte {
        b'(' => Some((b')', true)),
        b'[' => Some((b']', true)),
        b'{' => Some((b'}', true)),
        b'<' => Some((b'>', true)),
        b')' => Some((b'(', false)),
        b']' => Some((b'[', false)),
        b'}' => Some((b'{', false)),
        b'>' => Some((b'<', false)),
        _ => None,
    }
}

/// Step outward from `from` in both directions at once until a closing
/// bracket ahead or an opening bracket behind turns up.
fn nearest_bracket(from: CharCursor<'_>) -> Option<CharCursor<'_>> {
    let mut fwd = from;
    let mut back = from;
    let (mut fwd_live, mut back_live) = (true, true);
    while fwd_live || back_live {
        if fwd_live {
            fwd_live = fwd.advance();
            if fwd.peek().and_then(complement_of).is_some_and(|(_, ahead)| !ahead) {
                return Some(fwd);
            }
        }
        if back_live {
            back_live = back.retreat();
            if back.peek().and_then(complement_of).is_some_and(|(_, ahead)| ahead) {
                return Some(back);
            }
        }
    }
    None
}

/// Span from the bracket under (or nearest to) `at` through its partner,
/// both included.
#[must_use]
pub fn complement_object(rows: &RowStore, at: Point) -> Option<TextObject> {
    let cursor = CharCursor::new(rows, at)?;
    let start = if cursor.peek().and_then(complement_of).is_some() {
        cursor
    } else {
        nearest_bracket(cursor)?
    };
    let bracket = start.peek()?;
    let (partner, forward) = complement_of(bracket)?;

    let mut scan = start;
    let mut depth = 0usize;
    loop {
        let moved = if forward { scan.advance() } else { scan.retreat() };
        if !moved {
            return None;
        }
        let byte = scan.peek()?;
        if byte == bracket {
            depth += 1;
        } else if byte == partner {
            if depth == 0 {
                break;
            }
            depth -= 1;
        }
    }

    let (lo, hi) = if forward { (start, scan) } else { (scan, start) };
    Some(TextObject::new(lo.position()?, hi.next_position()?))
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Delete the span, splicing the boundary rows together when it crosses
/// rows. Returns `false` for empty or invalid objects.
pub fn delete_object(rows: &mut RowStore, object: &TextObject) -> bool {
    if object.is_empty() || !object.is_valid_in(rows) {
        return false;
    }
    let TextObject { first, second } = *object;
    let head = &rows.row_text(first.y)[..first.x];
    let tail = &rows.row_text(second.y)[second.x..];
    let mut joined = Vec::with_capacity(head.len() + tail.len());
    joined.extend_from_slice(head);
    joined.extend_from_slice(tail);

    rows.set_row_text(first.y, &joined);
    if second.y > first.y {
        rows.delete_rows(first.y + 1, second.y);
    }
    true
}
