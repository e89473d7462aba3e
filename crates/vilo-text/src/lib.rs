#![forbid(unsafe_code)]

//! Text model for vilo.
//!
//! - [`RowStore`]: the ordered rows of one buffer and every mutation on them.
//! - [`Row`] / [`render_row`]: raw and display forms of a line.
//! - [`syntax`]: per-row highlighting with multi-line comment carry-over.
//! - [`text_object`]: cursor-relative spans used by motions and deletes.
//! - [`search`]: row-wise substring search.

pub mod row;
pub mod search;
pub mod store;
pub mod syntax;
pub mod text_object;

pub use row::{RenderedLine, Row, TAB_STOP, render_row};
pub use search::{Direction, Match};
pub use store::RowStore;
pub use syntax::{HighlightClass, SyntaxProfile, select_profile};
pub use text_object::{CharCursor, Point, TextObject, WordKind};
