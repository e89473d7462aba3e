#![forbid(unsafe_code)]

//! Frame composition for vilo.
//!
//! [`compose`] turns a [`View`] of the buffer into one escape-sequence frame
//! inside an [`OutputBuffer`]; the caller writes it to the terminal with a
//! single [`OutputBuffer::flush_into`].

pub mod ansi;
pub mod buffer;
pub mod screen;

pub use buffer::OutputBuffer;
pub use screen::{Selection, SelectionKind, StatusLine, View, compose};
