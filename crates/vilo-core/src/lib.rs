#![forbid(unsafe_code)]

//! Terminal-facing primitives for vilo.
//!
//! - [`event`]: logical key events produced by the decoder.
//! - [`input`]: the byte-to-key decoder for raw terminal input.
//! - [`terminal`]: the raw-mode session guard, geometry queries, and signal flags.

pub mod event;
pub mod input;
#[cfg(unix)]
pub mod terminal;

pub use event::{KeyCode, KeyEvent, Modifiers};
pub use input::{ByteSource, read_key};
