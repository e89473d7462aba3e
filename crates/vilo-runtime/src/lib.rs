#![forbid(unsafe_code)]

//! Editing runtime for vilo.
//!
//! - [`Editor`]: the modal engine; feed it keys, ask it for frames.
//! - [`buffer`]: open files, cursors, and the buffer list.
//! - [`command`]: the colon-command trie.
//! - [`file`]: whole-file load and save.

pub mod buffer;
pub mod command;
pub mod config;
pub mod editor;
pub mod error;
pub mod file;

pub use buffer::{Buffer, BufferId, BufferManager, Mode, Viewport};
pub use command::{CommandRegistry, Dispatch, Handler};
pub use config::EditorConfig;
pub use editor::{Control, Editor};
pub use error::StartupError;
