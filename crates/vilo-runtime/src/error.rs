#![forbid(unsafe_code)]

//! Fatal editor errors.
//!
//! Most failures after startup are reported on the status line instead; only
//! these abort the process. [`StartupError::Session`] covers the terminal
//! going away mid-session.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// A failure that prevents the editor from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Standard input or the controlling terminal is not a TTY.
    NotATty,
    /// Neither the ioctl nor the cursor-report fallback produced a size.
    WindowSize(io::Error),
    /// The file exists but could not be read.
    Open { path: PathBuf, source: io::Error },
    /// Entering raw mode or registering signal handlers failed.
    Terminal(io::Error),
    /// Reading keys from or drawing to the terminal failed while editing.
    Session(io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::NotATty => write!(f, "not a terminal"),
            StartupError::WindowSize(e) => write!(f, "unable to query the screen size: {e}"),
            StartupError::Open { path, source } => {
                write!(f, "cannot open {}: {source}", path.display())
            }
            StartupError::Terminal(e) => write!(f, "terminal error: {e}"),
            StartupError::Session(e) => write!(f, "terminal I/O failed while editing: {e}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::NotATty => None,
            StartupError::WindowSize(e)
            | StartupError::Terminal(e)
            | StartupError::Session(e) => Some(e),
            StartupError::Open { source, .. } => Some(source),
        }
    }
}
