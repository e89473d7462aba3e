#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! Defaults can be overridden through `VILO_*` environment variables:
//!
//! | Variable                 | Effect                                   |
//! |--------------------------|------------------------------------------|
//! | `VILO_STATUS_TIMEOUT_MS` | How long a status message stays visible  |
//! | `VILO_NO_QUIT_CONFIRM`   | `1` quits dirty buffers without asking   |
//!
//! Values that fail to parse are ignored.

use std::env;
use std::time::Duration;

/// Default lifetime of a status message.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime knobs for an [`crate::Editor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// How long a status message is shown after it is set.
    pub status_timeout: Duration,
    /// Ask before quitting with unsaved changes.
    pub quit_confirm: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            quit_confirm: true,
        }
    }
}

impl EditorConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults with overrides taken from `lookup`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(val) = lookup("VILO_STATUS_TIMEOUT_MS")
            && let Ok(ms) = val.trim().parse()
        {
            config.status_timeout = Duration::from_millis(ms);
        }
        if let Some(val) = lookup("VILO_NO_QUIT_CONFIRM") {
            config.quit_confirm = !matches!(val.trim(), "1" | "true" | "yes");
        }
        config
    }
}
