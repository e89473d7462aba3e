#![forbid(unsafe_code)]

//! Raw-mode terminal session.
//!
//! [`TerminalSession`] owns the controlling terminal (`/dev/tty`). Entering
//! raw mode saves the original termios; leaving it, dropping the session, or
//! panicking restores them. Reads use `VMIN = 0, VTIME = 1`, so every read
//! returns after at most 100 ms, which is the escape-sequence timeout used by
//! [`crate::input::read_key`].
//!
//! # Cleanup Guarantees
//!
//! - `Drop` restores the saved termios and shows the cursor.
//! - A panic hook performs the same restore before the previous hook runs.
//!   This matters when the binary is built with `panic = "abort"`, where
//!   `Drop` never runs.
//! - [`SignalFlags`] turns SIGTERM/SIGHUP into a flag the run loop polls, so
//!   termination also unwinds through `Drop`.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices,
    Termios,
};
use signal_hook::consts::{SIGHUP, SIGTERM, SIGWINCH};
use signal_hook::SigId;

use crate::event::KeyEvent;
use crate::input::{self, ByteSource, MAX_REPORT_LEN};

// ── Escape Sequences ─────────────────────────────────────────────────────

const QUERY_CURSOR: &[u8] = b"\x1b[6n";
const CURSOR_FAR_CORNER: &[u8] = b"\x1b[999C\x1b[999B";
const SHOW_CURSOR: &[u8] = b"\x1b[?25h";

/// Termios saved by the most recent raw-mode entry, for the panic hook.
static SAVED_TERMIOS: Mutex<Option<Termios>> = Mutex::new(None);

/// Exclusive handle on the controlling terminal.
#[derive(Debug)]
pub struct TerminalSession {
    tty: File,
    original: Termios,
    raw: bool,
}

impl TerminalSession {
    /// Open `/dev/tty` and snapshot its current termios.
    ///
    /// # Errors
    ///
    /// Fails if there is no controlling terminal or it is not a TTY.
    pub fn open() -> io::Result<Self> {
        let tty = OpenOptions::new().read(true).write(true).open("/dev/tty")?;
        let original = termios::tcgetattr(&tty).map_err(io::Error::from)?;
        install_panic_hook();
        Ok(Self {
            tty,
            original,
            raw: false,
        })
    }

    /// Whether raw mode is currently active.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Switch the terminal into raw mode. Calling it twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the `tcsetattr` failure.
    pub fn enable_raw_mode(&mut self) -> io::Result<()> {
        if self.raw {
            return Ok(());
        }
        let mut raw = self.original.clone();
        raw.input_flags.remove(
            InputFlags::BRKINT
                | InputFlags::ICRNL
                | InputFlags::INPCK
                | InputFlags::ISTRIP
                | InputFlags::IXON,
        );
        raw.output_flags.remove(OutputFlags::OPOST);
        raw.control_flags.insert(ControlFlags::CS8);
        raw.local_flags
            .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 1;

        termios::tcsetattr(&self.tty, SetArg::TCSAFLUSH, &raw).map_err(io::Error::from)?;
        if let Ok(mut saved) = SAVED_TERMIOS.lock() {
            *saved = Some(self.original.clone());
        }
        self.raw = true;
        #[cfg(feature = "tracing")]
        tracing::info!("terminal raw mode enabled");
        Ok(())
    }

    /// Restore the termios captured at [`TerminalSession::open`]. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the `tcsetattr` failure.
    pub fn disable_raw_mode(&mut self) -> io::Result<()> {
        if !self.raw {
            return Ok(());
        }
        termios::tcsetattr(&self.tty, SetArg::TCSAFLUSH, &self.original)
            .map_err(io::Error::from)?;
        if let Ok(mut saved) = SAVED_TERMIOS.lock() {
            *saved = None;
        }
        self.raw = false;
        #[cfg(feature = "tracing")]
        tracing::info!("terminal raw mode disabled");
        Ok(())
    }

    /// Write a complete frame with a single `write_all` and flush.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.tty.write_all(frame)?;
        self.tty.flush()
    }

    /// Wait one read window for a key. `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Propagates read failures other than interruption.
    pub fn read_key(&mut self) -> io::Result<Option<KeyEvent>> {
        input::read_key(self)
    }

    /// Terminal size as `(rows, cols)`.
    ///
    /// Uses the `TIOCGWINSZ` ioctl and falls back to moving the cursor to the
    /// far corner and asking where it ended up.
    ///
    /// # Errors
    ///
    /// Fails if both the ioctl and the cursor-report fallback fail.
    pub fn window_size(&mut self) -> io::Result<(u16, u16)> {
        match rustix::termios::tcgetwinsize(&self.tty) {
            Ok(ws) if ws.ws_col != 0 => Ok((ws.ws_row, ws.ws_col)),
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!("ioctl window size unavailable, querying cursor");
                self.window_size_by_cursor()
            }
        }
    }

    fn window_size_by_cursor(&mut self) -> io::Result<(u16, u16)> {
        let (orig_row, orig_col) = self.cursor_position()?;
        self.write_frame(CURSOR_FAR_CORNER)?;
        let size = self.cursor_position()?;
        let restore = format!("\x1b[{orig_row};{orig_col}H");
        self.write_frame(restore.as_bytes())?;
        Ok(size)
    }

    /// Ask the terminal for the cursor position, 1-based `(row, col)`.
    ///
    /// Requires raw mode, otherwise the reply is line-buffered and echoed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if the report is missing or malformed.
    pub fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        self.write_frame(QUERY_CURSOR)?;
        let mut report = Vec::with_capacity(MAX_REPORT_LEN);
        while report.len() < MAX_REPORT_LEN {
            match self.read_byte()? {
                Some(b'R') | None => break,
                Some(byte) => report.push(byte),
            }
        }
        input::parse_cursor_report(&report).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "malformed cursor position report")
        })
    }
}

impl ByteSource for TerminalSession {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.tty.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl Write for TerminalSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tty.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tty.flush()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.tty.write_all(SHOW_CURSOR);
        let _ = self.tty.flush();
        let _ = self.disable_raw_mode();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_restore();
            previous(info);
        }));
    });
}

fn best_effort_restore() {
    let Ok(mut saved) = SAVED_TERMIOS.lock() else {
        return;
    };
    let Some(original) = saved.take() else {
        return;
    };
    if let Ok(mut tty) = OpenOptions::new().read(true).write(true).open("/dev/tty") {
        let _ = tty.write_all(SHOW_CURSOR);
        let _ = termios::tcsetattr(&tty, SetArg::TCSAFLUSH, &original);
    }
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// Resize and termination signals, recorded as flags.
///
/// Handlers only store into an atomic; the editor polls between reads, so
/// the process stays single-threaded.
#[derive(Debug)]
pub struct SignalFlags {
    resized: Arc<AtomicBool>,
    terminate: Arc<AtomicBool>,
    ids: Vec<SigId>,
}

impl SignalFlags {
    /// Register SIGWINCH, SIGTERM and SIGHUP handlers.
    ///
    /// # Errors
    ///
    /// Fails if a handler cannot be installed.
    pub fn register() -> io::Result<Self> {
        let resized = Arc::new(AtomicBool::new(false));
        let terminate = Arc::new(AtomicBool::new(false));
        let ids = vec![
            signal_hook::flag::register(SIGWINCH, Arc::clone(&resized))?,
            signal_hook::flag::register(SIGTERM, Arc::clone(&terminate))?,
            signal_hook::flag::register(SIGHUP, Arc::clone(&terminate))?,
        ];
        Ok(Self {
            resized,
            terminate,
            ids,
        })
    }

    /// Returns `true` once per received SIGWINCH burst.
    pub fn take_resize(&self) -> bool {
        self.resized.swap(false, Ordering::Relaxed)
    }

    /// Whether a termination signal has arrived.
    #[must_use]
    pub fn should_terminate(&self) -> bool {
        self.terminate.load(Ordering::Relaxed)
    }
}

impl Drop for SignalFlags {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}
