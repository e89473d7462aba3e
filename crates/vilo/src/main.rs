#![forbid(unsafe_code)]

//! vilo binary entry point.
//!
//! Startup order matters: the file is loaded and logging installed while the
//! terminal is still cooked, so errors print normally. Raw mode is entered
//! last and left when the [`TerminalSession`] drops.

mod cli;

use std::env;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use vilo_core::terminal::{SignalFlags, TerminalSession};
use vilo_render::OutputBuffer;
use vilo_render::ansi;
use vilo_runtime::{Control, Editor, EditorConfig, StartupError};

const DEFAULT_LOG_FILE: &str = "vilo.log";

fn main() {
    let opts = cli::Opts::parse();
    init_logging();

    if let Err(err) = run(&opts) {
        tracing::error!(error = %err, "editor failed");
        eprintln!("vilo: {err}");
        process::exit(1);
    }
}

/// Install a file-backed subscriber when `VILO_LOG` is set.
///
/// The terminal belongs to the editor, so events never go to stderr.
fn init_logging() {
    let Ok(filter) = env::var("VILO_LOG") else {
        return;
    };
    let path = env::var_os("VILO_LOG_FILE")
        .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from);
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Warning: could not open log file {}: {err}", path.display());
            return;
        }
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    if let Err(err) = installed {
        eprintln!("Warning: logging disabled: {err}");
    }
}

fn run(opts: &cli::Opts) -> Result<(), StartupError> {
    let config = EditorConfig::from_env();
    let mut editor = Editor::open(&opts.filename, config)?;

    let mut tty = TerminalSession::open().map_err(|_| StartupError::NotATty)?;
    tty.enable_raw_mode().map_err(StartupError::Terminal)?;
    let (rows, cols) = tty.window_size().map_err(StartupError::WindowSize)?;
    editor.set_screen_size(usize::from(rows), usize::from(cols));
    let signals = SignalFlags::register().map_err(StartupError::Terminal)?;
    tracing::info!(rows, cols, file = %opts.filename.display(), "editor started");

    let mut frame = OutputBuffer::with_screen(usize::from(rows), usize::from(cols));
    loop {
        if signals.should_terminate() {
            tracing::info!("termination signal received");
            break;
        }
        if signals.take_resize() {
            apply_resize(&mut editor, tty.window_size());
        }

        editor
            .refresh_screen(&mut frame)
            .map_err(StartupError::Session)?;
        frame.flush_into(&mut tty).map_err(StartupError::Session)?;

        let Some(key) = tty.read_key().map_err(StartupError::Session)? else {
            continue;
        };
        if editor.handle_key(key) == Control::Quit {
            break;
        }
    }

    frame.append(ansi::CLEAR_SCREEN);
    frame.append(ansi::CURSOR_HOME);
    frame.flush_into(&mut tty).map_err(StartupError::Session)?;
    tracing::info!("editor exited");
    Ok(())
}

/// Adopt the size reported after SIGWINCH. A failed query keeps the previous
/// size so the session, and any unsaved edits, survive.
fn apply_resize(editor: &mut Editor, size: io::Result<(u16, u16)>) {
    match size {
        Ok((rows, cols)) => {
            tracing::debug!(rows, cols, "window resized");
            editor.set_screen_size(usize::from(rows), usize::from(cols));
        }
        Err(err) => {
            tracing::warn!(error = %err, "window size query failed after resize");
            editor.set_status(format!("Can't read window size: {err}"));
        }
    }
}
