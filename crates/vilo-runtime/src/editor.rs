#![forbid(unsafe_code)]

//! The modal engine.
//!
//! [`Editor::handle_key`] is the whole input path: it takes one decoded key,
//! updates state, and tells the caller whether to keep running. Sub-modes
//! that need several keys (the colon prompt, incremental search, the quit
//! confirmation) are states here rather than nested read loops, so the
//! engine runs the same with a terminal or with scripted keys in tests.
//!
//! # Modes
//!
//! ```text
//!            i o O A f<c>              v / V
//!   Insert <─────────────── Normal ─────────────> Visual
//!          ───────────────>        <─────────────
//!                Esc                 Esc, d, v / V
//! ```

use std::io;
use std::mem;
use std::path::Path;
use std::time::Instant;

use vilo_core::{KeyCode, KeyEvent};
use vilo_render::{OutputBuffer, Selection, SelectionKind, StatusLine, View, compose};
use vilo_text::search::{self, Direction};
use vilo_text::text_object::{self, TextObject, WordKind};
use vilo_text::{HighlightClass, Point};

use crate::buffer::{Buffer, BufferManager, Mode, Viewport};
use crate::command::{CommandRegistry, Dispatch, Handler};
use crate::config::EditorConfig;
use crate::error::StartupError;

/// Version shown in the welcome line.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest accepted search query, in bytes.
pub const MAX_QUERY_LEN: usize = 256;

const QUIT_WARNING: &str =
    "WARNING!!! File has unsaved changes. Do you want to continue? (y/n)";
const NO_OBJECT: &str = "No text object found";

/// What the run loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

// ── Sub-states ───────────────────────────────────────────────────────────

/// Operator waiting for its target in Normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pending {
    #[default]
    None,
    Delete,
    DeleteInner,
    Find,
}

#[derive(Debug, Default)]
struct Prompt {
    input: Vec<char>,
    cursor: usize,
}

impl Prompt {
    fn text(&self) -> String {
        self.input.iter().collect()
    }
}

#[derive(Debug)]
struct Search {
    query: Vec<u8>,
    start_row: usize,
    last_match: Option<usize>,
    /// Row and classes to put back before the next overlay.
    saved: Option<(usize, Vec<HighlightClass>)>,
    origin: (Point, Viewport),
}

#[derive(Debug, Default)]
enum Overlay {
    #[default]
    None,
    Prompt(Prompt),
    Search(Search),
    ConfirmQuit,
}

#[derive(Debug)]
struct StatusMessage {
    text: String,
    set_at: Instant,
}

/// Where a text-object motion leaves the cursor.
#[derive(Debug, Clone, Copy)]
enum Jump {
    Start,
    End,
    Stop,
    Opposite,
}

// ── Editor ───────────────────────────────────────────────────────────────

/// Editor state: every open buffer, the command table, and the transient
/// status line.
#[derive(Debug)]
pub struct Editor {
    buffers: BufferManager,
    commands: CommandRegistry<Editor>,
    config: EditorConfig,
    status: Option<StatusMessage>,
    overlay: Overlay,
    pending: Pending,
    quit: bool,
    welcome: String,
}

impl Editor {
    /// Editor over `buffers` with the built-in commands registered.
    #[must_use]
    pub fn new(buffers: BufferManager, config: EditorConfig) -> Self {
        let mut editor = Self {
            buffers,
            commands: CommandRegistry::new(),
            config,
            status: None,
            overlay: Overlay::None,
            pending: Pending::None,
            quit: false,
            welcome: format!("vilo editor -- version {VERSION}"),
        };
        register_builtins(&mut editor.commands);
        editor
    }

    /// Load `path` into a fresh editor.
    ///
    /// # Errors
    ///
    /// [`StartupError::Open`] if the file exists but cannot be read.
    pub fn open(path: &Path, config: EditorConfig) -> Result<Self, StartupError> {
        let buffer = Buffer::open(path).map_err(|source| StartupError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(file = %path.display(), lines = buffer.rows().len(), "opened buffer");
        Ok(Self::new(BufferManager::new(buffer), config))
    }

    #[must_use]
    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        self.buffers.active()
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        self.buffers.active_mut()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.buffer().mode()
    }

    /// Command table, for registering extra commands.
    pub fn commands_mut(&mut self) -> &mut CommandRegistry<Editor> {
        &mut self.commands
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Apply a terminal size. Two rows are reserved for the status and
    /// message lines.
    pub fn set_screen_size(&mut self, rows: usize, cols: usize) {
        self.buffers.set_screen_size(rows.saturating_sub(2), cols);
    }

    /// Show `text` on the message line until the status timeout elapses.
    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            set_at: Instant::now(),
        });
    }

    /// The current status message, if it has not expired.
    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|m| m.set_at.elapsed() < self.config.status_timeout)
            .map(|m| m.text.as_str())
    }

    /// Whether a quit was requested.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    // ── Key dispatch ─────────────────────────────────────────────────────

    /// Feed one key through the state machine.
    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        match mem::take(&mut self.overlay) {
            Overlay::Prompt(prompt) => self.prompt_key(prompt, key),
            Overlay::Search(search) => self.search_key(search, key),
            Overlay::ConfirmQuit => self.confirm_key(key),
            Overlay::None => match self.mode() {
                Mode::Insert => self.insert_key(key),
                Mode::Normal | Mode::VisualChar | Mode::VisualLine => self.normal_key(key),
            },
        }
        if self.quit {
            Control::Quit
        } else {
            Control::Continue
        }
    }

    fn enter_mode(&mut self, mode: Mode) {
        let buf = self.buffer_mut();
        buf.set_mode(mode);
        if !mode.is_visual() {
            buf.set_anchor(None);
        }
    }

    fn normal_key(&mut self, key: KeyEvent) {
        let pending = mem::take(&mut self.pending);
        if pending != Pending::None && self.operator_key(pending, key) {
            return;
        }

        match key.code {
            KeyCode::Escape => self.enter_mode(Mode::Normal),
            KeyCode::Enter | KeyCode::Down => self.buffer_mut().move_down(),
            KeyCode::Up => self.buffer_mut().move_up(),
            KeyCode::Left | KeyCode::Backspace | KeyCode::Delete => self.buffer_mut().move_left(),
            KeyCode::Right => self.buffer_mut().move_right(),
            KeyCode::Home => self.buffer_mut().move_home(),
            KeyCode::End => self.buffer_mut().move_end(),
            KeyCode::PageUp => self.buffer_mut().page_up(),
            KeyCode::PageDown => self.buffer_mut().page_down(),
            KeyCode::Char('s') if key.is_ctrl('s') => {
                self.save();
            }
            KeyCode::Char(c) if !key.ctrl() => self.normal_char(c),
            _ => {}
        }
    }

    fn normal_char(&mut self, c: char) {
        let mode = self.mode();
        match c {
            'h' => self.buffer_mut().move_left(),
            'j' => self.buffer_mut().move_down(),
            'k' => self.buffer_mut().move_up(),
            'l' => self.buffer_mut().move_right(),
            'i' => self.enter_mode(Mode::Insert),
            'o' | 'O' => {
                self.buffer_mut().open_row(c == 'o');
                self.enter_mode(Mode::Insert);
            }
            'A' => {
                self.buffer_mut().move_end();
                self.enter_mode(Mode::Insert);
            }
            'f' => self.pending = Pending::Find,
            'x' => {
                self.buffer_mut().delete_under_cursor();
            }
            'v' | 'V' => self.toggle_visual(if c == 'v' {
                Mode::VisualChar
            } else {
                Mode::VisualLine
            }),
            'd' if mode.is_visual() => self.delete_selection(),
            'd' => self.pending = Pending::Delete,
            ':' => self.overlay = Overlay::Prompt(Prompt::default()),
            '/' => self.start_search(),
            'q' => self.quit_with_prompt(),
            _ => {
                if let Some((object, jump)) = self.resolve_object(c, false) {
                    self.jump_to_object(object, jump);
                }
            }
        }
    }

    /// Complete a pending operator. Returns `false` if `key` does not belong
    /// to it and should be handled as a fresh key.
    fn operator_key(&mut self, pending: Pending, key: KeyEvent) -> bool {
        let KeyCode::Char(c) = key.code else {
            return false;
        };
        if key.ctrl() {
            return false;
        }
        match pending {
            Pending::None => false,
            Pending::Find => {
                let mut utf8 = [0; 4];
                let encoded = c.encode_utf8(&mut utf8).as_bytes();
                if encoded.len() == 1 && self.buffer_mut().find_in_row(encoded[0]) {
                    self.enter_mode(Mode::Insert);
                }
                true
            }
            Pending::Delete if c == 'i' => {
                self.pending = Pending::DeleteInner;
                true
            }
            Pending::Delete | Pending::DeleteInner => {
                let inner = pending == Pending::DeleteInner;
                if let Some((object, _)) = self.resolve_object(c, inner) {
                    self.delete_object(object);
                }
                true
            }
        }
    }

    fn toggle_visual(&mut self, target: Mode) {
        let current = self.mode();
        if current == target {
            self.enter_mode(Mode::Normal);
            return;
        }
        let buf = self.buffer_mut();
        if current == Mode::Normal {
            let at = buf.cursor();
            buf.set_anchor(Some(at));
        }
        buf.set_mode(target);
    }

    fn insert_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Escape => self.enter_mode(Mode::Normal),
            KeyCode::Enter => self.buffer_mut().insert_newline(),
            KeyCode::Backspace | KeyCode::Delete => {
                self.buffer_mut().delete_backward();
            }
            KeyCode::Up => self.buffer_mut().move_up(),
            KeyCode::Down => self.buffer_mut().move_down(),
            KeyCode::Left => self.buffer_mut().move_left(),
            KeyCode::Right => self.buffer_mut().move_right(),
            KeyCode::Home => self.buffer_mut().move_home(),
            KeyCode::End => self.buffer_mut().move_end(),
            KeyCode::Char('s') if key.is_ctrl('s') => {
                self.save();
            }
            _ => {
                if let Some(c) = key.printable() {
                    let mut utf8 = [0; 4];
                    self.buffer_mut()
                        .insert_bytes(c.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }
    }

    // ── Text objects ─────────────────────────────────────────────────────

    /// Resolve the object named by `c` at the cursor.
    fn resolve_object(&mut self, c: char, inner: bool) -> Option<(TextObject, Jump)> {
        if !is_object_key(c) {
            return None;
        }
        let buf = self.buffers.active();
        let rows = buf.rows();
        let at = buf.cursor();
        let (object, jump) = match c {
            'w' | 'b' if inner => (text_object::word_object(rows, at, WordKind::Inner), Jump::Start),
            'w' => (text_object::word_object(rows, at, WordKind::Forward), Jump::Stop),
            'b' => (text_object::word_object(rows, at, WordKind::Backward), Jump::Start),
            '%' => (text_object::complement_object(rows, at), Jump::Opposite),
            '"' | '\'' => (text_object::quote_object(rows, at, c as u8, inner), Jump::Start),
            _ => {
                let (open, close) = bracket_pair(c)?;
                let jump = if c == open as char { Jump::Start } else { Jump::End };
                (text_object::pair_object(rows, at, open, close, inner), jump)
            }
        };
        match object {
            Some(object) if !object.is_empty() && object.is_valid_in(rows) => Some((object, jump)),
            _ => {
                self.set_status(NO_OBJECT);
                None
            }
        }
    }

    fn jump_to_object(&mut self, object: TextObject, jump: Jump) {
        let buf = self.buffers.active();
        let last = object.last(buf.rows()).unwrap_or(object.first);
        let target = match jump {
            Jump::Start => object.first,
            Jump::End => last,
            Jump::Stop => object.second,
            Jump::Opposite if buf.cursor() == object.first => last,
            Jump::Opposite => object.first,
        };
        self.buffer_mut().set_cursor(target);
    }

    fn delete_object(&mut self, object: TextObject) {
        let buf = self.buffer_mut();
        if text_object::delete_object(buf.rows_mut(), &object) {
            buf.set_cursor(object.first);
        } else {
            self.set_status(NO_OBJECT);
        }
    }

    fn delete_selection(&mut self) {
        let mode = self.mode();
        let buf = self.buffer_mut();
        let cursor = buf.cursor();
        let anchor = buf.anchor().unwrap_or(cursor);
        let earlier = anchor.min(cursor);
        let deleted = match mode {
            Mode::VisualLine => {
                let last = anchor.y.max(cursor.y).min(buf.rows().len().saturating_sub(1));
                buf.rows_mut().delete_rows(earlier.y, last)
            }
            _ => TextObject::inclusive(buf.rows(), anchor, cursor)
                .is_some_and(|object| text_object::delete_object(buf.rows_mut(), &object)),
        };
        buf.set_cursor(earlier);
        self.enter_mode(Mode::Normal);
        if !deleted {
            self.set_status(NO_OBJECT);
        }
    }

    // ── Colon prompt ─────────────────────────────────────────────────────

    fn prompt_key(&mut self, mut prompt: Prompt, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.status = None;
                self.run_command(&prompt.text());
                return;
            }
            KeyCode::Escape
            | KeyCode::Up
            | KeyCode::Down
            | KeyCode::PageUp
            | KeyCode::PageDown => {
                self.status = None;
                return;
            }
            KeyCode::Char('c' | 'q' | 's') if key.ctrl() => {
                self.status = None;
                return;
            }
            KeyCode::Backspace | KeyCode::Delete => {
                if prompt.cursor > 0 {
                    prompt.cursor -= 1;
                    prompt.input.remove(prompt.cursor);
                }
            }
            KeyCode::Left => prompt.cursor = prompt.cursor.saturating_sub(1),
            KeyCode::Right => prompt.cursor = (prompt.cursor + 1).min(prompt.input.len()),
            KeyCode::Tab => {
                let text = prompt.text();
                if !text.contains(' ')
                    && let Some(suffix) = self.commands.partial_lookup(&text)
                {
                    prompt.input.extend(suffix.chars());
                    prompt.cursor = prompt.input.len();
                }
            }
            _ => {
                if let Some(c) = key.printable().filter(|c| !c.is_control()) {
                    prompt.input.insert(prompt.cursor, c);
                    prompt.cursor += 1;
                }
            }
        }
        self.overlay = Overlay::Prompt(prompt);
    }

    /// Run a colon command line: the first word names the command, the rest
    /// is its argument.
    pub fn run_command(&mut self, line: &str) {
        let (name, arg) = match line.split_once(' ') {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        if name.is_empty() {
            return;
        }
        let commands = mem::take(&mut self.commands);
        let outcome = commands.dispatch(self, name, arg);
        self.commands = commands;
        match outcome {
            Dispatch::Invoked => {}
            Dispatch::NotFound => self.set_status(format!("function '{name}' not found")),
            Dispatch::MissingArgument => {
                self.set_status(format!("function '{name}' needs an argument"));
            }
        }
    }

    // ── Search ───────────────────────────────────────────────────────────

    fn start_search(&mut self) {
        let buf = self.buffer();
        let origin = (buf.cursor(), buf.viewport());
        self.overlay = Overlay::Search(Search {
            query: Vec::new(),
            start_row: origin.0.y,
            last_match: None,
            saved: None,
            origin,
        });
    }

    fn search_key(&mut self, mut search: Search, key: KeyEvent) {
        let mut direction = None;
        match key.code {
            KeyCode::Escape | KeyCode::Enter => {
                self.restore_overlay(&mut search);
                if key.code == KeyCode::Escape {
                    let (cursor, viewport) = search.origin;
                    let buf = self.buffer_mut();
                    buf.set_cursor(cursor);
                    buf.set_viewport(viewport);
                }
                self.status = None;
                return;
            }
            KeyCode::Backspace | KeyCode::Delete => {
                search.query.pop();
                search.last_match = None;
            }
            KeyCode::Right | KeyCode::Down => direction = Some(Direction::Forward),
            KeyCode::Left | KeyCode::Up => direction = Some(Direction::Backward),
            _ => {
                if let Some(c) = key.printable().filter(|c| !c.is_control()) {
                    let mut utf8 = [0; 4];
                    let bytes = c.encode_utf8(&mut utf8).as_bytes();
                    if search.query.len() + bytes.len() <= MAX_QUERY_LEN {
                        search.query.extend_from_slice(bytes);
                        search.last_match = None;
                    }
                }
            }
        }

        let start = match (search.last_match, direction) {
            (None, _) => Some((search.start_row, Direction::Forward)),
            (Some(last), Some(dir)) => {
                let len = self.buffer().rows().len();
                Some((search::step(last, len, dir), dir))
            }
            (Some(_), None) => None,
        };
        if let Some((row, dir)) = start {
            self.restore_overlay(&mut search);
            let found = search::find_from(self.buffer().rows(), &search.query, row, dir);
            if let Some(found) = found {
                search.last_match = Some(found.row);
                let buf = self.buffer_mut();
                if let Some(target) = buf.rows_mut().row_mut(found.row) {
                    let saved = target.overlay_match(found.offset, search.query.len());
                    search.saved = Some((found.row, saved));
                }
                buf.jump_to_match(found.row, found.offset);
            }
        }
        self.overlay = Overlay::Search(search);
    }

    fn restore_overlay(&mut self, search: &mut Search) {
        if let Some((row, saved)) = search.saved.take()
            && let Some(target) = self.buffer_mut().rows_mut().row_mut(row)
        {
            target.restore_highlight(saved);
        }
    }

    // ── Quit and save ────────────────────────────────────────────────────

    fn confirm_key(&mut self, key: KeyEvent) {
        if key.is_char('y') || key.is_char('Y') {
            self.quit = true;
        } else {
            self.set_status("Quit cancelled");
        }
    }

    /// Quit, asking first if any buffer has unsaved changes.
    pub fn quit_with_prompt(&mut self) {
        if self.config.quit_confirm && self.buffers.any_dirty() {
            self.set_status(QUIT_WARNING);
            self.overlay = Overlay::ConfirmQuit;
        } else {
            self.quit = true;
        }
    }

    /// Save the active buffer, reporting the outcome on the status line.
    /// Returns whether the write succeeded.
    pub fn save(&mut self) -> bool {
        let file = self.buffer().filename().display().to_string();
        match self.buffer_mut().save() {
            Ok(n) => {
                tracing::info!(file = %file, bytes = n, "saved");
                self.set_status(format!("{n} bytes written on disk"));
                true
            }
            Err(err) => {
                tracing::warn!(file = %file, error = %err, "save failed");
                self.set_status(format!("Can't save! I/O error: {err}"));
                false
            }
        }
    }

    // ── Drawing ──────────────────────────────────────────────────────────

    /// Compose the next frame into `out`, scrolling the viewport to the
    /// cursor first.
    ///
    /// # Errors
    ///
    /// Only if writing into `out` fails.
    pub fn refresh_screen(&mut self, out: &mut OutputBuffer) -> io::Result<()> {
        self.buffer_mut().scroll();

        let message = match &self.overlay {
            Overlay::Prompt(prompt) => format!(":{}", prompt.text()),
            Overlay::Search(search) => format!(
                "Search: {} (Use ESC/Arrows/Enter)",
                String::from_utf8_lossy(&search.query)
            ),
            Overlay::None | Overlay::ConfirmQuit => {
                self.status_message().unwrap_or_default().to_string()
            }
        };

        let buf = self.buffers.active();
        let viewport = buf.viewport();
        let filename = buf.filename().display().to_string();
        let filename = if filename.is_empty() {
            "[No Name]".to_string()
        } else {
            filename
        };
        let selection = match (buf.mode(), buf.anchor()) {
            (Mode::VisualChar, Some(anchor)) => {
                Some(Selection::between(SelectionKind::Char, anchor, buf.cursor()))
            }
            (Mode::VisualLine, Some(anchor)) => {
                Some(Selection::between(SelectionKind::Line, anchor, buf.cursor()))
            }
            _ => None,
        };
        let cursor = match &self.overlay {
            Overlay::Prompt(prompt) => (viewport.rows + 1, prompt.cursor + 1),
            _ => buf.cursor_on_screen(),
        };

        let view = View {
            rows: buf.rows(),
            row_offset: viewport.row_offset,
            col_offset: viewport.col_offset,
            text_rows: viewport.rows,
            cols: viewport.cols,
            status: StatusLine {
                filename: &filename,
                dirty: buf.is_dirty(),
                mode: buf.mode().label(),
                cursor_row: buf.cursor().y,
            },
            message: &message,
            welcome: Some(self.welcome.as_str()),
            selection,
            cursor,
        };
        compose(&view, out)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn is_object_key(c: char) -> bool {
    matches!(
        c,
        'w' | 'b' | '%' | '(' | ')' | '{' | '}' | '<' | '>' | '[' | ']' | '"' | '\''
    )
}

fn bracket_pair(c: char) -> Option<(u8, u8)> {
    match c {
        '(' | ')' => Some((b'(', b')')),
        '{' | '}' => Some((b'{', b'}')),
        '<' | '>' => Some((b'<', b'>')),
        '[' | ']' => Some((b'[', b']')),
        _ => None,
    }
}

// ── Built-in commands ────────────────────────────────────────────────────

fn register_builtins(commands: &mut CommandRegistry<Editor>) {
    commands.register("q", Handler::NoArg(Editor::quit_with_prompt));
    commands.register("q!", Handler::NoArg(|ed: &mut Editor| ed.quit = true));
    commands.register(
        "w",
        Handler::NoArg(|ed: &mut Editor| {
            ed.save();
        }),
    );
    commands.register("wq", Handler::NoArg(save_and_quit));
    commands.register("e", Handler::OneArg(edit_file));
    commands.register(
        "bn",
        Handler::NoArg(|ed: &mut Editor| {
            ed.buffers.next();
        }),
    );
    commands.register(
        "bp",
        Handler::NoArg(|ed: &mut Editor| {
            ed.buffers.prev();
        }),
    );
}

fn save_and_quit(ed: &mut Editor) {
    if ed.save() {
        ed.quit_with_prompt();
    }
}

fn edit_file(ed: &mut Editor, arg: &str) {
    if let Err(err) = ed.buffers.open(Path::new(arg)) {
        ed.set_status(format!("Can't open {arg}: {err}"));
    }
}
