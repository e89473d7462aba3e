//! Scenario tests for the modal engine, driven by scripted keys.
//!
//! Every test builds an [`Editor`] without a terminal, feeds it
//! [`KeyEvent`]s, and inspects buffer text, cursor, mode, and the status
//! message.

use std::fs;
use std::path::Path;

use vilo_core::{KeyCode, KeyEvent};
use vilo_runtime::{Buffer, BufferManager, Control, Editor, EditorConfig, Mode};
use vilo_text::{HighlightClass, Point, RowStore, select_profile};

// ── Helpers ─────────────────────────────────────────────────────────────

fn editor_named(name: &Path, lines: &[&str]) -> Editor {
    let rows = RowStore::from_lines(
        lines.iter().map(|l| l.as_bytes().to_vec()),
        select_profile(&name.to_string_lossy()),
    );
    let mut ed = Editor::new(
        BufferManager::new(Buffer::new(name, rows)),
        EditorConfig::default(),
    );
    ed.set_screen_size(12, 60);
    ed
}

fn editor(lines: &[&str]) -> Editor {
    editor_named(Path::new("scratch.txt"), lines)
}

fn type_str(ed: &mut Editor, input: &str) -> Control {
    let mut last = Control::Continue;
    for c in input.chars() {
        last = ed.handle_key(KeyEvent::char(c));
    }
    last
}

fn press(ed: &mut Editor, code: KeyCode) -> Control {
    ed.handle_key(KeyEvent::new(code))
}

fn text(ed: &Editor) -> String {
    String::from_utf8_lossy(&ed.buffer().rows().rows_to_text()).into_owned()
}

fn goto(ed: &mut Editor, x: usize, y: usize) {
    ed.buffer_mut().set_cursor(Point::new(x, y));
}

fn command(ed: &mut Editor, line: &str) -> Control {
    type_str(ed, ":");
    type_str(ed, line);
    press(ed, KeyCode::Enter)
}

// ═════════════════════════════════════════════════════════════════════════
// Bracket and quote objects
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn delete_paren_around_cursor() {
    let mut ed = editor(&["a(b(c)d)e"]);
    goto(&mut ed, 4, 0);
    type_str(&mut ed, "d(");
    assert_eq!(text(&ed), "a(bd)e\n");
    assert_eq!(ed.buffer().cursor(), Point::new(3, 0));
    assert_eq!(ed.mode(), Mode::Normal);
}

#[test]
fn delete_inner_paren_keeps_delimiters() {
    let mut ed = editor(&["a(b(c)d)e"]);
    goto(&mut ed, 6, 0);
    type_str(&mut ed, "di)");
    assert_eq!(text(&ed), "a()e\n");
    assert_eq!(ed.buffer().cursor(), Point::new(2, 0));
}

#[test]
fn empty_inner_object_is_reported() {
    let mut ed = editor(&["f()"]);
    goto(&mut ed, 1, 0);
    type_str(&mut ed, "di(");
    assert_eq!(text(&ed), "f()\n");
    assert_eq!(ed.status_message(), Some("No text object found"));
    assert!(!ed.buffer().is_dirty());
}

#[test]
fn unbalanced_pair_is_reported() {
    let mut ed = editor(&["a(b", "c"]);
    goto(&mut ed, 2, 0);
    type_str(&mut ed, "d(");
    assert_eq!(text(&ed), "a(b\nc\n");
    assert_eq!(ed.status_message(), Some("No text object found"));
}

#[test]
fn delete_quoted_string() {
    let mut ed = editor(&[r#"say "hi there" now"#]);
    goto(&mut ed, 6, 0);
    type_str(&mut ed, "di\"");
    assert_eq!(text(&ed), "say \"\" now\n");
    goto(&mut ed, 4, 0);
    type_str(&mut ed, "d\"");
    assert_eq!(text(&ed), "say  now\n");
}

#[test]
fn delete_quote_from_its_closing_mark() {
    let mut ed = editor(&[r#""a" x "b""#]);
    goto(&mut ed, 2, 0);
    type_str(&mut ed, "d\"");
    assert_eq!(text(&ed), " x \"b\"\n");
    assert_eq!(ed.buffer().cursor(), Point::new(0, 0));

    let mut ed = editor(&[r#"say "hi" now"#]);
    goto(&mut ed, 7, 0);
    type_str(&mut ed, "d\"");
    assert_eq!(text(&ed), "say  now\n");
}

#[test]
fn percent_jumps_between_partners() {
    let mut ed = editor(&["a(b(c)d)e"]);
    goto(&mut ed, 1, 0);
    type_str(&mut ed, "%");
    assert_eq!(ed.buffer().cursor(), Point::new(7, 0));
    type_str(&mut ed, "%");
    assert_eq!(ed.buffer().cursor(), Point::new(1, 0));
}

#[test]
fn bracket_motions_land_on_delimiters() {
    let mut ed = editor(&["a(b(c)d)e"]);
    goto(&mut ed, 4, 0);
    type_str(&mut ed, ")");
    assert_eq!(ed.buffer().cursor(), Point::new(5, 0));
    type_str(&mut ed, "(");
    assert_eq!(ed.buffer().cursor(), Point::new(3, 0));
}

#[test]
fn brace_object_spans_rows() {
    let mut ed = editor(&["fn x() {", "  body", "}", "after"]);
    goto(&mut ed, 3, 1);
    type_str(&mut ed, "d}");
    assert_eq!(text(&ed), "fn x() \nafter\n");
    assert_eq!(ed.buffer().cursor(), Point::new(7, 0));
}

// ═════════════════════════════════════════════════════════════════════════
// Word objects
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn word_motions() {
    let mut ed = editor(&["foo  bar baz"]);
    type_str(&mut ed, "w");
    assert_eq!(ed.buffer().cursor(), Point::new(3, 0));
    type_str(&mut ed, "w");
    assert_eq!(ed.buffer().cursor(), Point::new(8, 0));
    type_str(&mut ed, "b");
    assert_eq!(ed.buffer().cursor(), Point::new(5, 0));
}

#[test]
fn delete_forward_word() {
    let mut ed = editor(&["foo  bar baz"]);
    goto(&mut ed, 5, 0);
    type_str(&mut ed, "dw");
    assert_eq!(text(&ed), "foo   baz\n");
    assert_eq!(ed.buffer().cursor(), Point::new(5, 0));
}

#[test]
fn delete_backward_word() {
    let mut ed = editor(&["foo  bar baz"]);
    goto(&mut ed, 9, 0);
    type_str(&mut ed, "db");
    assert_eq!(text(&ed), "foo  baz\n");
    assert_eq!(ed.buffer().cursor(), Point::new(5, 0));
}

#[test]
fn delete_inner_word() {
    let mut ed = editor(&["foo  bar baz"]);
    goto(&mut ed, 6, 0);
    type_str(&mut ed, "diw");
    assert_eq!(text(&ed), "foo   baz\n");
}

#[test]
fn word_motion_off_end_changes_nothing() {
    let mut ed = editor(&["foo   "]);
    goto(&mut ed, 3, 0);
    type_str(&mut ed, "w");
    assert_eq!(ed.buffer().cursor(), Point::new(3, 0));
    assert_eq!(ed.status_message(), Some("No text object found"));
}

#[test]
fn i_alone_enters_insert() {
    let mut ed = editor(&["foo"]);
    type_str(&mut ed, "iw");
    assert_eq!(ed.mode(), Mode::Insert);
    assert_eq!(text(&ed), "wfoo\n");
}

// ═════════════════════════════════════════════════════════════════════════
// Visual mode
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn visual_char_delete_across_rows() {
    let mut ed = editor(&["abcdef", "gh"]);
    goto(&mut ed, 4, 0);
    type_str(&mut ed, "vj");
    assert_eq!(ed.buffer().cursor(), Point::new(2, 1));
    type_str(&mut ed, "d");
    assert_eq!(text(&ed), "abcd\n");
    assert_eq!(ed.buffer().cursor(), Point::new(4, 0));
    assert_eq!(ed.mode(), Mode::Normal);
    assert_eq!(ed.buffer().anchor(), None);
}

#[test]
fn visual_char_delete_backwards_selection() {
    let mut ed = editor(&["abcdef"]);
    goto(&mut ed, 4, 0);
    type_str(&mut ed, "vhhd");
    assert_eq!(text(&ed), "abf\n");
    assert_eq!(ed.buffer().cursor(), Point::new(2, 0));
}

#[test]
fn visual_line_delete() {
    let mut ed = editor(&["1", "2", "3", "4"]);
    goto(&mut ed, 0, 2);
    type_str(&mut ed, "Vkd");
    assert_eq!(text(&ed), "1\n4\n");
    assert_eq!(ed.buffer().cursor(), Point::new(0, 1));
}

#[test]
fn visual_escape_cancels() {
    let mut ed = editor(&["abc"]);
    type_str(&mut ed, "vl");
    press(&mut ed, KeyCode::Escape);
    assert_eq!(ed.mode(), Mode::Normal);
    assert_eq!(ed.buffer().anchor(), None);
    type_str(&mut ed, "d");
    assert_eq!(text(&ed), "abc\n");
}

#[test]
fn visual_i_enters_insert() {
    let mut ed = editor(&["abc"]);
    type_str(&mut ed, "vi");
    assert_eq!(ed.mode(), Mode::Insert);
    assert_eq!(ed.buffer().anchor(), None);
}

// ═════════════════════════════════════════════════════════════════════════
// Insert mode
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn insert_newline_and_backspace() {
    let mut ed = editor(&["helloworld"]);
    goto(&mut ed, 5, 0);
    type_str(&mut ed, "i");
    press(&mut ed, KeyCode::Enter);
    assert_eq!(text(&ed), "hello\nworld\n");
    press(&mut ed, KeyCode::Backspace);
    assert_eq!(text(&ed), "helloworld\n");
    assert_eq!(ed.buffer().cursor(), Point::new(5, 0));
}

#[test]
fn open_row_and_append() {
    let mut ed = editor(&["one", "three"]);
    type_str(&mut ed, "otwo");
    press(&mut ed, KeyCode::Escape);
    goto(&mut ed, 0, 0);
    type_str(&mut ed, "A!");
    assert_eq!(text(&ed), "one!\ntwo\nthree\n");
}

#[test]
fn tab_inserts_literal_tab() {
    let mut ed = editor(&["x"]);
    type_str(&mut ed, "i");
    press(&mut ed, KeyCode::Tab);
    assert_eq!(text(&ed), "\tx\n");
    let row = ed.buffer().rows().row(0).expect("row");
    assert_eq!(row.rendered(), b"        x");
}

#[test]
fn x_deletes_under_cursor() {
    let mut ed = editor(&["abc"]);
    type_str(&mut ed, "lx");
    assert_eq!(text(&ed), "ac\n");
}

// ═════════════════════════════════════════════════════════════════════════
// Incremental search
// ═════════════════════════════════════════════════════════════════════════

fn has_match_overlay(ed: &Editor) -> bool {
    ed.buffer()
        .rows()
        .rows()
        .any(|r| r.highlight().contains(&HighlightClass::Match))
}

#[test]
fn search_starts_at_cursor_row_and_wraps() {
    let mut ed = editor(&["foo bar", "baz", "bar end"]);
    goto(&mut ed, 0, 1);
    type_str(&mut ed, "/bar");
    assert_eq!(ed.buffer().cursor(), Point::new(0, 2));
    assert_eq!(
        &ed.buffer().rows().row(2).expect("row").highlight()[..3],
        &[HighlightClass::Match; 3]
    );

    press(&mut ed, KeyCode::Right);
    assert_eq!(ed.buffer().cursor(), Point::new(4, 0));
    // The previous match row got its classes back.
    assert!(!ed.buffer().rows().row(2).expect("row").highlight().contains(&HighlightClass::Match));

    press(&mut ed, KeyCode::Left);
    assert_eq!(ed.buffer().cursor(), Point::new(0, 2));
}

#[test]
fn search_escape_restores_cursor_viewport_and_highlight() {
    let lines: Vec<String> = (0..40).map(|i| format!("line {i}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let mut ed = editor_named(Path::new("x.c"), &refs);
    goto(&mut ed, 2, 3);
    let before: Vec<Vec<HighlightClass>> = ed
        .buffer()
        .rows()
        .rows()
        .map(|r| r.highlight().to_vec())
        .collect();
    let viewport = ed.buffer().viewport();

    type_str(&mut ed, "/line 30");
    assert_eq!(ed.buffer().cursor(), Point::new(0, 30));
    assert_eq!(ed.buffer().viewport().row_offset, 30);

    press(&mut ed, KeyCode::Escape);
    assert_eq!(ed.buffer().cursor(), Point::new(2, 3));
    assert_eq!(ed.buffer().viewport(), viewport);
    let after: Vec<Vec<HighlightClass>> = ed
        .buffer()
        .rows()
        .rows()
        .map(|r| r.highlight().to_vec())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn search_enter_keeps_position() {
    let mut ed = editor(&["alpha", "beta", "gamma"]);
    type_str(&mut ed, "/gam");
    press(&mut ed, KeyCode::Enter);
    assert_eq!(ed.buffer().cursor(), Point::new(0, 2));
    assert!(!has_match_overlay(&ed));
    // Back in Normal: `k` is a motion again, not query text.
    type_str(&mut ed, "k");
    assert_eq!(ed.buffer().cursor(), Point::new(0, 1));
}

#[test]
fn search_backspace_restarts_from_origin() {
    let mut ed = editor(&["ab", "ac"]);
    type_str(&mut ed, "/ac");
    assert_eq!(ed.buffer().cursor(), Point::new(0, 1));
    press(&mut ed, KeyCode::Backspace);
    assert_eq!(ed.buffer().cursor(), Point::new(0, 0));
}

#[test]
fn search_maps_rendered_column_to_raw() {
    let mut ed = editor(&["\tneedle"]);
    type_str(&mut ed, "/needle");
    assert_eq!(ed.buffer().cursor(), Point::new(1, 0));
}

// ═════════════════════════════════════════════════════════════════════════
// Colon commands, save, quit
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn unknown_command_is_reported() {
    let mut ed = editor(&["a"]);
    assert_eq!(command(&mut ed, "x"), Control::Continue);
    assert_eq!(ed.status_message(), Some("function 'x' not found"));
}

#[test]
fn write_saves_and_cleans() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.txt");
    let mut ed = editor_named(&path, &["hello"]);
    type_str(&mut ed, "A!");
    press(&mut ed, KeyCode::Escape);
    assert!(ed.buffer().is_dirty());

    assert_eq!(command(&mut ed, "w"), Control::Continue);
    assert_eq!(fs::read(&path).expect("read"), b"hello!\n");
    assert_eq!(ed.status_message(), Some("7 bytes written on disk"));
    assert!(!ed.buffer().is_dirty());
}

#[test]
fn ctrl_s_saves() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ctrl.txt");
    let mut ed = editor_named(&path, &["x"]);
    ed.handle_key(KeyEvent::ctrl_char('s'));
    assert_eq!(fs::read(&path).expect("read"), b"x\n");
}

#[test]
fn write_quit_on_unwritable_path_stays_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("f.txt");
    let mut ed = editor_named(&path, &["a"]);
    type_str(&mut ed, "x");
    assert!(ed.buffer().is_dirty());

    assert_eq!(command(&mut ed, "wq"), Control::Continue);
    assert!(ed.buffer().is_dirty());
    let msg = ed.status_message().expect("message");
    assert!(msg.starts_with("Can't save! I/O error: "), "{msg}");
}

#[test]
fn write_quit_on_success_quits() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("wq.txt");
    let mut ed = editor_named(&path, &["a"]);
    type_str(&mut ed, "x");
    assert_eq!(command(&mut ed, "wq"), Control::Quit);
    assert_eq!(fs::read(&path).expect("read"), b"\n");
}

#[test]
fn quit_clean_buffer_is_immediate() {
    let mut ed = editor(&["a"]);
    assert_eq!(type_str(&mut ed, "q"), Control::Quit);
}

#[test]
fn quit_dirty_buffer_asks_first() {
    let mut ed = editor(&["a"]);
    type_str(&mut ed, "x");
    assert_eq!(type_str(&mut ed, "q"), Control::Continue);
    assert_eq!(
        ed.status_message(),
        Some("WARNING!!! File has unsaved changes. Do you want to continue? (y/n)")
    );
    assert_eq!(type_str(&mut ed, "n"), Control::Continue);
    assert_eq!(ed.status_message(), Some("Quit cancelled"));

    assert_eq!(command(&mut ed, "q"), Control::Continue);
    assert_eq!(type_str(&mut ed, "Y"), Control::Quit);
}

#[test]
fn force_quit_skips_prompt() {
    let mut ed = editor(&["a"]);
    type_str(&mut ed, "x");
    assert_eq!(command(&mut ed, "q!"), Control::Quit);
}

#[test]
fn quit_prompt_can_be_disabled() {
    let rows = RowStore::from_lines([b"a".to_vec()], None);
    let config = EditorConfig {
        quit_confirm: false,
        ..EditorConfig::default()
    };
    let mut ed = Editor::new(BufferManager::new(Buffer::new("a.txt", rows)), config);
    type_str(&mut ed, "x");
    assert_eq!(type_str(&mut ed, "q"), Control::Quit);
}

#[test]
fn edit_and_cycle_buffers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let other = dir.path().join("other.rs");
    fs::write(&other, "fn main() {}\n").expect("write");
    let mut ed = editor(&["first"]);

    command(&mut ed, &format!("e {}", other.display()));
    assert_eq!(ed.buffers().len(), 2);
    assert_eq!(text(&ed), "fn main() {}\n");
    assert_eq!(ed.buffer().rows().syntax().map(|s| s.name), Some("rust"));

    command(&mut ed, "bn");
    assert_eq!(text(&ed), "first\n");
    command(&mut ed, "bp");
    assert_eq!(text(&ed), "fn main() {}\n");

    // Reopening an open file switches instead of loading a copy.
    command(&mut ed, "bn");
    command(&mut ed, &format!("e {}", other.display()));
    assert_eq!(ed.buffers().len(), 2);
    assert_eq!(text(&ed), "fn main() {}\n");
}

#[test]
fn tab_completion_stops_at_branch() {
    let mut ed = editor(&["a"]);
    type_str(&mut ed, ":b");
    // "b" branches into "bn" and "bp", so nothing is appended.
    press(&mut ed, KeyCode::Tab);
    press(&mut ed, KeyCode::Enter);
    assert_eq!(ed.status_message(), Some("function 'b' not found"));
}
