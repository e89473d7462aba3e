#![forbid(unsafe_code)]

//! Per-row syntax classification.
//!
//! The highlighter is a single left-to-right pass over a row's rendered
//! bytes. The only state carried between rows is whether a multi-line
//! comment is still open at the end of the previous row; the caller passes
//! it in and receives the new value back. Cascading that state down the
//! buffer is the row store's job.

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Highlight classes
// ---------------------------------------------------------------------------

/// Display category of one rendered byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HighlightClass {
    #[default]
    Normal,
    /// A control byte shown as a placeholder.
    NonPrint,
    /// Single-line comment, through end of row.
    Comment,
    /// Inside a multi-line comment, delimiters included.
    MlComment,
    /// First keyword class (statements, storage).
    Keyword1,
    /// Second keyword class (types); `|`-suffixed entries in a profile.
    Keyword2,
    String,
    Number,
    /// Transient search-match overlay.
    Match,
}

impl HighlightClass {
    /// Whether this class belongs to either comment kind.
    #[must_use]
    pub fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::MlComment)
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

bitflags! {
    /// Optional highlighting passes enabled by a profile.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SyntaxFlags: u8 {
        const STRINGS = 0b01;
        const NUMBERS = 0b10;
    }
}

/// Static description of one file type.
#[derive(Debug)]
pub struct SyntaxProfile {
    /// Display name.
    pub name: &'static str,
    /// Filename patterns. A pattern starting with `.` must match the end of
    /// the filename; any other pattern matches anywhere in it.
    pub filematch: &'static [&'static str],
    /// Keywords. An entry ending in `|` belongs to the second class.
    pub keywords: &'static [&'static str],
    pub line_comment: &'static str,
    pub block_comment_start: &'static str,
    pub block_comment_end: &'static str,
    pub flags: SyntaxFlags,
}

impl SyntaxProfile {
    /// Whether `filename` selects this profile.
    #[must_use]
    pub fn matches(&self, filename: &str) -> bool {
        self.filematch.iter().any(|pattern| {
            if pattern.starts_with('.') {
                filename.ends_with(pattern)
            } else {
                filename.contains(pattern)
            }
        })
    }

    fn keyword_at(&self, rest: &[u8]) -> Option<(usize, HighlightClass)> {
        self.keywords.iter().find_map(|entry| {
            let (word, class) = match entry.strip_suffix('|') {
                Some(word) => (word, HighlightClass::Keyword2),
                None => (*entry, HighlightClass::Keyword1),
            };
            let word = word.as_bytes();
            let bounded = rest.get(word.len()).is_none_or(|&b| is_separator(b));
            (rest.starts_with(word) && bounded).then_some((word.len(), class))
        })
    }
}

const C_KEYWORDS: &[&str] = &[
    // C
    "auto", "break", "case", "continue", "default", "do", "else", "enum", "extern", "for",
    "goto", "if", "register", "return", "sizeof", "static", "struct", "switch", "typedef",
    "union", "volatile", "while", "NULL",
    // C++
    "alignas", "alignof", "and", "and_eq", "asm", "bitand", "bitor", "class", "compl",
    "constexpr", "const_cast", "decltype", "delete", "dynamic_cast", "explicit", "export",
    "false", "friend", "inline", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public",
    "reinterpret_cast", "static_assert", "static_cast", "template", "this", "thread_local",
    "throw", "true", "try", "typeid", "typename", "virtual", "xor", "xor_eq",
    // Types
    "int|", "long|", "double|", "float|", "char|", "unsigned|", "signed|", "void|", "short|",
    "const|", "bool|",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
    // Types
    "bool|", "char|", "str|", "u8|", "u16|", "u32|", "u64|", "u128|", "usize|", "i8|", "i16|",
    "i32|", "i64|", "i128|", "isize|", "f32|", "f64|", "String|", "Vec|", "Option|", "Result|",
    "Box|",
];

/// Built-in profiles, searched in order.
pub static PROFILES: &[SyntaxProfile] = &[
    SyntaxProfile {
        name: "c",
        filematch: &[".c", ".h", ".cpp", ".hpp", ".cc"],
        keywords: C_KEYWORDS,
        line_comment: "//",
        block_comment_start: "/*",
        block_comment_end: "*/",
        flags: SyntaxFlags::STRINGS.union(SyntaxFlags::NUMBERS),
    },
    SyntaxProfile {
        name: "rust",
        filematch: &[".rs"],
        keywords: RUST_KEYWORDS,
        line_comment: "//",
        block_comment_start: "/*",
        block_comment_end: "*/",
        flags: SyntaxFlags::STRINGS.union(SyntaxFlags::NUMBERS),
    },
];

/// Pick the first profile whose patterns match `filename`.
#[must_use]
pub fn select_profile(filename: &str) -> Option<&'static SyntaxProfile> {
    PROFILES.iter().find(|profile| profile.matches(filename))
}

/// Word separators for keyword and number boundaries.
#[must_use]
pub fn is_separator(byte: u8) -> bool {
    byte == 0 || byte.is_ascii_whitespace() || b",.()+-/*=~%[];".contains(&byte)
}

// ---------------------------------------------------------------------------
// Highlighting
// ---------------------------------------------------------------------------

/// Classify one rendered row.
///
/// `base` carries the render pass's classification (`Normal` or `NonPrint`)
/// and must be as long as `rendered`. `in_comment` is the previous row's
/// open-comment state. Returns the classes and this row's open-comment state.
#[must_use]
pub fn highlight_line(
    rendered: &[u8],
    base: &[HighlightClass],
    profile: Option<&SyntaxProfile>,
    mut in_comment: bool,
) -> (Vec<HighlightClass>, bool) {
    debug_assert_eq!(rendered.len(), base.len());
    let mut hl = base.to_vec();
    let Some(profile) = profile else {
        return (hl, false);
    };

    let line_comment = profile.line_comment.as_bytes();
    let block_start = profile.block_comment_start.as_bytes();
    let block_end = profile.block_comment_end.as_bytes();

    let mut i = 0;
    let mut prev_sep = true;
    let mut in_string: Option<u8> = None;

    while i < rendered.len() {
        let byte = rendered[i];
        let rest = &rendered[i..];

        if base[i] == HighlightClass::NonPrint {
            prev_sep = false;
            i += 1;
            continue;
        }

        if in_comment {
            if !block_end.is_empty() && rest.starts_with(block_end) {
                paint(&mut hl, i, block_end.len(), HighlightClass::MlComment);
                i += block_end.len();
                in_comment = false;
                prev_sep = true;
            } else {
                hl[i] = HighlightClass::MlComment;
                i += 1;
            }
            continue;
        }

        if let Some(quote) = in_string {
            hl[i] = HighlightClass::String;
            if byte == b'\\' && i + 1 < rendered.len() {
                paint(&mut hl, i + 1, 1, HighlightClass::String);
                i += 2;
                continue;
            }
            if byte == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }

        if !line_comment.is_empty() && rest.starts_with(line_comment) {
            let len = rendered.len() - i;
            paint(&mut hl, i, len, HighlightClass::Comment);
            return (hl, false);
        }

        if !block_start.is_empty() && rest.starts_with(block_start) {
            paint(&mut hl, i, block_start.len(), HighlightClass::MlComment);
            i += block_start.len();
            in_comment = true;
            prev_sep = false;
            continue;
        }

        if profile.flags.contains(SyntaxFlags::STRINGS) && (byte == b'"' || byte == b'\'') {
            in_string = Some(byte);
            hl[i] = HighlightClass::String;
            prev_sep = false;
            i += 1;
            continue;
        }

        if profile.flags.contains(SyntaxFlags::NUMBERS) {
            let after_number = i > 0 && hl[i - 1] == HighlightClass::Number;
            if (byte.is_ascii_digit() && (prev_sep || after_number))
                || (byte == b'.' && after_number)
            {
                hl[i] = HighlightClass::Number;
                prev_sep = false;
                i += 1;
                continue;
            }
        }

        if prev_sep && let Some((len, class)) = profile.keyword_at(rest) {
            paint(&mut hl, i, len, class);
            i += len;
            prev_sep = false;
            continue;
        }

        prev_sep = is_separator(byte);
        i += 1;
    }

    (hl, in_comment)
}

/// Overwrite `len` classes starting at `start`, leaving non-printables alone.
fn paint(hl: &mut [HighlightClass], start: usize, len: usize, class: HighlightClass) {
    let end = (start + len).min(hl.len());
    for slot in &mut hl[start.min(end)..end] {
        if *slot != HighlightClass::NonPrint {
            *slot = class;
        }
    }
}
