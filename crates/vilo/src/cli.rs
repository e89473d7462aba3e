#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Arguments are parsed by hand; the surface is one filename and two flags.
//! Logging and editor behaviour are tuned through `VILO_*` environment
//! variables instead of flags.

use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "Usage: vilo <filename>";

const HELP_TEXT: &str = "\
vilo - a small modal text editor

USAGE:
    vilo <filename>

OPTIONS:
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS (NORMAL):
    h j k l / arrows     Move the cursor
    i  A  o  O           Enter INSERT mode
    v  V                 Character / line VISUAL mode
    w b ( ) [ ] { } \" ' % Jump by text object
    d<obj>  di<obj>      Delete a text object or its inside
    x                    Delete the character under the cursor
    f<c>                 Find <c> on this line and insert there
    /                    Incremental search
    :                    Command prompt (:w :q :q! :wq :e <file> :bn :bp)
    Ctrl-S               Save
    q                    Quit

ENVIRONMENT VARIABLES:
    VILO_STATUS_TIMEOUT_MS    How long status messages stay visible
    VILO_NO_QUIT_CONFIRM      Set to 1 to quit without the unsaved-changes prompt
    VILO_LOG                  Enable logging with this filter (e.g. debug)
    VILO_LOG_FILE             Log destination (default: vilo.log)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// The file to edit. It need not exist yet.
    pub filename: PathBuf,
}

/// What the arguments asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
    /// Bad arguments; the payload is the complaint.
    Usage(String),
}

/// Parse arguments, not including the program name.
pub fn parse_args<I, S>(args: I) -> Parsed
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut filename: Option<String> = None;
    for arg in args {
        let arg = arg.into();
        match arg.as_str() {
            "--help" | "-h" => return Parsed::Help,
            "--version" | "-V" => return Parsed::Version,
            other if other.starts_with('-') && other.len() > 1 => {
                return Parsed::Usage(format!("Unknown argument: {other}"));
            }
            _ => {
                if filename.is_some() {
                    return Parsed::Usage(format!("Unexpected argument: {arg}"));
                }
                filename = Some(arg);
            }
        }
    }
    match filename {
        Some(name) => Parsed::Run(Opts {
            filename: PathBuf::from(name),
        }),
        None => Parsed::Usage("Missing filename".into()),
    }
}

impl Opts {
    /// Parse the process arguments, exiting on `--help`, `--version`, or a
    /// usage error.
    pub fn parse() -> Self {
        match parse_args(std::env::args().skip(1)) {
            Parsed::Run(opts) => opts,
            Parsed::Help => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Parsed::Version => {
                println!("vilo {VERSION}");
                process::exit(0);
            }
            Parsed::Usage(complaint) => {
                eprintln!("{complaint}");
                eprintln!("{USAGE}");
                process::exit(1);
            }
        }
    }
}
