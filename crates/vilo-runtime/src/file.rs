#![forbid(unsafe_code)]

//! Whole-file load and save.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Read `path` as lines of raw bytes.
///
/// Lines are split on `\n` and lose one trailing `\r`. A missing file is an
/// empty buffer, not an error.
///
/// # Errors
///
/// Any I/O error other than [`io::ErrorKind::NotFound`].
pub fn load_lines(path: &Path) -> io::Result<Vec<Vec<u8>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(split_lines(&bytes))
}

fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    body.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect()
}

/// Overwrite `path` with `bytes`: truncate to the new length, then one write.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Propagates open, truncate, and write failures.
pub fn save(path: &Path, bytes: &[u8]) -> io::Result<usize> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true);
    #[cfg(unix)]
    options.mode(0o644);
    let mut file = options.open(path)?;
    file.set_len(bytes.len() as u64)?;
    file.write_all(bytes)?;
    Ok(bytes.len())
}
