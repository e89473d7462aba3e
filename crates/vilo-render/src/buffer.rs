#![forbid(unsafe_code)]

//! Append-only frame buffer.
//!
//! A frame is assembled here in full and handed to the terminal in one
//! write. Partial frames never reach the terminal, so a slow link cannot
//! show a half-drawn screen.

use std::io::{self, Write};

/// Growable byte buffer for one frame.
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer with room for a typical frame of `rows` x `cols`.
    #[must_use]
    pub fn with_screen(rows: usize, cols: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(rows.saturating_mul(cols.saturating_add(16))),
        }
    }

    /// Append raw bytes.
    pub fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Write the whole frame with one `write_all`, flush, and reset.
    ///
    /// # Errors
    ///
    /// Propagates the writer's error; the buffer is kept so the caller may
    /// retry.
    pub fn flush_into<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.bytes)?;
        w.flush()?;
        self.bytes.clear();
        Ok(())
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writer that records each `write` call separately.
    #[derive(Default)]
    struct CallLog {
        calls: Vec<Vec<u8>>,
    }

    impl Write for CallLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn flush_is_one_write() {
        let mut out = OutputBuffer::new();
        out.append(b"\x1b[H");
        write!(out, "row {}", 1).unwrap();
        out.append(b"\r\n");
        let mut sink = CallLog::default();
        out.flush_into(&mut sink).unwrap();
        assert_eq!(sink.calls, vec![b"\x1b[Hrow 1\r\n".to_vec()]);
        assert!(out.is_empty());
    }

    #[test]
    fn failed_flush_keeps_frame() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("gone"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut out = OutputBuffer::new();
        out.append(b"frame");
        assert!(out.flush_into(&mut Broken).is_err());
        assert_eq!(out.as_bytes(), b"frame");
    }
}
