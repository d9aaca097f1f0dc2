//! Line reader with a hard per-line size bound

use std::io::{self, BufRead, Read};

/// Largest single line accepted from a session file or the history log.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug)]
pub enum LineError {
    /// The line with this 1-based number exceeded the limit.
    TooLong { line: usize },
    Io(io::Error),
}

/// Reads `\n`-terminated lines without ever buffering more than `limit + 2`
/// bytes for one line. Terminators (`\n`, `\r\n`) are stripped and do not
/// count toward `limit`.
pub struct BoundedLines<R> {
    reader: R,
    limit: usize,
    line: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> BoundedLines<R> {
    pub fn new(reader: R, limit: usize) -> Self {
        Self {
            reader,
            limit,
            line: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Next line and its 1-based number. Stops after the first error.
    pub fn next_line(&mut self) -> Option<Result<(usize, &[u8]), LineError>> {
        if self.done {
            return None;
        }

        self.buf.clear();
        let read = self
            .reader
            .by_ref()
            .take(self.limit as u64 + 2)
            .read_until(b'\n', &mut self.buf);

        match read {
            Ok(0) => {
                self.done = true;
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                self.done = true;
                return Some(Err(LineError::Io(e)));
            }
        }

        self.line += 1;
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        if self.buf.len() > self.limit {
            self.done = true;
            return Some(Err(LineError::TooLong { line: self.line }));
        }

        Some(Ok((self.line, &self.buf)))
    }
}
