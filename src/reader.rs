//! Buffered line reader that feeds the interpreter in batch mode.

use std::io::{ErrorKind, Read};
use tracing::{debug, warn};

/// Reads a byte source in fixed-size chunks and hands out one line at a time.
///
/// The source is dropped (and therefore closed) the first time a read returns
/// zero bytes or fails. From then on [`LineReader::next_line`] always returns
/// `None`.
pub struct LineReader<R> {
    source: Option<R>,
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl<R: Read> LineReader<R> {
    pub fn new(source: R, chunk: usize) -> Self {
        Self {
            source: Some(source),
            buf: vec![0; chunk.max(1)].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }

    /// Whether the source has been closed.
    pub fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }

    /// Return the next line without its `\n`, or `None` when input is over.
    ///
    /// Bytes after the last newline are returned as a final line if there are
    /// any. Lines are decoded lossily.
    pub fn next_line(&mut self) -> Option<String> {
        self.source.as_ref()?;
        let mut line = Vec::new();
        loop {
            if self.pos == self.len && !self.refill() {
                return if line.is_empty() {
                    None
                } else {
                    Some(String::from_utf8_lossy(&line).into_owned())
                };
            }
            let pending = &self.buf[self.pos..self.len];
            match pending.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    line.extend_from_slice(&pending[..i]);
                    self.pos += i + 1;
                    return Some(String::from_utf8_lossy(&line).into_owned());
                }
                None => {
                    line.extend_from_slice(pending);
                    self.pos = self.len;
                }
            }
        }
    }

    fn refill(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        loop {
            match source.read(&mut self.buf) {
                Ok(0) => {
                    debug!("end of input");
                    break;
                }
                Ok(n) => {
                    self.pos = 0;
                    self.len = n;
                    return true;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("read error, treating as end of input: {e}");
                    break;
                }
            }
        }
        self.source = None;
        self.pos = 0;
        self.len = 0;
        false
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_line()
    }
}
