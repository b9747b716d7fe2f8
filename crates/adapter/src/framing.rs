//! Newline framing for the inbound byte stream.

use log::warn;

use crate::types::MAX_LINE_LEN;

/// Accumulates bytes and yields complete lines.
///
/// `\r` and `\n` both terminate a line and empty lines are skipped, so `\r\n`
/// endings work unchanged. A line longer than the limit is discarded up to its
/// terminator.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    buf: Vec<u8>,
    max_len: usize,
    overflowed: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_len.min(MAX_LINE_LEN)),
            max_len,
            overflowed: false,
        }
    }

    /// Bytes of the unfinished line currently held
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in bytes {
            if byte == b'\r' || byte == b'\n' {
                if self.overflowed {
                    self.overflowed = false;
                    self.buf.clear();
                    continue;
                }
                if !self.buf.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.buf).into_owned());
                    self.buf.clear();
                }
                continue;
            }

            if self.overflowed {
                continue;
            }

            if self.buf.len() < self.max_len {
                self.buf.push(byte);
            } else {
                warn!("[proto] inbound line exceeds {} bytes, dropped", self.max_len);
                self.buf.clear();
                self.overflowed = true;
            }
        }

        lines
    }
}
