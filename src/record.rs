//! Fixed-width output records and the frame that assembles them.
//!
//! Output is a stream of 80-byte records (the width of a punch card), each
//! written as one line. The `Frame` collects transformed bytes one at a
//! time and hands back a `Record` exactly when it is full.

use std::fmt;
use std::io::{self, Write};

use crate::error::{PipelineError, Result};

/// Standard record width (punch card width).
pub const RECORD_WIDTH: usize = 80;

/// One complete output line of exactly `RECORD_WIDTH` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    data: [u8; RECORD_WIDTH],
}

impl Record {
    /// Build a record from exactly `RECORD_WIDTH` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let data: [u8; RECORD_WIDTH] = bytes.try_into().ok()?;
        Some(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Write the record followed by a line terminator.
    pub fn write_line<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.data)?;
        out.write_all(b"\n")
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.data))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({:?})", String::from_utf8_lossy(&self.data))
    }
}

/// Accumulation buffer owned by the framing stage.
#[derive(Debug)]
pub struct Frame {
    buf: [u8; RECORD_WIDTH],
    len: usize,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    pub fn new() -> Self {
        Self {
            buf: [0; RECORD_WIDTH],
            len: 0,
        }
    }

    /// Append one byte. Returns the completed record when the frame fills,
    /// leaving the frame empty again.
    pub fn push(&mut self, byte: u8) -> Result<Option<Record>> {
        if self.len >= RECORD_WIDTH {
            return Err(PipelineError::FrameOverflow {
                len: self.len + 1,
                width: RECORD_WIDTH,
            });
        }

        self.buf[self.len] = byte;
        self.len += 1;

        if self.len == RECORD_WIDTH {
            self.len = 0;
            return Ok(Some(Record { data: self.buf }));
        }
        Ok(None)
    }

    /// Push every byte of `bytes`, collecting completed records in order.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for &byte in bytes {
            if let Some(record) = self.push(byte)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop a partial frame, returning how many bytes were thrown away.
    pub fn discard(&mut self) -> usize {
        std::mem::take(&mut self.len)
    }
}
