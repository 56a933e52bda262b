//! The four stage bodies, independent of how they are scheduled.
//!
//! The reader and the framer talk to the outside world; the two middle
//! stages are pure line-to-line transformations behind `LineStage`. The
//! threaded pipeline and the serial executor both drive these same types.

use std::io::{BufRead, Write};

use crate::error::{PipelineError, Result};
use crate::record::Frame;

/// One line of text moving between stages. Byte-oriented, like the records
/// it ends up in.
pub type TextUnit = Vec<u8>;

/// Longest line the pair collapser will produce; the rest is dropped.
pub const MAX_LINE_LENGTH: usize = 1000;

/// Input line that ends the run (terminator included).
pub const STOP_LINE: &[u8] = b"STOP\n";

const MARKER: u8 = b'+';
const REPLACEMENT: u8 = b'^';

/// A stage that turns each input line into exactly one output line.
pub trait LineStage {
    /// Transform a single line, taking ownership of it.
    fn process(&mut self, line: TextUnit) -> TextUnit;

    /// The display name of this stage.
    fn name(&self) -> &'static str;
}

/// How the input ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEnd {
    /// A `STOP` line was read.
    Stop,
    /// The source ran dry without a `STOP` line.
    EndOfInput,
}

/// Result of one read from the input source.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(TextUnit),
    Finished(InputEnd),
}

/// Pulls terminator-inclusive lines from a buffered source.
pub struct LineReader<R> {
    input: R,
    lines_read: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            lines_read: 0,
        }
    }

    /// Read the next line. Once this returns `Finished` the reader must not
    /// be polled again.
    pub fn next_line(&mut self) -> Result<ReadOutcome> {
        let mut line = TextUnit::new();
        let n = self
            .input
            .read_until(b'\n', &mut line)
            .map_err(|e| PipelineError::io(self.name(), e))?;

        if n == 0 {
            return Ok(ReadOutcome::Finished(InputEnd::EndOfInput));
        }
        if line == STOP_LINE {
            return Ok(ReadOutcome::Finished(InputEnd::Stop));
        }
        self.lines_read += 1;
        Ok(ReadOutcome::Line(line))
    }

    /// Lines forwarded so far (the `STOP` line is not counted).
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn name(&self) -> &'static str {
        "reader"
    }
}

/// Replaces a trailing line terminator with a single space.
pub struct SeparatorStage;

impl LineStage for SeparatorStage {
    fn process(&mut self, mut line: TextUnit) -> TextUnit {
        if let Some(last) = line.last_mut()
            && *last == b'\n'
        {
            *last = b' ';
        }
        line
    }

    fn name(&self) -> &'static str {
        "separator"
    }
}

/// Collapses each adjacent `++` into `^`.
pub struct PlusCollapseStage;

impl LineStage for PlusCollapseStage {
    fn process(&mut self, line: TextUnit) -> TextUnit {
        collapse_pairs(&line)
    }

    fn name(&self) -> &'static str {
        "collapser"
    }
}

/// Rewrite non-overlapping `++` pairs, scanning left to right.
///
/// A `+` with no `+` right after it is copied as-is, so `+++` becomes `^+`.
/// Output stops at `MAX_LINE_LENGTH` bytes.
pub fn collapse_pairs(line: &[u8]) -> TextUnit {
    let mut out = Vec::with_capacity(line.len().min(MAX_LINE_LENGTH));
    let mut i = 0;
    while i < line.len() && out.len() < MAX_LINE_LENGTH {
        if line[i] == MARKER && line.get(i + 1) == Some(&MARKER) {
            out.push(REPLACEMENT);
            i += 2;
        } else {
            out.push(line[i]);
            i += 1;
        }
    }
    out
}

/// Packs lines into fixed-width records and writes each one as it fills.
pub struct FrameStage<W> {
    frame: Frame,
    out: W,
    records_written: usize,
}

impl<W: Write> FrameStage<W> {
    pub fn new(out: W) -> Self {
        Self {
            frame: Frame::new(),
            out,
            records_written: 0,
        }
    }

    /// Feed one line through the frame, writing every record it completes.
    pub fn process(&mut self, line: TextUnit) -> Result<()> {
        let before = self.records_written;
        for byte in line {
            if let Some(record) = self.frame.push(byte)? {
                record
                    .write_line(&mut self.out)
                    .map_err(|e| PipelineError::io(self.name(), e))?;
                self.records_written += 1;
            }
        }
        if self.records_written > before {
            self.out
                .flush()
                .map_err(|e| PipelineError::io(self.name(), e))?;
        }
        Ok(())
    }

    /// Close out the stream: the partial frame is dropped, never written.
    /// Returns `(records_written, bytes_discarded)`.
    pub fn finish(mut self) -> Result<(usize, usize)> {
        self.out
            .flush()
            .map_err(|e| PipelineError::io(self.name(), e))?;
        let discarded = self.frame.discard();
        Ok((self.records_written, discarded))
    }

    pub fn name(&self) -> &'static str {
        "writer"
    }
}
