//! Serial (line-at-a-time) executor.
//!
//! Pushes each input line through the whole stage chain on the calling
//! thread before reading the next one. There are no queues and no threads,
//! which makes it the reference the threaded pipeline is checked against.

use std::io::{BufRead, Cursor, Write};

use tracing::debug;

use crate::error::Result;
use crate::pipeline::PipelineReport;
use crate::stage::{
    FrameStage, LineReader, LineStage, PlusCollapseStage, ReadOutcome, SeparatorStage, TextUnit,
};

/// The two transformation stages, in pipeline order.
fn transform_stages() -> Vec<Box<dyn LineStage>> {
    vec![Box::new(SeparatorStage), Box::new(PlusCollapseStage)]
}

/// Push one line through a slice of stages in sequence.
fn push_through_stages(line: TextUnit, stages: &mut [Box<dyn LineStage>]) -> TextUnit {
    stages
        .iter_mut()
        .fold(line, |current, stage| stage.process(current))
}

/// Run every stage in order on the calling thread.
pub fn execute_serial<R: BufRead, W: Write>(input: R, output: W) -> Result<PipelineReport> {
    let mut reader = LineReader::new(input);
    let mut stages = transform_stages();
    let mut writer = FrameStage::new(output);

    let input_end = loop {
        match reader.next_line()? {
            ReadOutcome::Line(line) => writer.process(push_through_stages(line, &mut stages))?,
            ReadOutcome::Finished(end) => break end,
        }
    };
    let (records_written, bytes_discarded) = writer.finish()?;

    debug!(
        lines = reader.lines_read(),
        records = records_written,
        "serial run finished"
    );
    Ok(PipelineReport {
        lines_read: reader.lines_read(),
        input_end,
        records_written,
        bytes_discarded,
    })
}

/// Serial counterpart of [`crate::execute_pipeline`].
///
/// The output is decoded lossily, the same way: a multi-byte character cut
/// at a record boundary comes back as U+FFFD.
pub fn execute_serial_text(input_text: &str) -> Result<(String, PipelineReport)> {
    let mut output = Vec::new();
    let report = execute_serial(Cursor::new(input_text.as_bytes()), &mut output)?;
    Ok((String::from_utf8_lossy(&output).into_owned(), report))
}
