//! Threaded pipeline: four stages, three bounded queues.
//!
//! ```text
//! reader -> [A] -> separator -> [B] -> collapser -> [C] -> writer -> sink
//! ```
//!
//! Every stage runs on its own thread and only touches the queues on either
//! side of it. The run ends when `Item::End` has travelled through all three
//! queues and every thread has been joined.
//!
//! If a stage fails (or panics) it aborts all three queues, so the
//! neighbours blocked in `put`/`take` wake up with `Aborted` instead of
//! waiting forever. The first non-`Aborted` error is what the caller sees.
//!
//! The reader runs on a detached thread that owns its input. A read can
//! block indefinitely (an idle terminal or pipe), so once a downstream stage
//! has failed the run returns without waiting for that read to come back.

use std::io::{BufRead, Cursor, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle, Scope, ScopedJoinHandle};

use tracing::{debug, error, info};

use crate::error::{PipelineError, Result};
use crate::queue::{BoundedQueue, Item, QUEUE_CAPACITY};
use crate::stage::{
    FrameStage, InputEnd, LineReader, LineStage, PlusCollapseStage, ReadOutcome, SeparatorStage,
    TextUnit,
};

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    /// Lines forwarded by the reader (a `STOP` line is not counted).
    pub lines_read: usize,
    /// Whether the input ended at `STOP` or at end-of-input.
    pub input_end: InputEnd,
    /// Complete records written to the sink.
    pub records_written: usize,
    /// Bytes left in the partial final frame and dropped.
    pub bytes_discarded: usize,
}

/// The three handoff queues, built once per run.
struct Queues {
    lines: BoundedQueue<TextUnit>,
    separated: BoundedQueue<TextUnit>,
    collapsed: BoundedQueue<TextUnit>,
}

impl Queues {
    fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            lines: BoundedQueue::new(capacity)?,
            separated: BoundedQueue::new(capacity)?,
            collapsed: BoundedQueue::new(capacity)?,
        })
    }

    fn abort_all(&self) {
        self.lines.abort();
        self.separated.abort();
        self.collapsed.abort();
    }

    fn all_empty(&self) -> bool {
        self.lines.is_empty() && self.separated.is_empty() && self.collapsed.is_empty()
    }
}

/// Aborts the queues if the stage holding it unwinds.
struct AbortOnUnwind<'a>(&'a Queues);

impl Drop for AbortOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort_all();
        }
    }
}

/// Run the threaded pipeline from `input` to `output`.
pub fn run_pipeline<R, W>(input: R, output: W) -> Result<PipelineReport>
where
    R: BufRead + Send + 'static,
    W: Write + Send,
{
    run_pipeline_with_capacity(input, output, QUEUE_CAPACITY)
}

/// Same as [`run_pipeline`] with a custom slot count per queue.
pub fn run_pipeline_with_capacity<R, W>(
    input: R,
    output: W,
    capacity: usize,
) -> Result<PipelineReport>
where
    R: BufRead + Send + 'static,
    W: Write + Send,
{
    let queues = Arc::new(Queues::new(capacity)?);
    let report = run_on(&queues, input, output)?;
    debug_assert!(queues.all_empty());
    Ok(report)
}

/// Run the threaded pipeline over in-memory text.
///
/// Returns the output (records joined by line terminators) and the run
/// summary. The output is decoded lossily: records are cut at byte 80, so a
/// multi-byte character straddling a record boundary comes back as U+FFFD.
/// Use [`run_pipeline`] with a byte sink to get the exact bytes.
pub fn execute_pipeline(input_text: &str) -> Result<(String, PipelineReport)> {
    let mut output = Vec::new();
    let report = run_pipeline(Cursor::new(input_text.as_bytes().to_vec()), &mut output)?;
    Ok((String::from_utf8_lossy(&output).into_owned(), report))
}

fn run_on<R, W>(queues: &Arc<Queues>, input: R, output: W) -> Result<PipelineReport>
where
    R: BufRead + Send + 'static,
    W: Write + Send,
{
    let reader = spawn_reader(Arc::clone(queues), input)?;
    let queues: &Queues = queues;

    thread::scope(|s| {
        let separator = spawn_stage(s, "separator", queues, move || {
            transform_stage(SeparatorStage, &queues.lines, &queues.separated)
        })?;
        let collapser = spawn_stage(s, "collapser", queues, move || {
            transform_stage(PlusCollapseStage, &queues.separated, &queues.collapsed)
        })?;
        let writer = spawn_stage(s, "writer", queues, move || {
            write_stage(output, &queues.collapsed)
        })?;

        let separated = join_stage("separator", separator);
        let collapsed = join_stage("collapser", collapser);
        let written = join_stage("writer", writer);

        let downstream_failed = [
            separated.as_ref().err(),
            collapsed.as_ref().err(),
            written.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .any(|e| !e.is_aborted());

        let read = if downstream_failed && !reader.is_finished() {
            // Still inside a read; it exits on its own once the read returns
            // and the aborted queue refuses the line.
            debug!(stage = "reader", "left blocked on input");
            Err(PipelineError::Aborted)
        } else {
            join_reader(reader)
        };

        let ((lines_read, input_end), (records_written, bytes_discarded)) =
            match (read, separated, collapsed, written) {
                (Ok(read), Ok(_), Ok(_), Ok(written)) => (read, written),
                (read, separated, collapsed, written) => {
                    let errors = [read.err(), separated.err(), collapsed.err(), written.err()];
                    let root = root_cause(errors.into_iter().flatten())
                        .unwrap_or(PipelineError::Aborted);
                    error!(error = %root, "pipeline failed");
                    return Err(root);
                }
            };

        let report = PipelineReport {
            lines_read,
            input_end,
            records_written,
            bytes_discarded,
        };
        info!(
            lines = report.lines_read,
            records = report.records_written,
            discarded = report.bytes_discarded,
            "pipeline drained"
        );
        Ok(report)
    })
}

/// Pick the error that started a failure cascade: the first one that is
/// not a sibling's `Aborted`.
fn root_cause(errors: impl IntoIterator<Item = PipelineError>) -> Option<PipelineError> {
    errors
        .into_iter()
        .reduce(|root, e| if root.is_aborted() && !e.is_aborted() { e } else { root })
}

/// Common wrapper for every stage body: lifecycle logs, and abort the
/// queues on failure or unwind.
fn run_stage<T>(
    name: &'static str,
    queues: &Queues,
    body: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let _guard = AbortOnUnwind(queues);
    debug!(stage = name, "stage started");
    let result = body();
    match &result {
        Ok(_) => debug!(stage = name, "stage exited"),
        Err(e) if e.is_aborted() => debug!(stage = name, "stage aborted"),
        Err(e) => {
            error!(stage = name, error = %e, "stage failed");
            queues.abort_all();
        }
    }
    result
}

fn spawn_reader<R>(queues: Arc<Queues>, input: R) -> Result<JoinHandle<Result<(usize, InputEnd)>>>
where
    R: BufRead + Send + 'static,
{
    let owned = Arc::clone(&queues);
    thread::Builder::new()
        .name("reader".to_string())
        .spawn(move || run_stage("reader", &owned, || read_stage(input, &owned.lines)))
        .map_err(|source| {
            queues.abort_all();
            PipelineError::Spawn {
                stage: "reader",
                source,
            }
        })
}

fn spawn_stage<'scope, T, F>(
    scope: &'scope Scope<'scope, '_>,
    name: &'static str,
    queues: &'scope Queues,
    body: F,
) -> Result<ScopedJoinHandle<'scope, Result<T>>>
where
    F: FnOnce() -> Result<T> + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn_scoped(scope, move || run_stage(name, queues, body))
        .map_err(|source| {
            queues.abort_all();
            PipelineError::Spawn {
                stage: name,
                source,
            }
        })
}

fn join_stage<T>(name: &'static str, handle: ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .map_err(|_| PipelineError::StagePanicked(name))?
}

fn join_reader(handle: JoinHandle<Result<(usize, InputEnd)>>) -> Result<(usize, InputEnd)> {
    handle
        .join()
        .map_err(|_| PipelineError::StagePanicked("reader"))?
}

fn read_stage<R: BufRead>(input: R, out: &BoundedQueue<TextUnit>) -> Result<(usize, InputEnd)> {
    let mut reader = LineReader::new(input);
    let end = loop {
        match reader.next_line()? {
            ReadOutcome::Line(line) => out.put(Item::Data(line))?,
            ReadOutcome::Finished(end) => break end,
        }
    };
    out.put(Item::End)?;
    debug!(lines = reader.lines_read(), ?end, "input finished");
    Ok((reader.lines_read(), end))
}

fn transform_stage<S: LineStage>(
    mut stage: S,
    input: &BoundedQueue<TextUnit>,
    output: &BoundedQueue<TextUnit>,
) -> Result<usize> {
    let mut processed = 0;
    while let Item::Data(line) = input.take()? {
        output.put(Item::Data(stage.process(line)))?;
        processed += 1;
    }
    output.put(Item::End)?;
    debug!(stage = stage.name(), lines = processed, "end of stream forwarded");
    Ok(processed)
}

fn write_stage<W: Write>(output: W, input: &BoundedQueue<TextUnit>) -> Result<(usize, usize)> {
    let mut stage = FrameStage::new(output);
    while let Item::Data(line) = input.take()? {
        stage.process(line)?;
    }
    stage.finish()
}
