//! Error type shared by every pipeline stage.

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every failure the pipeline can report. All of them are fatal: the
/// stage that hits one aborts the queues and the whole run winds down.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading the input source or writing the output sink failed.
    #[error("I/O error in {stage}: {source}")]
    Io {
        stage: &'static str,
        #[source]
        source: io::Error,
    },

    /// The output frame would have grown past its fixed width.
    #[error("output frame overflow: {len} bytes exceeds width {width}")]
    FrameOverflow { len: usize, width: usize },

    /// Something was put on a queue after its termination marker.
    #[error("put after termination marker")]
    PutAfterEnd,

    /// A queue was created with no slots.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,

    /// A stage thread could not be started.
    #[error("failed to start stage {stage}: {source}")]
    Spawn {
        stage: &'static str,
        #[source]
        source: io::Error,
    },

    /// A queue mutex was poisoned by a panicking holder.
    #[error("queue lock poisoned")]
    Poisoned,

    /// A stage thread panicked.
    #[error("stage {0} panicked")]
    StagePanicked(&'static str),

    /// A sibling stage failed and the queues were torn down.
    #[error("pipeline aborted")]
    Aborted,
}

impl PipelineError {
    pub fn io(stage: &'static str, source: io::Error) -> Self {
        PipelineError::Io { stage, source }
    }

    /// True for the secondary error siblings see after another stage failed.
    pub fn is_aborted(&self) -> bool {
        matches!(self, PipelineError::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_frame_overflow() {
        let err = PipelineError::FrameOverflow { len: 81, width: 80 };
        assert_eq!(
            err.to_string(),
            "output frame overflow: 81 bytes exceeds width 80"
        );
    }

    #[test]
    fn test_display_io_names_stage() {
        let err = PipelineError::io("writer", io::Error::other("disk full"));
        assert_eq!(err.to_string(), "I/O error in writer: disk full");
    }

    #[test]
    fn test_is_aborted() {
        assert!(PipelineError::Aborted.is_aborted());
        assert!(!PipelineError::Poisoned.is_aborted());
    }
}
