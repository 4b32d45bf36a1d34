//! Construction-time failure modes.
//!
//! The per-frame pipeline is infallible by design: degenerate geometry is
//! silently skipped and capacity saturation is silently dropped. The only
//! place a host can get a recoverable error back is when it is setting
//! the pipeline up, before any frame has been rendered.

use core::fmt;

/// An error raised while constructing or configuring a [`crate::BufferPool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineError {
    /// The requested viewport or tile geometry was degenerate (zero width,
    /// zero height, or a zero tile size).
    InvalidGeometry {
        /// A short description of which dimension was invalid.
        reason: &'static str,
    },
    /// A cluster's face range did not fit within the uploaded face list, or
    /// cluster ranges were not monotonically increasing.
    InvalidClusterRange {
        /// Index of the offending cluster within the uploaded slice.
        cluster_index: usize,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidGeometry { reason } => {
                write!(f, "invalid buffer pool geometry: {reason}")
            }
            PipelineError::InvalidClusterRange { cluster_index } => {
                write!(f, "cluster {cluster_index} has an out-of-order or out-of-bounds face range")
            }
        }
    }
}

impl std::error::Error for PipelineError {}
