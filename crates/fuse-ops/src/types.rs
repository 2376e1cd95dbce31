use fuse_kernel::{KernelError, ShapeHandle, ShapeStats};
use std::time::Duration;

/// Result of one pipeline operation.
#[derive(Debug, Clone)]
pub struct OpResult {
    /// The shape produced. Runtime-only, not persisted.
    pub handle: ShapeHandle,
    /// Topology counts of the produced shape.
    pub stats: ShapeStats,
    pub diagnostics: Diagnostics,
}

/// Non-fatal diagnostics from an operation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Warning messages.
    pub warnings: Vec<String>,
    /// Wall-clock time of the kernel call alone.
    pub kernel_time: Duration,
}

/// Errors from pipeline operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}

impl OpError {
    /// True when an input file could not be read.
    pub fn is_read_error(&self) -> bool {
        matches!(self, OpError::Kernel(e) if e.is_read_error())
    }
}
