use std::path::PathBuf;

// Re-export shared types from fuse-types
pub use fuse_types::{ShapeStats, ThreadCount};

/// Opaque handle to a shape in the geometry kernel.
/// NEVER persisted. Valid only for the kernel session that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) u64);

impl ShapeHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("error reading {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("boolean fuse failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("make connected failed: {reason}")]
    ConnectFailed { reason: String },

    #[error("error writing {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("shape not found: {handle:?}")]
    ShapeNotFound { handle: ShapeHandle },

    #[error("failed to build worker pool: {reason}")]
    ThreadPool { reason: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

impl KernelError {
    pub(crate) fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        KernelError::ReadFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        KernelError::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures of reading input files.
    pub fn is_read_error(&self) -> bool {
        matches!(self, KernelError::ReadFailed { .. })
    }
}

/// Construction-time configuration of a kernel session.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelSettings {
    /// Size of the dedicated worker pool. `None` uses the global rayon pool.
    pub threads: Option<ThreadCount>,
    /// Tolerance handed to the boolean engine.
    pub fuse_tolerance: f64,
    /// Distance below which vertices and edge midpoints are treated as coincident.
    pub connect_tolerance: f64,
    /// STEP faceting tolerance as a fraction of the model's bounding-box diameter.
    pub tessellation_ratio: f64,
}

impl Default for KernelSettings {
    fn default() -> Self {
        Self {
            threads: None,
            fuse_tolerance: 0.05,
            connect_tolerance: 1e-6,
            tessellation_ratio: 1e-3,
        }
    }
}

/// Counters reported by one connect pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectReport {
    pub vertices_merged: usize,
    pub edges_merged: usize,
    pub edges_collapsed: usize,
    pub faces_merged: usize,
    pub faces_dropped: usize,
    pub shells: usize,
}
