use fuse_kernel::ShapeHandle;
use std::path::Path;
use std::time::Instant;

use crate::kernel_ext::KernelBundle;
use crate::types::{Diagnostics, OpError};

/// Write `shape` as a BREP file at `path`.
pub fn execute_export(
    kb: &mut dyn KernelBundle,
    shape: &ShapeHandle,
    path: &Path,
) -> Result<Diagnostics, OpError> {
    if path.file_name().is_none() {
        return Err(OpError::InvalidParameter {
            reason: format!("output path {} has no file name", path.display()),
        });
    }
    let start = Instant::now();
    kb.export_brep(shape, path)?;
    Ok(Diagnostics {
        warnings: Vec::new(),
        kernel_time: start.elapsed(),
    })
}
