use fuse_kernel::ShapeHandle;
use std::time::Instant;
use tracing::{info, warn};

use crate::kernel_ext::KernelBundle;
use crate::types::{Diagnostics, OpError, OpResult};

/// Fuse `tool` into `base`. A failed boolean is an error, never a silent pass-through.
pub fn execute_fuse(
    kb: &mut dyn KernelBundle,
    base: &ShapeHandle,
    tool: &ShapeHandle,
) -> Result<OpResult, OpError> {
    let start = Instant::now();
    let handle = kb.fuse(base, tool)?;
    let kernel_time = start.elapsed();

    let stats = kb.stats_or_empty(&handle);
    let mut warnings = Vec::new();
    if stats.shells > 1 {
        let message = format!("fused shape has {} separate shells", stats.shells);
        warn!("{message}");
        warnings.push(message);
    }
    info!(
        shells = stats.shells,
        faces = stats.faces,
        elapsed_ms = kernel_time.as_millis() as u64,
        "fused shapes"
    );

    Ok(OpResult {
        handle,
        stats,
        diagnostics: Diagnostics {
            warnings,
            kernel_time,
        },
    })
}
