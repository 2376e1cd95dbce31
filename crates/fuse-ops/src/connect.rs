use fuse_kernel::ShapeHandle;
use std::time::Instant;
use tracing::{info, warn};

use crate::kernel_ext::KernelBundle;
use crate::types::{Diagnostics, OpError, OpResult};

/// Merge coincident topology of `shape`.
///
/// `diagnostics.kernel_time` covers exactly the kernel's `make_connected` call.
pub fn execute_make_connected(
    kb: &mut dyn KernelBundle,
    shape: &ShapeHandle,
    run_parallel: bool,
) -> Result<OpResult, OpError> {
    let before = kb.stats_or_empty(shape);

    let start = Instant::now();
    let handle = kb.make_connected(shape, run_parallel)?;
    let kernel_time = start.elapsed();

    let stats = kb.stats_or_empty(&handle);
    let mut warnings = Vec::new();
    if !stats.closed {
        let message = "connected shape is not closed".to_string();
        warn!(shells = stats.shells, "{message}");
        warnings.push(message);
    }
    info!(
        vertices_before = before.vertices,
        vertices_after = stats.vertices,
        edges_before = before.edges,
        edges_after = stats.edges,
        run_parallel,
        "made shape connected"
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
