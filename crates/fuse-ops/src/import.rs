use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::kernel_ext::KernelBundle;
use crate::types::{Diagnostics, OpError, OpResult};

/// Import a STEP model.
///
/// A model whose shells are not all closed (a surface model) is accepted
/// with a warning.
pub fn execute_import(kb: &mut dyn KernelBundle, path: &Path) -> Result<OpResult, OpError> {
    let start = Instant::now();
    let handle = kb.import_step(path)?;
    let kernel_time = start.elapsed();

    let stats = kb.stats_or_empty(&handle);
    let mut warnings = Vec::new();
    if !stats.closed {
        let message = format!("{} is not a closed solid", path.display());
        warn!("{message}");
        warnings.push(message);
    }
    info!(
        path = %path.display(),
        faces = stats.faces,
        elapsed_ms = kernel_time.as_millis() as u64,
        "loaded model"
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
