//! The fixed import → fuse → connect → export pass.

use fuse_kernel::ShapeStats;
use fuse_types::ThreadCount;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::connect::execute_make_connected;
use crate::export::execute_export;
use crate::fuse::execute_fuse;
use crate::import::execute_import;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Inputs of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct FuseJob {
    /// Surface model, imported first.
    pub surface_path: PathBuf,
    /// Volume model, imported second. The fuse is volume ∪ surface.
    pub volume_path: PathBuf,
    /// Directory for the BREP file. `None` writes to the working directory.
    pub output_dir: Option<PathBuf>,
    pub threads: ThreadCount,
    pub run_parallel: bool,
}

impl FuseJob {
    /// `connected_shape_<N>.brep` inside the output directory.
    pub fn output_path(&self) -> PathBuf {
        let name = self.threads.brep_file_name();
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub output_path: PathBuf,
    /// Wall-clock time of the make-connected step alone.
    pub connect_time: Duration,
    /// Topology of the exported shape.
    pub stats: ShapeStats,
    /// Warnings collected from every step, in order.
    pub warnings: Vec<String>,
}

fn check_output_dir(dir: &Path) -> Result<(), OpError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(OpError::InvalidParameter {
            reason: format!("output directory {} does not exist", dir.display()),
        })
    }
}

/// Run the whole pass. Stops at the first failing step; nothing is written
/// unless every step before the export succeeded.
pub fn run_pipeline(kb: &mut dyn KernelBundle, job: &FuseJob) -> Result<PipelineReport, OpError> {
    if let Some(dir) = &job.output_dir {
        check_output_dir(dir)?;
    }
    info!(
        threads = job.threads.get(),
        run_parallel = job.run_parallel,
        "starting fuse pipeline"
    );

    let surface = execute_import(kb, &job.surface_path)?;
    let volume = execute_import(kb, &job.volume_path)?;
    let fused = execute_fuse(kb, &volume.handle, &surface.handle)?;
    let connected = execute_make_connected(kb, &fused.handle, job.run_parallel)?;

    let output_path = job.output_path();
    let export = execute_export(kb, &connected.handle, &output_path)?;

    let warnings = [surface, volume, fused]
        .into_iter()
        .map(|step| step.diagnostics)
        .chain([connected.diagnostics.clone(), export])
        .flat_map(|d| d.warnings)
        .collect();

    Ok(PipelineReport {
        output_path,
        connect_time: connected.diagnostics.kernel_time,
        stats: connected.stats,
        warnings,
    })
}
