//! Geometry kernel backed by truck.

use crate::brep_io::{self, solid_from_shells};
use crate::connect::{connect_shells, CompressedBoundary};
use crate::tessellation;
use crate::traits::Kernel;
use crate::truck_introspect::{is_closed, solid_stats};
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use truck_modeling::topology::{Shell, Solid};
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModel};

/// Real geometry kernel backed by the truck BREP library.
pub struct TruckKernel {
    settings: KernelSettings,
    /// Dedicated workers for the connect pass, sized by `settings.threads`.
    pool: Option<rayon::ThreadPool>,
    next_handle: u64,
    solids: HashMap<u64, Solid>,
}

impl TruckKernel {
    /// Kernel with default settings, running parallel work on the global rayon pool.
    pub fn new() -> Self {
        Self {
            settings: KernelSettings::default(),
            pool: None,
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    /// Kernel with explicit settings. Builds a worker pool when a thread count is given.
    pub fn with_settings(settings: KernelSettings) -> Result<Self, KernelError> {
        let pool = match settings.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads.get())
                    .thread_name(|i| format!("fuse-worker-{i}"))
                    .build()
                    .map_err(|e| KernelError::ThreadPool {
                        reason: e.to_string(),
                    })?,
            ),
            None => None,
        };
        debug!(threads = ?settings.threads, "created truck kernel");
        Ok(Self {
            settings,
            pool,
            next_handle: 1,
            solids: HashMap::new(),
        })
    }

    pub fn settings(&self) -> &KernelSettings {
        &self.settings
    }

    fn alloc_handle(&mut self) -> ShapeHandle {
        let h = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    pub fn store_solid(&mut self, solid: Solid) -> ShapeHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    pub fn get_solid(&self, handle: &ShapeHandle) -> Option<&Solid> {
        self.solids.get(&handle.id())
    }

    fn solid(&self, handle: &ShapeHandle) -> Result<&Solid, KernelError> {
        self.get_solid(handle)
            .ok_or_else(|| KernelError::ShapeNotFound {
                handle: handle.clone(),
            })
    }

    /// Run the connect pass, on the kernel's own pool when parallel work is requested.
    pub fn connect(
        &self,
        shells: Vec<CompressedBoundary>,
        parallel: bool,
    ) -> (Vec<CompressedBoundary>, ConnectReport) {
        let tolerance = self.settings.connect_tolerance;
        match (&self.pool, parallel) {
            (Some(pool), true) => pool.install(|| connect_shells(shells, tolerance, true)),
            _ => connect_shells(shells, tolerance, parallel),
        }
    }

    /// Write a shape as a STEP file.
    pub fn export_step(&self, shape: &ShapeHandle, path: &Path) -> Result<(), KernelError> {
        let compressed = self.solid(shape)?.compress();
        let step_string = CompleteStepDisplay::new(
            StepModel::from(&compressed),
            StepHeaderDescriptor {
                file_name: path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("shape.step")
                    .to_string(),
                organization_system: "step-fuse".to_owned(),
                ..Default::default()
            },
        )
        .to_string();
        std::fs::write(path, step_string).map_err(|e| KernelError::write(path, e))
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckKernel {
    fn import_step(&mut self, path: &Path) -> Result<ShapeHandle, KernelError> {
        let text = std::fs::read_to_string(path).map_err(|e| KernelError::read(path, e))?;
        let soups = tessellation::facet_step(&text, self.settings.tessellation_ratio)
            .map_err(|reason| KernelError::read(path, reason))?;

        let (shells, report) = self.connect(soups, true);
        debug!(?report, "sewed STEP facets");
        if shells.is_empty() {
            return Err(KernelError::read(path, "no faces survived faceting"));
        }
        let solid = solid_from_shells(shells).map_err(|reason| KernelError::read(path, reason))?;

        let stats = solid_stats(&solid);
        info!(
            path = %path.display(),
            shells = stats.shells,
            faces = stats.faces,
            closed = stats.closed,
            "imported STEP file"
        );
        Ok(self.store_solid(solid))
    }

    fn fuse(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError> {
        let solid_a = self.solid(a)?.clone();
        let solid_b = self.solid(b)?.clone();

        let result = if is_closed(&solid_a) && is_closed(&solid_b) {
            truck_shapeops::or(&solid_a, &solid_b, self.settings.fuse_tolerance).ok_or_else(
                || KernelError::BooleanFailed {
                    reason: "truck or() returned None".to_string(),
                },
            )?
        } else {
            warn!("fuse operand is not a closed solid, combining shells without a boolean");
            let mut shells: Vec<Shell> = solid_a.boundaries().clone();
            shells.extend(solid_b.boundaries().iter().cloned());
            Solid::new_unchecked(shells)
        };

        debug!(shells = result.boundaries().len(), "fused shapes");
        Ok(self.store_solid(result))
    }

    fn make_connected(
        &mut self,
        shape: &ShapeHandle,
        run_parallel: bool,
    ) -> Result<ShapeHandle, KernelError> {
        let compressed = self.solid(shape)?.compress();
        let (shells, report) = self.connect(compressed.boundaries, run_parallel);
        info!(
            vertices_merged = report.vertices_merged,
            edges_merged = report.edges_merged,
            faces_merged = report.faces_merged,
            faces_dropped = report.faces_dropped,
            shells = report.shells,
            run_parallel,
            "connected shape"
        );
        if shells.is_empty() {
            return Err(KernelError::ConnectFailed {
                reason: "no faces remain after merging".to_string(),
            });
        }
        let solid =
            solid_from_shells(shells).map_err(|reason| KernelError::ConnectFailed { reason })?;
        Ok(self.store_solid(solid))
    }

    fn export_brep(&self, shape: &ShapeHandle, path: &Path) -> Result<(), KernelError> {
        brep_io::write_brep(self.solid(shape)?, path)?;
        info!(path = %path.display(), "exported BREP file");
        Ok(())
    }

    fn import_brep(&mut self, path: &Path) -> Result<ShapeHandle, KernelError> {
        let solid = brep_io::read_brep(path)?;
        Ok(self.store_solid(solid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;
    use crate::traits::KernelIntrospect;

    #[test]
    fn test_with_settings_builds_pool() {
        let settings = KernelSettings {
            threads: Some(ThreadCount::new(2).unwrap()),
            ..Default::default()
        };
        let kernel = TruckKernel::with_settings(settings).unwrap();
        assert!(kernel.pool.is_some());
        assert_eq!(kernel.settings().threads.map(|t| t.get()), Some(2));
        assert!(TruckKernel::new().pool.is_none());
    }

    #[test]
    fn test_unknown_handle_is_reported() {
        let mut kernel = TruckKernel::new();
        let err = kernel
            .make_connected(&ShapeHandle(42), false)
            .unwrap_err();
        assert!(matches!(err, KernelError::ShapeNotFound { .. }));
    }

    #[test]
    fn test_make_connected_keeps_box() {
        let mut kernel = TruckKernel::new();
        let handle = kernel.store_solid(primitives::make_box(1.0, 1.0, 1.0));
        let connected = kernel.make_connected(&handle, false).unwrap();
        assert_ne!(connected, handle);

        let stats = kernel.shape_stats(&connected).unwrap();
        assert_eq!(stats.shells, 1);
        assert_eq!(stats.faces, 6);
        assert_eq!(stats.edges, 12);
        assert_eq!(stats.vertices, 8);
        assert!(stats.closed);
    }

    #[test]
    fn test_import_step_missing_file() {
        let mut kernel = TruckKernel::new();
        let err = kernel
            .import_step(Path::new("/nonexistent/last_dura.step"))
            .unwrap_err();
        assert!(err.is_read_error());
    }
}
