use crate::types::*;
use std::path::Path;

/// Core geometry kernel trait. Every geometric step of the fuse pipeline goes through it.
/// Implemented by TruckKernel (wraps real truck) and MockKernel (deterministic test double).
pub trait Kernel {
    /// Import the shells of a STEP file as one shape.
    fn import_step(&mut self, path: &Path) -> Result<ShapeHandle, KernelError>;

    /// Boolean union of two shapes.
    fn fuse(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError>;

    /// Merge coincident vertices, edges and faces so the shape is one connected topology.
    fn make_connected(
        &mut self,
        shape: &ShapeHandle,
        run_parallel: bool,
    ) -> Result<ShapeHandle, KernelError>;

    /// Write the shape in the kernel's native BREP format.
    fn export_brep(&self, shape: &ShapeHandle, path: &Path) -> Result<(), KernelError>;

    /// Read a file written by `export_brep` back into a shape.
    fn import_brep(&mut self, path: &Path) -> Result<ShapeHandle, KernelError>;
}

/// Read-only queries on kernel shapes.
pub trait KernelIntrospect {
    /// Topology counts of a shape, or None if the handle is unknown.
    fn shape_stats(&self, shape: &ShapeHandle) -> Option<ShapeStats>;
}
