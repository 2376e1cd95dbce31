//! Deterministic test double implementing Kernel and KernelIntrospect.
//!
//! Shapes are plain topology counts. STEP input only has to exist and carry the
//! ISO-10303-21 magic; every imported model is a unit box. BREP output is the
//! shape record as JSON. Failures can be injected per operation and every call
//! is recorded, so pipeline tests can assert which steps ran.

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

const STEP_MAGIC: &str = "ISO-10303-21";

/// A synthetic shape with deterministic topology counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockShape {
    pub stats: ShapeStats,
    /// Set once the shape went through `make_connected`.
    pub connected: bool,
    /// File names of the STEP models this shape was built from, in fuse order.
    pub sources: Vec<String>,
}

impl MockShape {
    fn unit_box(source: String) -> Self {
        Self {
            stats: ShapeStats {
                shells: 1,
                faces: 6,
                edges: 12,
                vertices: 8,
                closed: true,
            },
            connected: false,
            sources: vec![source],
        }
    }
}

/// Kernel operations, as recorded in the call log and targeted by injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOperation {
    ImportStep,
    Fuse,
    MakeConnected,
    ExportBrep,
    ImportBrep,
}

/// Deterministic test double for the geometry kernel.
/// Implements both Kernel and KernelIntrospect.
pub struct MockKernel {
    next_handle: u64,
    shapes: HashMap<u64, MockShape>,
    fail_on: Option<MockOperation>,
    calls: RefCell<Vec<MockOperation>>,
    last_run_parallel: Option<bool>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            shapes: HashMap::new(),
            fail_on: None,
            calls: RefCell::new(Vec::new()),
            last_run_parallel: None,
        }
    }

    /// Mock kernel whose `operation` always fails.
    pub fn failing(operation: MockOperation) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::new()
        }
    }

    /// Every kernel call made so far, in order.
    pub fn calls(&self) -> Vec<MockOperation> {
        self.calls.borrow().clone()
    }

    /// The parallel flag of the most recent `make_connected` call.
    pub fn last_run_parallel(&self) -> Option<bool> {
        self.last_run_parallel
    }

    pub fn shape(&self, handle: &ShapeHandle) -> Option<&MockShape> {
        self.shapes.get(&handle.id())
    }

    fn store(&mut self, shape: MockShape) -> ShapeHandle {
        let h = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(h.id(), shape);
        h
    }

    fn get(&self, handle: &ShapeHandle) -> Result<&MockShape, KernelError> {
        self.shape(handle).ok_or_else(|| KernelError::ShapeNotFound {
            handle: handle.clone(),
        })
    }

    /// Log the call and report whether a failure was injected for it.
    fn enter(&self, operation: MockOperation) -> bool {
        self.calls.borrow_mut().push(operation);
        self.fail_on == Some(operation)
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Kernel for MockKernel {
    fn import_step(&mut self, path: &Path) -> Result<ShapeHandle, KernelError> {
        if self.enter(MockOperation::ImportStep) {
            return Err(KernelError::read(path, "injected failure"));
        }
        let text = std::fs::read_to_string(path).map_err(|e| KernelError::read(path, e))?;
        if !text.trim_start().starts_with(STEP_MAGIC) {
            return Err(KernelError::read(path, "missing ISO-10303-21 header"));
        }
        Ok(self.store(MockShape::unit_box(source_name(path))))
    }

    fn fuse(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError> {
        if self.enter(MockOperation::Fuse) {
            return Err(KernelError::BooleanFailed {
                reason: "injected failure".to_string(),
            });
        }
        let shape_a = self.get(a)?;
        let shape_b = self.get(b)?;
        let fused = MockShape {
            stats: ShapeStats {
                shells: shape_a.stats.shells + shape_b.stats.shells,
                faces: shape_a.stats.faces + shape_b.stats.faces,
                edges: shape_a.stats.edges + shape_b.stats.edges,
                vertices: shape_a.stats.vertices + shape_b.stats.vertices,
                closed: shape_a.stats.closed && shape_b.stats.closed,
            },
            connected: false,
            sources: shape_a
                .sources
                .iter()
                .chain(&shape_b.sources)
                .cloned()
                .collect(),
        };
        Ok(self.store(fused))
    }

    fn make_connected(
        &mut self,
        shape: &ShapeHandle,
        run_parallel: bool,
    ) -> Result<ShapeHandle, KernelError> {
        self.last_run_parallel = Some(run_parallel);
        if self.enter(MockOperation::MakeConnected) {
            return Err(KernelError::ConnectFailed {
                reason: "injected failure".to_string(),
            });
        }
        let mut connected = self.get(shape)?.clone();
        connected.stats.shells = connected.stats.shells.min(1);
        connected.connected = true;
        Ok(self.store(connected))
    }

    fn export_brep(&self, shape: &ShapeHandle, path: &Path) -> Result<(), KernelError> {
        if self.enter(MockOperation::ExportBrep) {
            return Err(KernelError::write(path, "injected failure"));
        }
        let text =
            serde_json::to_string_pretty(self.get(shape)?).map_err(|e| KernelError::write(path, e))?;
        std::fs::write(path, text).map_err(|e| KernelError::write(path, e))
    }

    fn import_brep(&mut self, path: &Path) -> Result<ShapeHandle, KernelError> {
        if self.enter(MockOperation::ImportBrep) {
            return Err(KernelError::read(path, "injected failure"));
        }
        let text = std::fs::read_to_string(path).map_err(|e| KernelError::read(path, e))?;
        let shape: MockShape = serde_json::from_str(&text).map_err(|e| KernelError::read(path, e))?;
        Ok(self.store(shape))
    }
}

impl KernelIntrospect for MockKernel {
    fn shape_stats(&self, shape: &ShapeHandle) -> Option<ShapeStats> {
        self.shape(shape).map(|s| s.stats)
    }
}
