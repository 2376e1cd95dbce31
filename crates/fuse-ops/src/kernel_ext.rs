use fuse_kernel::{Kernel, KernelIntrospect, ShapeHandle, ShapeStats};

/// A kernel the operations can both drive and query.
///
/// Operations take `&mut dyn KernelBundle` so one object serves the mutating
/// `Kernel` calls and the read-only stats queries that follow them.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;

    /// Stats of `shape`, empty when the kernel does not know it.
    fn stats_or_empty(&self, shape: &ShapeHandle) -> ShapeStats {
        self.as_introspect().shape_stats(shape).unwrap_or_default()
    }
}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
