//! Topology queries on truck solids.

use crate::traits::KernelIntrospect;
use crate::truck_kernel::TruckKernel;
use crate::types::*;
use std::collections::HashSet;

use truck_modeling::topology::Solid;
use truck_topology::shell::ShellCondition;

/// True when the solid has at least one shell and every shell is closed.
pub(crate) fn is_closed(solid: &Solid) -> bool {
    !solid.boundaries().is_empty()
        && solid
            .boundaries()
            .iter()
            .all(|shell| shell.shell_condition() == ShellCondition::Closed)
}

/// Count shells, faces and distinct edges and vertices of a solid.
pub fn solid_stats(solid: &Solid) -> ShapeStats {
    let mut edges = HashSet::new();
    let mut vertices = HashSet::new();
    let mut faces = 0;
    for shell in solid.boundaries() {
        faces += shell.face_iter().count();
        edges.extend(shell.edge_iter().map(|e| e.id()));
        vertices.extend(shell.vertex_iter().map(|v| v.id()));
    }
    ShapeStats {
        shells: solid.boundaries().len(),
        faces,
        edges: edges.len(),
        vertices: vertices.len(),
        closed: is_closed(solid),
    }
}

/// Allows TruckKernel to satisfy the KernelBundle blanket impl (Kernel + KernelIntrospect).
impl KernelIntrospect for TruckKernel {
    fn shape_stats(&self, shape: &ShapeHandle) -> Option<ShapeStats> {
        self.get_solid(shape).map(solid_stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brep_io::solid_from_shells;
    use crate::primitives;

    #[test]
    fn test_box_stats() {
        let stats = solid_stats(&primitives::make_box(2.0, 2.0, 2.0));
        assert_eq!(
            stats,
            ShapeStats {
                shells: 1,
                faces: 6,
                edges: 12,
                vertices: 8,
                closed: true,
            }
        );
        assert_eq!(stats.euler_characteristic(), 2);
    }

    #[test]
    fn test_open_shell_is_not_closed() {
        let mut shell = primitives::make_box(1.0, 1.0, 1.0).compress().boundaries.remove(0);
        shell.faces.pop();
        let solid = solid_from_shells(vec![shell]).unwrap();
        let stats = solid_stats(&solid);
        assert_eq!(stats.faces, 5);
        assert!(!stats.closed);
    }

    #[test]
    fn test_unknown_handle_has_no_stats() {
        let kernel = TruckKernel::new();
        assert!(kernel.shape_stats(&ShapeHandle(7)).is_none());
    }
}
