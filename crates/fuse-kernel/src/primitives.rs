//! Primitive solids built from truck sweeps, plus helpers that take shells
//! apart for exercising the connect pass.

use crate::connect::CompressedBoundary;
use crate::types::KernelError;
use std::collections::HashMap;
use std::f64::consts::PI;
use truck_modeling::builder;
use truck_modeling::topology::{Shell, Solid};
use truck_modeling::{EuclideanSpace, Point3, Rad, Vector3};
use truck_topology::compress::{
    CompressedEdge, CompressedEdgeIndex, CompressedFace, CompressedShell,
};

/// Box with one corner at `origin` extending by `size` along +X, +Y, +Z.
pub fn make_box_at(origin: Point3, size: Vector3) -> Solid {
    let v = builder::vertex(origin);
    let edge = builder::tsweep(&v, Vector3::new(size.x, 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, size.y, 0.0));
    builder::tsweep(&face, Vector3::new(0.0, 0.0, size.z))
}

/// Box from the origin to (w, h, d).
pub fn make_box(w: f64, h: f64, d: f64) -> Solid {
    make_box_at(Point3::origin(), Vector3::new(w, h, d))
}

/// Box from the origin to (w, h, d) without its last face: an open surface model.
pub fn make_open_box(w: f64, h: f64, d: f64) -> Result<Solid, KernelError> {
    let mut shell = make_box(w, h, d).compress().boundaries.remove(0);
    shell.faces.pop();
    let shell = Shell::extract(shell).map_err(|e| KernelError::Other {
        message: format!("failed to rebuild open box: {e}"),
    })?;
    Ok(Solid::new_unchecked(vec![shell]))
}

/// Cylinder with its base centered at the origin in the XY plane, extending along +Z.
pub fn make_cylinder(radius: f64, height: f64) -> Result<Solid, KernelError> {
    let v = builder::vertex(Point3::new(radius, 0.0, 0.0));
    let wire = builder::rsweep(&v, Point3::origin(), Vector3::unit_z(), Rad(2.0 * PI));
    let face = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::Other {
        message: format!("failed to create circular face: {e}"),
    })?;
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, height)))
}

/// Give every face of `shell` its own copies of the vertices and edges it uses.
///
/// Wires stay closed and geometry and orientation are preserved, so the
/// connect pass can rebuild the original sharing.
pub fn explode_faces(shell: &CompressedBoundary) -> CompressedBoundary {
    let mut exploded = CompressedShell {
        vertices: Vec::new(),
        edges: Vec::new(),
        faces: Vec::with_capacity(shell.faces.len()),
    };
    for face in &shell.faces {
        let mut local: HashMap<usize, usize> = HashMap::new();
        let mut boundaries = Vec::with_capacity(face.boundaries.len());
        for wire in &face.boundaries {
            let mut exploded_wire = Vec::with_capacity(wire.len());
            for ei in wire {
                let edge = &shell.edges[ei.index];
                let mut copy_vertex = |v: usize| {
                    *local.entry(v).or_insert_with(|| {
                        exploded.vertices.push(shell.vertices[v]);
                        exploded.vertices.len() - 1
                    })
                };
                let front = copy_vertex(edge.vertices.0);
                let back = copy_vertex(edge.vertices.1);
                exploded.edges.push(CompressedEdge {
                    vertices: (front, back),
                    curve: edge.curve.clone(),
                });
                exploded_wire.push(CompressedEdgeIndex {
                    index: exploded.edges.len() - 1,
                    orientation: ei.orientation,
                });
            }
            boundaries.push(exploded_wire);
        }
        exploded.faces.push(CompressedFace {
            boundaries,
            orientation: face.orientation,
            surface: face.surface.clone(),
        });
    }
    exploded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_make_box_topology() {
        let solid = make_box(1.0, 2.0, 3.0);

        let boundaries = solid.boundaries();
        assert_eq!(boundaries.len(), 1, "Box should have 1 shell");

        let shell = &boundaries[0];
        let edge_ids: HashSet<_> = shell.edge_iter().map(|e| e.id()).collect();
        let vert_ids: HashSet<_> = shell.vertex_iter().map(|v| v.id()).collect();

        assert_eq!(shell.face_iter().count(), 6);
        assert_eq!(edge_ids.len(), 12);
        assert_eq!(vert_ids.len(), 8);
    }

    #[test]
    fn test_make_box_at_offset() {
        let solid = make_box_at(Point3::new(5.0, -1.0, 2.0), Vector3::new(2.0, 3.0, 4.0));
        let shell = &solid.boundaries()[0];

        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for v in shell.vertex_iter() {
            let p = v.point();
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        approx::assert_abs_diff_eq!(min[0], 5.0, epsilon = 1e-10);
        approx::assert_abs_diff_eq!(max[1], 2.0, epsilon = 1e-10);
        approx::assert_abs_diff_eq!(max[2] - min[2], 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_make_cylinder_has_caps_and_side() {
        let solid = make_cylinder(1.0, 2.0).unwrap();
        assert_eq!(solid.boundaries().len(), 1);
        assert!(solid.boundaries()[0].face_iter().count() >= 3);
    }

    #[test]
    fn test_make_open_box_has_five_faces() {
        let solid = make_open_box(1.0, 1.0, 1.0).unwrap();
        assert_eq!(solid.boundaries().len(), 1);
        assert_eq!(solid.boundaries()[0].face_iter().count(), 5);
    }

    #[test]
    fn test_explode_faces_unshares_everything() {
        let compressed = make_box(1.0, 1.0, 1.0).compress();
        let exploded = explode_faces(&compressed.boundaries[0]);
        assert_eq!(exploded.faces.len(), 6);
        assert_eq!(exploded.edges.len(), 24);
        assert_eq!(exploded.vertices.len(), 24);
    }
}
