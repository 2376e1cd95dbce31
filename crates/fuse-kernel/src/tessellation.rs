//! STEP faceting.
//!
//! Reads the shells of a STEP exchange structure through truck-stepio,
//! triangulates them with truck-meshalgo and turns every triangle into a
//! planar face with its own vertices and line edges. The resulting
//! triangle soup is reassembled by the connect pass.

use crate::connect::CompressedBoundary;
use tracing::{debug, warn};
use truck_meshalgo::prelude::*;
use truck_modeling::geometry::{Curve, Line, Plane, Surface};
use truck_modeling::{InnerSpace, Point3};
use truck_stepio::r#in::{ruststep, Table};
use truck_topology::compress::{
    CompressedEdge, CompressedEdgeIndex, CompressedFace, CompressedShell,
};

/// Tolerance of the first triangulation pass, used only to size the model.
const COARSE_TOLERANCE: f64 = 0.01;

/// Triangles whose doubled area is below this are dropped.
const DEGENERATE_AREA: f64 = 1e-12;

/// Facet every shell of a STEP file into a triangle soup.
///
/// `ratio` scales each shell's bounding-box diameter into its meshing tolerance.
/// Returns an error message when the text cannot be parsed or holds no usable shell.
pub fn facet_step(step_string: &str, ratio: f64) -> Result<Vec<CompressedBoundary>, String> {
    let exchange = ruststep::parser::parse(step_string)
        .map_err(|e| format!("failed to parse STEP file: {e}"))?;
    let Some(data_section) = exchange.data.first() else {
        return Err("STEP file contains no data sections".to_string());
    };
    let table = Table::from_data_section(data_section);

    let mut shell_ids: Vec<_> = table.shell.keys().copied().collect();
    shell_ids.sort_unstable();

    let mut soups = Vec::with_capacity(shell_ids.len());
    for id in shell_ids {
        let Some(shell_holder) = table.shell.get(&id) else {
            continue;
        };
        let Ok(compressed_shell) = table.to_compressed_shell(shell_holder) else {
            warn!(shell = id, "skipping STEP shell that failed to convert");
            continue;
        };

        // First pass sizes the model, second pass meshes relative to it.
        let pre_mesh = compressed_shell.robust_triangulation(COARSE_TOLERANCE).to_polygon();
        let diameter = pre_mesh.bounding_box().diameter();
        let tolerance = if diameter.is_finite() && diameter > 0.0 {
            diameter * ratio
        } else {
            COARSE_TOLERANCE
        };
        let mesh = compressed_shell.robust_triangulation(tolerance).to_polygon();

        let soup = triangle_soup(&mesh_triangles(&mesh));
        debug!(
            shell = id,
            tolerance,
            faces = soup.faces.len(),
            "faceted STEP shell"
        );
        if !soup.faces.is_empty() {
            soups.push(soup);
        }
    }

    if soups.is_empty() {
        return Err("STEP file contains no shells that could be faceted".to_string());
    }
    Ok(soups)
}

/// Corner positions of every triangle of a polygon mesh. Quads are split along their first diagonal.
fn mesh_triangles(mesh: &PolygonMesh) -> Vec<[Point3; 3]> {
    let positions = mesh.positions();
    let mut triangles = Vec::with_capacity(mesh.tri_faces().len() + 2 * mesh.quad_faces().len());
    for tri in mesh.tri_faces() {
        triangles.push([
            positions[tri[0].pos],
            positions[tri[1].pos],
            positions[tri[2].pos],
        ]);
    }
    for quad in mesh.quad_faces() {
        triangles.push([
            positions[quad[0].pos],
            positions[quad[1].pos],
            positions[quad[2].pos],
        ]);
        triangles.push([
            positions[quad[0].pos],
            positions[quad[2].pos],
            positions[quad[3].pos],
        ]);
    }
    triangles
}

/// Build a compressed shell in which every triangle is an unconnected planar face.
///
/// Face normals follow the counter-clockwise winding of the corners.
pub fn triangle_soup(triangles: &[[Point3; 3]]) -> CompressedBoundary {
    let mut soup = CompressedShell {
        vertices: Vec::with_capacity(triangles.len() * 3),
        edges: Vec::with_capacity(triangles.len() * 3),
        faces: Vec::with_capacity(triangles.len()),
    };

    for &[p0, p1, p2] in triangles {
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.magnitude() < DEGENERATE_AREA {
            continue;
        }

        let corners = [p0, p1, p2];
        let first_vertex = soup.vertices.len();
        let first_edge = soup.edges.len();
        soup.vertices.extend_from_slice(&corners);
        for i in 0..3 {
            let j = (i + 1) % 3;
            soup.edges.push(CompressedEdge {
                vertices: (first_vertex + i, first_vertex + j),
                curve: Curve::Line(Line(corners[i], corners[j])),
            });
        }
        soup.faces.push(CompressedFace {
            boundaries: vec![(0..3)
                .map(|k| CompressedEdgeIndex {
                    index: first_edge + k,
                    orientation: true,
                })
                .collect()],
            orientation: true,
            surface: Surface::Plane(Plane::new(p0, p1, p2)),
        });
    }
    soup
}
