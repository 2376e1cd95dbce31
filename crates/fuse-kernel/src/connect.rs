//! Connect pass: merges coincident topology across compressed shells.
//!
//! Operates on truck's index-based compressed form. All input shells are
//! pooled into one vertex/edge space, so coincident entities of different
//! shells become shared. The output is one shell per connected component.

use crate::types::ConnectReport;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use truck_modeling::geometry::{Curve, Surface};
use truck_modeling::{
    BoundedCurve, EuclideanSpace, InnerSpace, ParametricCurve, ParametricSurface,
    ParametricSurface3D, Point3, SPHint2D, SearchNearestParameter, Vector3, D2,
};
use truck_topology::compress::{
    CompressedEdge, CompressedEdgeIndex, CompressedFace, CompressedShell,
};

/// Compressed shell over truck-modeling geometry.
pub type CompressedBoundary = CompressedShell<Point3, Curve, Surface>;

type Cell = (i64, i64, i64);

const MIN_TOLERANCE: f64 = 1e-12;

/// Coincident faces must have normals this close to parallel (1 - |cos|).
const NORMAL_TOLERANCE: f64 = 1e-6;

const SURFACE_SEARCH_TRIALS: usize = 100;

/// Merge coincident vertices, edges and faces of `shells`.
///
/// The result does not depend on `parallel`; it only selects whether the
/// per-vertex and per-edge geometry evaluation runs on the current rayon pool.
pub fn connect_shells(
    shells: Vec<CompressedBoundary>,
    tolerance: f64,
    parallel: bool,
) -> (Vec<CompressedBoundary>, ConnectReport) {
    let tolerance = tolerance.max(MIN_TOLERANCE);
    let mut report = ConnectReport::default();
    let pooled = concatenate(shells);

    // Vertices
    let remap = weld_points(&pooled.vertices, tolerance, parallel);
    let mut vertex_index = vec![usize::MAX; remap.len()];
    let mut vertices = Vec::new();
    for (i, &root) in remap.iter().enumerate() {
        if root == i {
            vertex_index[i] = vertices.len();
            vertices.push(pooled.vertices[i]);
        }
    }
    for i in 0..remap.len() {
        vertex_index[i] = vertex_index[remap[i]];
    }
    report.vertices_merged = remap.len() - vertices.len();

    // Edges
    let midpoints = map_maybe_parallel(&pooled.edges, parallel, |edge| midpoint(&edge.curve));
    let mut edge_map: Vec<Option<(usize, bool)>> = Vec::with_capacity(pooled.edges.len());
    let mut edges: Vec<CompressedEdge<Curve>> = Vec::new();
    let mut edge_midpoints: Vec<Point3> = Vec::new();
    let mut by_ends: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (edge, mid) in pooled.edges.into_iter().zip(midpoints) {
        let (a, b) = (vertex_index[edge.vertices.0], vertex_index[edge.vertices.1]);
        if a == b {
            report.edges_collapsed += 1;
            edge_map.push(None);
            continue;
        }
        let candidates = by_ends.entry((a.min(b), a.max(b))).or_default();
        let existing = candidates
            .iter()
            .copied()
            .find(|&c| (edge_midpoints[c] - mid).magnitude() < tolerance);
        match existing {
            Some(c) => {
                report.edges_merged += 1;
                edge_map.push(Some((c, edges[c].vertices.0 != a)));
            }
            None => {
                let index = edges.len();
                candidates.push(index);
                edges.push(CompressedEdge {
                    vertices: (a, b),
                    curve: edge.curve,
                });
                edge_midpoints.push(mid);
                edge_map.push(Some((index, false)));
            }
        }
    }

    // Faces
    let mut candidates: Vec<CompressedFace<Surface>> = Vec::new();
    for face in pooled.faces {
        let boundaries: Vec<Vec<CompressedEdgeIndex>> = face
            .boundaries
            .iter()
            .map(|wire| {
                wire.iter()
                    .filter_map(|ei| {
                        edge_map[ei.index].map(|(index, flipped)| CompressedEdgeIndex {
                            index,
                            orientation: ei.orientation != flipped,
                        })
                    })
                    .collect()
            })
            .collect();

        if is_degenerate(&boundaries) {
            report.faces_dropped += 1;
            continue;
        }
        candidates.push(CompressedFace {
            boundaries,
            orientation: face.orientation,
            surface: face.surface,
        });
    }

    // Faces sharing an edge set are only merged when their surfaces coincide too.
    let samples = map_maybe_parallel(&candidates, parallel, |face| {
        surface_sample(&face.surface, boundary_centroid(face, &edge_midpoints))
    });
    let mut faces: Vec<CompressedFace<Surface>> = Vec::new();
    let mut kept_samples: Vec<Option<(Point3, Vector3)>> = Vec::new();
    let mut by_edges: HashMap<Vec<usize>, Vec<usize>> = HashMap::new();
    for (face, sample) in candidates.into_iter().zip(samples) {
        let mut key: Vec<usize> = face.boundaries.iter().flatten().map(|ei| ei.index).collect();
        key.sort_unstable();
        let same_edges = by_edges.entry(key).or_default();
        if same_edges
            .iter()
            .any(|&c| coincident(kept_samples[c], sample, tolerance))
        {
            report.faces_merged += 1;
            continue;
        }
        same_edges.push(faces.len());
        faces.push(face);
        kept_samples.push(sample);
    }

    let shells = split_components(vertices, edges, faces);
    report.shells = shells.len();
    (shells, report)
}

/// Weld points closer than `tolerance`.
///
/// Returns, for every input point, the index of the point it was merged into
/// (itself for representatives). Merging is transitive: a chain of points each
/// within `tolerance` of the next collapses onto one representative, the
/// first-occurring point of the cluster.
pub fn weld_points(points: &[Point3], tolerance: f64, parallel: bool) -> Vec<usize> {
    let tolerance = tolerance.max(MIN_TOLERANCE);
    let cell_size = tolerance * 2.0;
    let cells = map_maybe_parallel(points, parallel, |p| point_to_cell(p, cell_size));

    let mut spatial_hash: HashMap<Cell, Vec<usize>> = HashMap::new();
    for (idx, cell) in cells.iter().enumerate() {
        spatial_hash.entry(*cell).or_default().push(idx);
    }

    let mut parent: Vec<usize> = (0..points.len()).collect();
    for (idx, point) in points.iter().enumerate() {
        let cell = cells[idx];
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (cell.0 + dx, cell.1 + dy, cell.2 + dz);
                    let Some(candidates) = spatial_hash.get(&neighbor) else {
                        continue;
                    };
                    for &other in candidates {
                        if other > idx && (points[other] - *point).magnitude() < tolerance {
                            union(&mut parent, idx, other);
                        }
                    }
                }
            }
        }
    }

    (0..points.len()).map(|i| find(&mut parent, i)).collect()
}

fn point_to_cell(p: &Point3, cell_size: f64) -> Cell {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

fn midpoint(curve: &Curve) -> Point3 {
    let (t0, t1) = curve.range_tuple();
    curve.subs((t0 + t1) / 2.0)
}

/// Mean of the edge midpoints around a face.
fn boundary_centroid(face: &CompressedFace<Surface>, edge_midpoints: &[Point3]) -> Point3 {
    let points: Vec<Point3> = face
        .boundaries
        .iter()
        .flatten()
        .map(|ei| edge_midpoints[ei.index])
        .collect();
    Point3::centroid(&points)
}

/// Point and unit normal of `surface` nearest to `anchor`.
fn surface_sample(surface: &Surface, anchor: Point3) -> Option<(Point3, Vector3)> {
    let (u, v) = SearchNearestParameter::<D2>::search_nearest_parameter(
        surface,
        anchor,
        SPHint2D::None,
        SURFACE_SEARCH_TRIALS,
    )?;
    let normal = ParametricSurface3D::normal(surface, u, v);
    Some((ParametricSurface::subs(surface, u, v), normal))
}

/// Samples that could not be computed never count as coincident.
fn coincident(
    a: Option<(Point3, Vector3)>,
    b: Option<(Point3, Vector3)>,
    tolerance: f64,
) -> bool {
    match (a, b) {
        (Some((pa, na)), Some((pb, nb))) => {
            (pa - pb).magnitude() < tolerance && 1.0 - na.dot(nb).abs() < NORMAL_TOLERANCE
        }
        _ => false,
    }
}

fn map_maybe_parallel<T, R, F>(items: &[T], parallel: bool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

/// A face is degenerate when one of its wires has lost all edges or folds onto a single edge.
fn is_degenerate(boundaries: &[Vec<CompressedEdgeIndex>]) -> bool {
    boundaries.is_empty()
        || boundaries.iter().any(|wire| {
            let distinct: HashSet<usize> = wire.iter().map(|ei| ei.index).collect();
            distinct.len() < 2
        })
}

fn concatenate(shells: Vec<CompressedBoundary>) -> CompressedBoundary {
    let mut pooled = CompressedShell {
        vertices: Vec::new(),
        edges: Vec::new(),
        faces: Vec::new(),
    };
    for shell in shells {
        let vertex_offset = pooled.vertices.len();
        let edge_offset = pooled.edges.len();
        pooled.vertices.extend(shell.vertices);
        pooled
            .edges
            .extend(shell.edges.into_iter().map(|edge| CompressedEdge {
                vertices: (
                    edge.vertices.0 + vertex_offset,
                    edge.vertices.1 + vertex_offset,
                ),
                curve: edge.curve,
            }));
        pooled
            .faces
            .extend(shell.faces.into_iter().map(|face| CompressedFace {
                boundaries: face
                    .boundaries
                    .iter()
                    .map(|wire| {
                        wire.iter()
                            .map(|ei| CompressedEdgeIndex {
                                index: ei.index + edge_offset,
                                orientation: ei.orientation,
                            })
                            .collect()
                    })
                    .collect(),
                orientation: face.orientation,
                surface: face.surface,
            }));
    }
    pooled
}

/// Group faces sharing an edge and build one compacted shell per group.
fn split_components(
    vertices: Vec<Point3>,
    edges: Vec<CompressedEdge<Curve>>,
    faces: Vec<CompressedFace<Surface>>,
) -> Vec<CompressedBoundary> {
    let mut parent: Vec<usize> = (0..faces.len()).collect();
    let mut owner: Vec<Option<usize>> = vec![None; edges.len()];
    for (fi, face) in faces.iter().enumerate() {
        for ei in face.boundaries.iter().flatten() {
            match owner[ei.index] {
                Some(other) => union(&mut parent, other, fi),
                None => owner[ei.index] = Some(fi),
            }
        }
    }

    let mut component_of_root: HashMap<usize, usize> = HashMap::new();
    let mut members: Vec<Vec<usize>> = Vec::new();
    for fi in 0..faces.len() {
        let root = find(&mut parent, fi);
        let component = *component_of_root.entry(root).or_insert_with(|| {
            members.push(Vec::new());
            members.len() - 1
        });
        members[component].push(fi);
    }

    let mut edges: Vec<Option<CompressedEdge<Curve>>> = edges.into_iter().map(Some).collect();
    let mut faces: Vec<Option<CompressedFace<Surface>>> = faces.into_iter().map(Some).collect();
    let mut shells = Vec::with_capacity(members.len());
    for face_indices in members {
        let mut shell = CompressedShell {
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
        };
        let mut local_vertex: HashMap<usize, usize> = HashMap::new();
        let mut local_edge: HashMap<usize, usize> = HashMap::new();
        for fi in face_indices {
            let Some(face) = faces[fi].take() else {
                continue;
            };
            let mut boundaries = Vec::with_capacity(face.boundaries.len());
            for wire in &face.boundaries {
                let mut local_wire = Vec::with_capacity(wire.len());
                for ei in wire {
                    let index = match local_edge.get(&ei.index) {
                        Some(&index) => index,
                        None => {
                            let Some(edge) = edges[ei.index].take() else {
                                continue;
                            };
                            let mut local = |v: usize| {
                                *local_vertex.entry(v).or_insert_with(|| {
                                    shell.vertices.push(vertices[v]);
                                    shell.vertices.len() - 1
                                })
                            };
                            let ends = (local(edge.vertices.0), local(edge.vertices.1));
                            shell.edges.push(CompressedEdge {
                                vertices: ends,
                                curve: edge.curve,
                            });
                            let index = shell.edges.len() - 1;
                            local_edge.insert(ei.index, index);
                            index
                        }
                    };
                    local_wire.push(CompressedEdgeIndex {
                        index,
                        orientation: ei.orientation,
                    });
                }
                boundaries.push(local_wire);
            }
            shell.faces.push(CompressedFace {
                boundaries,
                orientation: face.orientation,
                surface: face.surface,
            });
        }
        shells.push(shell);
    }
    shells
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        // Keep the smaller root so components stay ordered by first face.
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tessellation::triangle_soup;
    use truck_modeling::geometry::{BSplineCurve, KnotVec, Line, Plane};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_weld_points_merges_within_tolerance() {
        let points = vec![
            p(0.0, 0.0, 0.0),
            p(1e-8, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1e-8, 0.0),
        ];
        let remap = weld_points(&points, 1e-6, false);
        assert_eq!(remap, vec![0, 0, 2, 2]);
    }

    #[test]
    fn test_weld_points_follows_chains() {
        // Neighbours are 0.9e-6 apart, the ends 1.8e-6 apart.
        let points = vec![p(0.0, 0.0, 0.0), p(0.9e-6, 0.0, 0.0), p(1.8e-6, 0.0, 0.0)];
        assert_eq!(weld_points(&points, 1e-6, false), vec![0, 0, 0]);

        let reversed = vec![p(1.8e-6, 0.0, 0.0), p(0.9e-6, 0.0, 0.0), p(0.0, 0.0, 0.0)];
        assert_eq!(weld_points(&reversed, 1e-6, true), vec![0, 0, 0]);
    }

    #[test]
    fn test_weld_points_parallel_matches_sequential() {
        let points: Vec<Point3> = (0..200)
            .map(|i| {
                let t = i as f64 * 0.5;
                p(t.floor(), (t * 3.0).sin().round(), 0.0)
            })
            .collect();
        assert_eq!(
            weld_points(&points, 1e-6, true),
            weld_points(&points, 1e-6, false)
        );
    }

    #[test]
    fn test_two_triangles_share_diagonal() {
        // Unit square split along its diagonal, each triangle with private vertices.
        let soup = triangle_soup(&[
            [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)],
            [p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)],
        ]);
        assert_eq!(soup.vertices.len(), 6);
        assert_eq!(soup.edges.len(), 6);

        let (shells, report) = connect_shells(vec![soup], 1e-6, false);
        assert_eq!(shells.len(), 1);
        assert_eq!(shells[0].vertices.len(), 4);
        assert_eq!(shells[0].edges.len(), 5);
        assert_eq!(shells[0].faces.len(), 2);
        assert_eq!(report.vertices_merged, 2);
        assert_eq!(report.edges_merged, 1);

        // The shared diagonal is used in opposite directions by the two faces.
        let uses: Vec<(usize, bool)> = shells[0]
            .faces
            .iter()
            .flat_map(|f| f.boundaries.iter().flatten())
            .map(|ei| (ei.index, ei.orientation))
            .collect();
        let diagonal: Vec<bool> = uses
            .iter()
            .filter(|(index, _)| uses.iter().filter(|(other, _)| other == index).count() == 2)
            .map(|&(_, orientation)| orientation)
            .collect();
        assert_eq!(diagonal.len(), 2);
        assert_ne!(diagonal[0], diagonal[1]);
    }

    #[test]
    fn test_sliver_triangle_is_dropped() {
        let soup = triangle_soup(&[[p(0.0, 0.0, 0.0), p(1e-9, 0.0, 0.0), p(0.0, 1.0, 0.0)]]);
        let (shells, report) = connect_shells(vec![soup], 1e-6, false);
        assert!(shells.is_empty());
        assert_eq!(report.edges_collapsed, 1);
        assert_eq!(report.faces_dropped, 1);
    }

    #[test]
    fn test_duplicate_face_is_merged() {
        let tri = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let (shells, report) = connect_shells(
            vec![triangle_soup(&[tri]), triangle_soup(&[tri])],
            1e-6,
            false,
        );
        assert_eq!(shells.len(), 1);
        assert_eq!(shells[0].faces.len(), 1);
        assert_eq!(report.faces_merged, 1);
    }

    #[test]
    fn test_faces_on_same_edges_but_different_surfaces_are_kept() {
        // A straight edge and an arc between the same two points bound two
        // faces lying in different planes.
        let (a, b) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let arc = BSplineCurve::new(KnotVec::bezier_knot(2), vec![a, p(0.5, 1.0, 0.0), b]);
        let wire = vec![
            CompressedEdgeIndex {
                index: 0,
                orientation: true,
            },
            CompressedEdgeIndex {
                index: 1,
                orientation: false,
            },
        ];
        let shell = CompressedShell {
            vertices: vec![a, b],
            edges: vec![
                CompressedEdge {
                    vertices: (0, 1),
                    curve: Curve::Line(Line(a, b)),
                },
                CompressedEdge {
                    vertices: (0, 1),
                    curve: Curve::BSplineCurve(arc),
                },
            ],
            faces: vec![
                CompressedFace {
                    boundaries: vec![wire.clone()],
                    orientation: true,
                    surface: Surface::Plane(Plane::new(a, b, p(0.0, 1.0, 0.0))),
                },
                CompressedFace {
                    boundaries: vec![wire],
                    orientation: false,
                    surface: Surface::Plane(Plane::new(a, b, p(0.0, 1.0, 1.0))),
                },
            ],
        };

        let (shells, report) = connect_shells(vec![shell], 1e-6, false);
        assert_eq!(shells.len(), 1);
        assert_eq!(shells[0].faces.len(), 2);
        assert_eq!(shells[0].edges.len(), 2);
        assert_eq!(report.faces_merged, 0);
    }

    #[test]
    fn test_far_apart_triangles_stay_separate_shells() {
        let (shells, report) = connect_shells(
            vec![triangle_soup(&[
                [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
                [p(5.0, 0.0, 0.0), p(6.0, 0.0, 0.0), p(5.0, 1.0, 0.0)],
            ])],
            1e-6,
            false,
        );
        assert_eq!(shells.len(), 2);
        assert_eq!(report.shells, 2);
        assert!(shells.iter().all(|s| s.vertices.len() == 3 && s.edges.len() == 3));
    }
}
