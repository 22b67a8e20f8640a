//! Boundary polyline assembly.
//!
//! Interior primal vertices become dual faces; boundary vertices instead
//! produce a polyline strip that closes the dual mesh along the primal
//! boundary: the midpoints of the vertex's two boundary edges, linked through
//! the ordered dual vertices of its incident faces, optionally passing through
//! the boundary vertex itself.
//!
//! # Ordering convention
//!
//! The face ordering is the half-edge rotation around the vertex, anchored at
//! the boundary half-edge the vertex stores. The strip therefore always runs
//! midpoint(starting boundary edge), then the incident-face duals, then
//! midpoint(other boundary edge). Both the ordering and the retain/discard
//! decisions are pure functions of the mesh, the threshold and the fixed
//! points; no unordered-container iteration is involved.
//!
//! # Retention rule
//!
//! With a positive `angle_threshold`, the vertex is kept in its strip when the
//! boundary's turning angle at the vertex exceeds the threshold: sharp corners
//! survive into the dual, shallow ones are smoothed over. A vertex lying
//! within squared distance `1e-6` of any caller-supplied fixed point is always
//! kept.

use std::collections::HashMap;

use log::debug;
use nalgebra::Point3;

use crate::mesh::{HalfEdgeId, HalfEdgeMesh, VertexId};

/// Squared-distance tolerance for matching a boundary vertex against the
/// caller-supplied fixed points.
const FIXED_POINT_TOLERANCE_SQ: f64 = 1e-6;

/// Build one polyline strip per usable boundary vertex.
///
/// Midpoint and retained-vertex dual vertices are appended to
/// `dual_vertices`, which already holds one entry per primal face. Midpoints
/// are shared between the two boundary vertices of their edge, keyed by the
/// canonical (min, max) vertex-id pair. Returns the strips as variable-arity
/// index lists into `dual_vertices`; only strips with at least three entries
/// are emitted.
///
/// Boundary vertices whose incident boundary edge count is not exactly two
/// (cusps, non-manifold junctions) are skipped, not errors.
pub fn assemble_boundary_strips(
    mesh: &HalfEdgeMesh,
    dual_vertices: &mut Vec<Point3<f64>>,
    angle_threshold: f64,
    fixed_points: &[Point3<f64>],
) -> Vec<Vec<usize>> {
    let mut strips: Vec<Vec<usize>> = Vec::new();
    let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
    let mut skipped = 0usize;

    for v in mesh.vertex_ids() {
        if !mesh.vertex(v).halfedge.is_valid() || !mesh.is_boundary_vertex(v) {
            continue;
        }

        // The rotation starts at the stored boundary half-edge, so the first
        // entry is the starting boundary edge and the second the closing one.
        let boundary = mesh.boundary_edges_at(v);
        if boundary.len() != 2 {
            skipped += 1;
            continue;
        }
        let (start_edge, end_edge) = (boundary[0], boundary[1]);

        let fan: Vec<usize> = mesh.vertex_faces(v).map(|f| f.index()).collect();

        let mut midpoint_id = |he| {
            let key = canonical_edge(mesh, he);
            *midpoints.entry(key).or_insert_with(|| {
                dual_vertices.push(mesh.edge_midpoint(he));
                dual_vertices.len() - 1
            })
        };
        let mid_start = midpoint_id(start_edge);
        let mid_end = midpoint_id(end_edge);

        let mut strip = Vec::with_capacity(fan.len() + 3);
        if retain_vertex(mesh, v, start_edge, end_edge, angle_threshold, fixed_points) {
            dual_vertices.push(*mesh.position(v));
            strip.push(dual_vertices.len() - 1);
        }
        strip.push(mid_start);
        strip.extend(fan);
        strip.push(mid_end);

        if strip.len() >= 3 {
            strips.push(strip);
        }
    }

    if skipped > 0 {
        debug!("boundary assembly skipped {} non-manifold boundary vertices", skipped);
    }

    strips
}

/// Canonical (min, max) vertex-id pair of a half-edge's undirected edge.
fn canonical_edge(mesh: &HalfEdgeMesh, he: HalfEdgeId) -> (usize, usize) {
    let a = mesh.origin(he).index();
    let b = mesh.dest(he).index();
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Decide whether the boundary vertex itself survives into its strip.
fn retain_vertex(
    mesh: &HalfEdgeMesh,
    v: VertexId,
    start_edge: HalfEdgeId,
    end_edge: HalfEdgeId,
    angle_threshold: f64,
    fixed_points: &[Point3<f64>],
) -> bool {
    let position = mesh.position(v);
    if fixed_points
        .iter()
        .any(|p| (p - position).norm_squared() <= FIXED_POINT_TOLERANCE_SQ)
    {
        return true;
    }

    if angle_threshold <= 0.0 {
        return false;
    }

    // Both boundary edge directions point away from v. A straight boundary
    // puts them at angle pi (turning angle 0); a hairpin puts them near angle
    // 0 (turning angle pi).
    let to_start = mesh.edge_vector(start_edge);
    let to_end = mesh.edge_vector(end_edge);

    let lengths = to_start.norm() * to_end.norm();
    if lengths < 1e-24 {
        return false;
    }

    let cos = (to_start.dot(&to_end) / lengths).clamp(-1.0, 1.0);
    let turn = std::f64::consts::PI - cos.acos();

    turn > angle_threshold
}
