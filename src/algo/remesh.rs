//! Isotropic remeshing.
//!
//! Produces a mesh with uniform, near-equilateral triangles with edge lengths
//! close to a target length, by iterating the classic split / collapse / flip /
//! tangential-smooth cycle (Botsch & Kobbelt, 2004):
//!
//! 1. **Edge splitting**: split edges longer than 4/3 × target_length
//! 2. **Edge collapsing**: collapse edges shorter than 4/5 × target_length
//! 3. **Edge flipping**: flip edges to equalize vertex valence
//! 4. **Tangential smoothing**: smooth while preserving surface features
//!
//! A caller-supplied set of constrained vertices survives remeshing with
//! bit-for-bit identical positions: constrained vertices are never smoothed,
//! never removed by a collapse, and never projected.
//!
//! The whole pass runs on flat vertex/face arrays; the half-edge mesh is
//! rebuilt once at the end, after the face list has been compacted, so the
//! ids read back out are contiguous and gap-free.

use std::collections::{HashMap, HashSet};

use log::debug;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, VertexId};

use super::project::SurfaceIndex;

/// Options for isotropic remeshing.
#[derive(Debug, Clone)]
pub struct RemeshOptions {
    /// Target edge length for the remeshed surface. Must be positive.
    pub target_length: f64,

    /// Number of remeshing iterations.
    pub iterations: usize,

    /// Whether to preserve boundary edges (don't split/collapse/flip them).
    pub preserve_boundary: bool,

    /// Whether to project vertices back onto the input surface afterwards.
    /// Boundary and constrained vertices are never projected.
    pub project_to_input: bool,

    /// Vertices that must survive remeshing with their exact positions.
    pub constrained: Vec<VertexId>,

    /// Number of tangential smoothing iterations per remeshing iteration.
    pub smoothing_iterations: usize,

    /// Smoothing factor for tangential relaxation.
    pub smoothing_lambda: f64,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl RemeshOptions {
    /// Create options with the specified target edge length.
    pub fn with_target_length(target_length: f64) -> Self {
        Self {
            target_length,
            iterations: 5,
            preserve_boundary: true,
            project_to_input: false,
            constrained: Vec::new(),
            smoothing_iterations: 3,
            smoothing_lambda: 0.5,
            parallel: true,
        }
    }

    /// Set the number of remeshing iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set whether to preserve boundary edges.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set whether to project the result back onto the input surface.
    pub fn with_project_to_input(mut self, project: bool) -> Self {
        self.project_to_input = project;
        self
    }

    /// Set the vertices that must survive remeshing unmoved.
    pub fn with_constrained_vertices(mut self, constrained: Vec<VertexId>) -> Self {
        self.constrained = constrained;
        self
    }

    /// Set the number of smoothing iterations per remeshing iteration.
    pub fn with_smoothing_iterations(mut self, iterations: usize) -> Self {
        self.smoothing_iterations = iterations;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Performs isotropic remeshing on a triangle mesh, in place.
///
/// Input validation (positive target length, constrained ids in range) happens
/// before any geometry is touched. Zero iterations is a no-op. On success the
/// mesh is compacted: vertex and face ids are contiguous with no gaps.
pub fn isotropic_remesh(mesh: &mut HalfEdgeMesh, options: &RemeshOptions) -> Result<()> {
    if !(options.target_length > 0.0 && options.target_length.is_finite()) {
        return Err(MeshError::invalid_param(
            "target_length",
            options.target_length,
            "must be a positive finite number",
        ));
    }
    for &v in &options.constrained {
        if v.index() >= mesh.num_vertices() {
            return Err(MeshError::VertexOutOfRange {
                vertex: v.index(),
                num_vertices: mesh.num_vertices(),
            });
        }
    }

    if options.iterations == 0 {
        return Ok(());
    }

    let reference = if options.project_to_input {
        Some(SurfaceIndex::build(mesh)?)
    } else {
        None
    };

    let (mut vertices, mut faces) = to_face_vertex(mesh);
    let mut constrained = vec![false; vertices.len()];
    for &v in &options.constrained {
        constrained[v.index()] = true;
    }

    let high = options.target_length * 4.0 / 3.0;
    let low = options.target_length * 4.0 / 5.0;

    debug!(
        "isotropic remesh: target={}, {} iterations, {} vertices, {} faces",
        options.target_length,
        options.iterations,
        vertices.len(),
        faces.len()
    );

    for iteration in 0..options.iterations {
        split_long_edges(
            &mut vertices,
            &mut faces,
            &mut constrained,
            high,
            options.preserve_boundary,
        );
        collapse_short_edges(
            &mut vertices,
            &mut faces,
            &constrained,
            low,
            high,
            options.preserve_boundary,
        );
        flip_edges_for_valence(&vertices, &mut faces);
        for _ in 0..options.smoothing_iterations {
            tangential_smooth(
                &mut vertices,
                &faces,
                &constrained,
                options.smoothing_lambda,
                options.preserve_boundary,
                options.parallel,
            );
        }

        debug!(
            "remesh iteration {}/{}: {} vertices, {} faces",
            iteration + 1,
            options.iterations,
            vertices.len(),
            faces.len()
        );
    }

    // Compact before any id is read back out.
    let (vertices, faces, constrained) = compact(&vertices, &faces, &constrained);
    if faces.is_empty() {
        return Err(MeshError::OperationFailed {
            operation: "isotropic_remesh",
            message: "no faces survived remeshing".to_string(),
        });
    }

    *mesh = build_from_triangles(&vertices, &faces)?;

    if let Some(index) = reference {
        let movable: Vec<VertexId> = mesh
            .vertex_ids()
            .filter(|&v| mesh.is_interior_vertex(v) && !constrained[v.index()])
            .collect();
        for v in movable {
            let projected = index.closest_point(mesh.position(v));
            mesh.set_position(v, projected);
        }
    }

    Ok(())
}

/// Compute the average edge length of a mesh.
///
/// This is useful for determining an appropriate target edge length
/// for remeshing.
pub fn average_edge_length(mesh: &HalfEdgeMesh) -> f64 {
    let mut total_length = 0.0;
    let mut edge_count = 0;

    for he_id in mesh.halfedge_ids() {
        if he_id < mesh.twin(he_id) {
            total_length += mesh.edge_length(he_id);
            edge_count += 1;
        }
    }

    if edge_count == 0 {
        0.0
    } else {
        total_length / edge_count as f64
    }
}

// ============================================================================
// Connectivity over a face list
// ============================================================================

/// Edge and vertex relationships of a face list, precomputed so the remeshing
/// passes query in O(1) instead of rescanning all faces.
struct Connectivity {
    /// Map from canonical edge (min, max) to the face indices containing it.
    edge_faces: HashMap<(usize, usize), Vec<usize>>,
    /// Edges with only one adjacent face.
    boundary_edges: HashSet<(usize, usize)>,
    /// Per-vertex boundary flags.
    boundary_vertex: Vec<bool>,
    /// Per-vertex neighbor sets.
    neighbors: Vec<HashSet<usize>>,
}

fn canonical(v0: usize, v1: usize) -> (usize, usize) {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

impl Connectivity {
    fn build(faces: &[[usize; 3]], num_vertices: usize) -> Self {
        let mut edge_faces: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        let mut neighbors: Vec<HashSet<usize>> = vec![HashSet::new(); num_vertices];

        for (fi, face) in faces.iter().enumerate() {
            for i in 0..3 {
                let v0 = face[i];
                let v1 = face[(i + 1) % 3];
                edge_faces.entry(canonical(v0, v1)).or_default().push(fi);
                neighbors[v0].insert(v1);
                neighbors[v1].insert(v0);
            }
        }

        let boundary_edges: HashSet<(usize, usize)> = edge_faces
            .iter()
            .filter(|(_, fs)| fs.len() == 1)
            .map(|(&e, _)| e)
            .collect();

        let mut boundary_vertex = vec![false; num_vertices];
        for &(v0, v1) in &boundary_edges {
            boundary_vertex[v0] = true;
            boundary_vertex[v1] = true;
        }

        Self {
            edge_faces,
            boundary_edges,
            boundary_vertex,
            neighbors,
        }
    }

    #[inline]
    fn is_boundary_edge(&self, v0: usize, v1: usize) -> bool {
        self.boundary_edges.contains(&canonical(v0, v1))
    }

    #[inline]
    fn edge_exists(&self, v0: usize, v1: usize) -> bool {
        self.edge_faces.contains_key(&canonical(v0, v1))
    }

    /// Edges in deterministic (sorted) order, independent of hash state.
    fn sorted_edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self.edge_faces.keys().copied().collect();
        edges.sort_unstable();
        edges
    }
}

// ============================================================================
// Split
// ============================================================================

fn split_long_edges(
    vertices: &mut Vec<Point3<f64>>,
    faces: &mut Vec<[usize; 3]>,
    constrained: &mut Vec<bool>,
    threshold: f64,
    preserve_boundary: bool,
) {
    let threshold_sq = threshold * threshold;

    // Boundary edges are stable across interior splits, so one snapshot per
    // call suffices.
    let boundary = if preserve_boundary {
        Connectivity::build(faces, vertices.len()).boundary_edges
    } else {
        HashSet::new()
    };

    // Bounded rounds guard against runaway subdivision on degenerate geometry.
    for _ in 0..20 {
        let conn = Connectivity::build(faces, vertices.len());

        let mut long_edges: Vec<(usize, usize)> = conn
            .sorted_edges()
            .into_iter()
            .filter(|&(v0, v1)| {
                if boundary.contains(&(v0, v1)) {
                    return false;
                }
                (vertices[v1] - vertices[v0]).norm_squared() > threshold_sq
            })
            .collect();

        if long_edges.is_empty() {
            break;
        }

        // Longest first; edge ids break ties so the pass is deterministic.
        long_edges.sort_by(|&(a0, a1), &(b0, b1)| {
            let la = (vertices[a1] - vertices[a0]).norm_squared();
            let lb = (vertices[b1] - vertices[b0]).norm_squared();
            lb.partial_cmp(&la)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (a0, a1).cmp(&(b0, b1)))
        });

        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        for &(v0, v1) in &long_edges {
            let mid = Point3::from((vertices[v0].coords + vertices[v1].coords) * 0.5);
            midpoints.insert((v0, v1), vertices.len());
            vertices.push(mid);
            constrained.push(false);
        }

        let mut new_faces: Vec<[usize; 3]> = Vec::with_capacity(faces.len());
        for face in faces.iter() {
            subdivide_face(*face, &midpoints, &mut new_faces);
        }
        *faces = new_faces;
    }
}

/// Replace one face by its subdivision against the split-edge midpoints.
///
/// The face is rotated so the split pattern lands in a canonical position,
/// which collapses the eight midpoint configurations into four.
fn subdivide_face(
    face: [usize; 3],
    midpoints: &HashMap<(usize, usize), usize>,
    out: &mut Vec<[usize; 3]>,
) {
    let mid = |a: usize, b: usize| midpoints.get(&canonical(a, b)).copied();

    let mids = [
        mid(face[0], face[1]),
        mid(face[1], face[2]),
        mid(face[2], face[0]),
    ];
    let count = mids.iter().filter(|m| m.is_some()).count();

    // Rotation r puts the relevant split edges at positions (a,b) and (b,c).
    let rotate = |r: usize| {
        (
            face[r],
            face[(r + 1) % 3],
            face[(r + 2) % 3],
            mids[r],
            mids[(r + 1) % 3],
        )
    };

    match count {
        0 => out.push(face),
        1 => {
            let r = mids.iter().position(|m| m.is_some()).unwrap();
            let (a, b, c, mab, _) = rotate(r);
            let m = mab.unwrap();
            out.push([a, m, c]);
            out.push([m, b, c]);
        }
        2 => {
            let r = (0..3)
                .find(|&r| mids[r].is_some() && mids[(r + 1) % 3].is_some())
                .unwrap();
            let (a, b, c, mab, mbc) = rotate(r);
            let (mab, mbc) = (mab.unwrap(), mbc.unwrap());
            out.push([a, mab, c]);
            out.push([mab, b, mbc]);
            out.push([mab, mbc, c]);
        }
        _ => {
            let [a, b, c] = face;
            let (mab, mbc, mca) = (mids[0].unwrap(), mids[1].unwrap(), mids[2].unwrap());
            out.push([a, mab, mca]);
            out.push([mab, b, mbc]);
            out.push([mca, mbc, c]);
            out.push([mab, mbc, mca]);
        }
    }
}

// ============================================================================
// Collapse
// ============================================================================

fn collapse_short_edges(
    vertices: &mut [Point3<f64>],
    faces: &mut Vec<[usize; 3]>,
    constrained: &[bool],
    low: f64,
    high: f64,
    preserve_boundary: bool,
) {
    for _ in 0..30 {
        let conn = Connectivity::build(faces, vertices.len());

        let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
        for (v0, v1) in conn.sorted_edges() {
            let length = (vertices[v1] - vertices[v0]).norm();
            if length < low
                && collapse_target(vertices, &conn, constrained, v0, v1, high, preserve_boundary)
                    .is_some()
            {
                candidates.push((v0, v1, length));
            }
        }

        if candidates.is_empty() {
            break;
        }

        // Shortest first; ids break ties.
        candidates.sort_by(|a, b| {
            a.2.partial_cmp(&b.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
        });

        let mut used: HashSet<usize> = HashSet::new();
        let mut collapsed = 0usize;
        for (v0, v1, _) in candidates {
            if used.contains(&v0) || used.contains(&v1) {
                continue;
            }
            let (keep, gone, position) = match collapse_target(
                vertices,
                &conn,
                constrained,
                v0,
                v1,
                high,
                preserve_boundary,
            ) {
                Some(t) => t,
                None => continue,
            };
            used.insert(v0);
            used.insert(v1);

            vertices[keep] = position;
            for face in faces.iter_mut() {
                for v in face.iter_mut() {
                    if *v == gone {
                        *v = keep;
                    }
                }
            }
            collapsed += 1;
        }

        faces.retain(|f| f[0] != f[1] && f[1] != f[2] && f[0] != f[2]);

        if collapsed == 0 {
            break;
        }
    }
}

/// Decide whether the edge (v0, v1) may collapse, and how.
///
/// Returns `(keep, gone, new_position)`. Protected vertices (constrained, or
/// boundary while boundaries are preserved) absorb the collapse and keep their
/// exact position; an edge between two protected vertices never collapses.
fn collapse_target(
    vertices: &[Point3<f64>],
    conn: &Connectivity,
    constrained: &[bool],
    v0: usize,
    v1: usize,
    high: f64,
    preserve_boundary: bool,
) -> Option<(usize, usize, Point3<f64>)> {
    let protected = |v: usize| constrained[v] || (preserve_boundary && conn.boundary_vertex[v]);

    if preserve_boundary && conn.is_boundary_edge(v0, v1) {
        return None;
    }
    if protected(v0) && protected(v1) {
        return None;
    }

    let (keep, gone) = if protected(v1) { (v1, v0) } else { (v0, v1) };
    let position = if protected(keep) {
        vertices[keep]
    } else {
        Point3::from((vertices[v0].coords + vertices[v1].coords) * 0.5)
    };

    // Link condition: an interior edge must have exactly two common neighbors,
    // or the collapse pinches the mesh. Two valence-3 endpoints would leave a
    // duplicated face pair (a tetrahedron collapses into a two-face pillow).
    if !conn.is_boundary_edge(v0, v1) {
        let common = conn.neighbors[v0].intersection(&conn.neighbors[v1]).count();
        if common != 2 {
            return None;
        }
        if conn.neighbors[v0].len() == 3 && conn.neighbors[v1].len() == 3 {
            return None;
        }
    }

    // The collapse must not create edges longer than the upper threshold.
    let high_sq = high * high;
    for &n in conn.neighbors[v0].iter().chain(conn.neighbors[v1].iter()) {
        if n == v0 || n == v1 {
            continue;
        }
        if (vertices[n] - position).norm_squared() > high_sq {
            return None;
        }
    }

    Some((keep, gone, position))
}

// ============================================================================
// Flip
// ============================================================================

fn flip_edges_for_valence(vertices: &[Point3<f64>], faces: &mut Vec<[usize; 3]>) {
    let mut failed: HashSet<(usize, usize)> = HashSet::new();

    for _ in 0..50 {
        let conn = Connectivity::build(faces, vertices.len());

        let candidates: Vec<(usize, usize)> = conn
            .sorted_edges()
            .into_iter()
            .filter(|&(v0, v1)| {
                !failed.contains(&(v0, v1)) && should_flip(vertices, faces, &conn, v0, v1)
            })
            .collect();

        // Independent set: a flip touches its two endpoints and the two
        // opposite vertices; none may be shared within a batch.
        let mut used: HashSet<usize> = HashSet::new();
        let mut batch: Vec<(usize, usize)> = Vec::new();
        for (v0, v1) in candidates {
            let opposite = match opposite_vertices(faces, &conn, v0, v1) {
                Some(o) => o,
                None => continue,
            };
            let involved = [v0, v1, opposite.0, opposite.1];
            if involved.iter().any(|v| used.contains(v)) {
                continue;
            }
            used.extend(involved);
            batch.push((v0, v1));
        }

        if batch.is_empty() {
            break;
        }

        let saved = faces.clone();
        for &(v0, v1) in &batch {
            flip_edge(faces, v0, v1);
        }

        if !validate_face_list(vertices, faces) {
            // Revert and retry one flip at a time, keeping the valid ones.
            *faces = saved;
            for (v0, v1) in batch {
                let snapshot = faces.clone();
                flip_edge(faces, v0, v1);
                if !validate_face_list(vertices, faces) {
                    *faces = snapshot;
                    failed.insert(canonical(v0, v1));
                }
            }
        }
    }
}

fn opposite_vertices(
    faces: &[[usize; 3]],
    conn: &Connectivity,
    v0: usize,
    v1: usize,
) -> Option<(usize, usize)> {
    let adjacent = conn.edge_faces.get(&canonical(v0, v1))?;
    if adjacent.len() != 2 {
        return None;
    }

    let mut opposite = adjacent
        .iter()
        .flat_map(|&fi| faces[fi].iter().copied().filter(|&v| v != v0 && v != v1));
    let a = opposite.next()?;
    let b = opposite.next()?;
    Some((a, b))
}

fn should_flip(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
    conn: &Connectivity,
    v0: usize,
    v1: usize,
) -> bool {
    let (v2, v3) = match opposite_vertices(faces, conn, v0, v1) {
        Some(o) => o,
        None => return false,
    };

    // The flipped edge must not already exist elsewhere in the mesh.
    if conn.edge_exists(v2, v3) {
        return false;
    }

    let target = |v: usize| if conn.boundary_vertex[v] { 4i32 } else { 6i32 };
    let valence = |v: usize| conn.neighbors[v].len() as i32;

    let deviation_before = (valence(v0) - target(v0)).abs()
        + (valence(v1) - target(v1)).abs()
        + (valence(v2) - target(v2)).abs()
        + (valence(v3) - target(v3)).abs();

    // After the flip v0/v1 each lose a neighbor, v2/v3 each gain one.
    let deviation_after = (valence(v0) - 1 - target(v0)).abs()
        + (valence(v1) - 1 - target(v1)).abs()
        + (valence(v2) + 1 - target(v2)).abs()
        + (valence(v3) + 1 - target(v3)).abs();

    if deviation_after >= deviation_before {
        return false;
    }

    is_convex_quad(&vertices[v0], &vertices[v2], &vertices[v1], &vertices[v3])
}

fn is_convex_quad(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
) -> bool {
    let v01 = p1 - p0;
    let v12 = p2 - p1;
    let v23 = p3 - p2;
    let v30 = p0 - p3;

    let n0 = v01.cross(&(-v30));
    let n1 = v12.cross(&(-v01));
    let n2 = v23.cross(&(-v12));
    let n3 = v30.cross(&(-v23));

    n0.dot(&n1) > 0.0 && n1.dot(&n2) > 0.0 && n2.dot(&n3) > 0.0
}

/// Flip an edge in the face list. Returns false if the edge is not interior.
fn flip_edge(faces: &mut [[usize; 3]], v0: usize, v1: usize) -> bool {
    let mut face_info: Vec<(usize, usize)> = Vec::new();

    for (idx, face) in faces.iter().enumerate() {
        for i in 0..3 {
            let a = face[i];
            let b = face[(i + 1) % 3];
            if (a == v0 && b == v1) || (a == v1 && b == v0) {
                face_info.push((idx, i));
                break;
            }
        }
        if face_info.len() == 2 {
            break;
        }
    }

    if face_info.len() != 2 {
        return false;
    }

    let (idx0, edge_idx0) = face_info[0];
    let (idx1, edge_idx1) = face_info[1];

    let face0 = faces[idx0];
    let face1 = faces[idx1];

    let opp0 = face0[(edge_idx0 + 2) % 3];
    let opp1 = face1[(edge_idx1 + 2) % 3];

    if face0[edge_idx0] == v0 {
        faces[idx0] = [opp0, opp1, v0];
        faces[idx1] = [opp1, opp0, v1];
    } else {
        faces[idx0] = [opp0, opp1, v1];
        faces[idx1] = [opp1, opp0, v0];
    }

    true
}

// ============================================================================
// Smoothing
// ============================================================================

fn tangential_smooth(
    vertices: &mut Vec<Point3<f64>>,
    faces: &[[usize; 3]],
    constrained: &[bool],
    lambda: f64,
    preserve_boundary: bool,
    parallel: bool,
) {
    let conn = Connectivity::build(faces, vertices.len());
    let normals = vertex_normals(vertices, faces);

    let relax = |v: usize| -> Point3<f64> {
        let pos = vertices[v];
        if constrained[v] || (preserve_boundary && conn.boundary_vertex[v]) {
            return pos;
        }
        let neighbors = &conn.neighbors[v];
        if neighbors.is_empty() {
            return pos;
        }

        let mut centroid = Vector3::zeros();
        for &n in neighbors {
            centroid += vertices[n].coords;
        }
        centroid /= neighbors.len() as f64;

        let displacement = centroid - pos.coords;
        let normal = &normals[v];
        let tangential = displacement - normal.dot(&displacement) * normal;

        pos + lambda * tangential
    };

    let relaxed: Vec<Point3<f64>> = if parallel {
        (0..vertices.len()).into_par_iter().map(relax).collect()
    } else {
        (0..vertices.len()).map(relax).collect()
    };

    *vertices = relaxed;
}

fn vertex_normals(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Vec<Vector3<f64>> {
    let mut normals = vec![Vector3::zeros(); vertices.len()];

    for face in faces {
        let p0 = &vertices[face[0]];
        let p1 = &vertices[face[1]];
        let p2 = &vertices[face[2]];
        let face_normal = (p1 - p0).cross(&(p2 - p0)); // area-weighted

        normals[face[0]] += face_normal;
        normals[face[1]] += face_normal;
        normals[face[2]] += face_normal;
    }

    for n in &mut normals {
        let len = n.norm();
        if len > 1e-10 {
            *n /= len;
        }
    }

    normals
}

// ============================================================================
// Compaction and validation
// ============================================================================

/// Drop duplicate faces and unused vertices, and reindex everything so the
/// surviving ids are contiguous. The constrained flags are remapped alongside.
fn compact(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
    constrained: &[bool],
) -> (Vec<Point3<f64>>, Vec<[usize; 3]>, Vec<bool>) {
    let mut unique_faces: Vec<[usize; 3]> = Vec::with_capacity(faces.len());
    let mut seen: HashSet<[usize; 3]> = HashSet::new();

    for &face in faces {
        // Rotate so the smallest index leads; preserves winding, catches
        // duplicates that differ only by starting corner.
        let r = (0..3).min_by_key(|&i| face[i]).unwrap();
        let normalized = [face[r], face[(r + 1) % 3], face[(r + 2) % 3]];
        if seen.insert(normalized) {
            unique_faces.push(face);
        }
    }

    let mut old_to_new: Vec<Option<usize>> = vec![None; vertices.len()];
    let mut new_vertices: Vec<Point3<f64>> = Vec::new();
    let mut new_constrained: Vec<bool> = Vec::new();

    for face in &unique_faces {
        for &v in face {
            if old_to_new[v].is_none() {
                old_to_new[v] = Some(new_vertices.len());
                new_vertices.push(vertices[v]);
                new_constrained.push(constrained[v]);
            }
        }
    }

    let new_faces: Vec<[usize; 3]> = unique_faces
        .iter()
        .map(|f| {
            [
                old_to_new[f[0]].unwrap(),
                old_to_new[f[1]].unwrap(),
                old_to_new[f[2]].unwrap(),
            ]
        })
        .collect();

    (new_vertices, new_faces, new_constrained)
}

/// Validate a face list for manifold properties: all indices in range, no edge
/// shared by more than two faces, no duplicated directed edge.
fn validate_face_list(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> bool {
    let mut undirected: HashMap<(usize, usize), usize> = HashMap::new();
    let mut directed: HashSet<(usize, usize)> = HashSet::new();

    for face in faces {
        for i in 0..3 {
            let v0 = face[i];
            let v1 = face[(i + 1) % 3];
            if v0 >= vertices.len() || v1 >= vertices.len() {
                return false;
            }
            if !directed.insert((v0, v1)) {
                return false;
            }
            *undirected.entry(canonical(v0, v1)).or_insert(0) += 1;
        }
    }

    undirected.values().all(|&c| c <= 2)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    pub(crate) fn grid_mesh(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_average_edge_length() {
        let mesh = tetrahedron();
        let avg = average_edge_length(&mesh);
        assert!(avg > 0.0);
        assert!(avg < 2.0);
    }

    #[test]
    fn test_invalid_target_length() {
        let mut mesh = tetrahedron();
        let options = RemeshOptions::with_target_length(0.0);
        let result = isotropic_remesh(&mut mesh, &options);
        assert!(matches!(result, Err(MeshError::InvalidParameter { .. })));
    }

    #[test]
    fn test_constrained_vertex_out_of_range() {
        let mut mesh = tetrahedron();
        let options = RemeshOptions::with_target_length(0.5)
            .with_constrained_vertices(vec![VertexId::new(99)]);
        let result = isotropic_remesh(&mut mesh, &options);
        assert!(matches!(result, Err(MeshError::VertexOutOfRange { .. })));
    }

    #[test]
    fn test_zero_iterations_no_change() {
        let mut mesh = tetrahedron();
        let original: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
        let original_faces = mesh.num_faces();

        let options = RemeshOptions::with_target_length(0.5).with_iterations(0);
        isotropic_remesh(&mut mesh, &options).unwrap();

        assert_eq!(mesh.num_faces(), original_faces);
        for (v, orig) in mesh.vertex_ids().zip(original.iter()) {
            assert_eq!(mesh.position(v), orig);
        }
    }

    #[test]
    fn test_remesh_preserves_euler_characteristic() {
        let mut mesh = tetrahedron();
        let euler = |m: &HalfEdgeMesh| {
            m.num_vertices() as i64 - (m.num_halfedges() / 2) as i64 + m.num_faces() as i64
        };
        let original = euler(&mesh);

        let options = RemeshOptions::with_target_length(0.5)
            .with_iterations(2)
            .sequential();
        isotropic_remesh(&mut mesh, &options).unwrap();

        assert!(mesh.is_valid());
        assert_eq!(euler(&mesh), original);
    }

    #[test]
    fn test_remesh_approaches_target_length() {
        let mut mesh = grid_mesh(3);
        let original_avg = average_edge_length(&mesh);

        let target = original_avg * 0.5;
        let options = RemeshOptions::with_target_length(target)
            .with_iterations(3)
            .sequential();
        isotropic_remesh(&mut mesh, &options).unwrap();

        let new_avg = average_edge_length(&mesh);
        assert!((new_avg - target).abs() < (original_avg - target).abs());
    }

    #[test]
    fn test_constrained_positions_survive_exactly() {
        let mut mesh = grid_mesh(4);
        let constrained_id = VertexId::new(12); // interior vertex of the 4x4 grid
        let original = *mesh.position(constrained_id);

        let options = RemeshOptions::with_target_length(0.6)
            .with_iterations(3)
            .with_constrained_vertices(vec![constrained_id])
            .sequential();
        isotropic_remesh(&mut mesh, &options).unwrap();

        // The constrained position must survive bit-for-bit at some id.
        let found = mesh.vertex_ids().any(|v| *mesh.position(v) == original);
        assert!(found, "constrained vertex position lost");
    }

    #[test]
    fn test_compaction_leaves_no_gaps() {
        let mut mesh = grid_mesh(4);
        let options = RemeshOptions::with_target_length(2.5)
            .with_iterations(2)
            .sequential();
        isotropic_remesh(&mut mesh, &options).unwrap();

        let (vertices, faces) = to_face_vertex(&mesh);
        let mut referenced = vec![false; vertices.len()];
        for f in &faces {
            for &v in f {
                assert!(v < vertices.len());
                referenced[v] = true;
            }
        }
        assert!(referenced.iter().all(|&r| r), "unused vertex left behind");
    }

    #[test]
    fn test_boundary_positions_survive() {
        let mut mesh = grid_mesh(3);
        let boundary_before: HashSet<_> = mesh
            .vertex_ids()
            .filter(|&v| mesh.is_boundary_vertex(v))
            .map(|v| {
                let p = mesh.position(v);
                (p.x.to_bits(), p.y.to_bits(), p.z.to_bits())
            })
            .collect();

        let options = RemeshOptions::with_target_length(1.2)
            .with_iterations(2)
            .sequential();
        isotropic_remesh(&mut mesh, &options).unwrap();

        // Boundary vertices are never smoothed or collapsed away while
        // boundaries are preserved, so every original boundary position must
        // still exist somewhere in the result.
        for key in &boundary_before {
            let found = mesh.vertex_ids().any(|v| {
                let p = mesh.position(v);
                (p.x.to_bits(), p.y.to_bits(), p.z.to_bits()) == *key
            });
            assert!(found, "boundary vertex moved or vanished");
        }
    }

    #[test]
    fn test_flip_edge_two_triangles() {
        let mut faces = vec![[0, 1, 2], [1, 0, 3]];
        assert!(flip_edge(&mut faces, 0, 1));

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for face in &faces {
            for i in 0..3 {
                seen.insert(canonical(face[i], face[(i + 1) % 3]));
            }
        }
        assert!(!seen.contains(&(0, 1)));
        assert!(seen.contains(&(2, 3)));
    }

    #[test]
    fn test_subdivide_face_all_edges() {
        let mut midpoints = HashMap::new();
        midpoints.insert((0, 1), 3);
        midpoints.insert((1, 2), 4);
        midpoints.insert((0, 2), 5);

        let mut out = Vec::new();
        subdivide_face([0, 1, 2], &midpoints, &mut out);
        assert_eq!(out.len(), 4);
        assert!(out.contains(&[3, 4, 5]));
    }

    #[test]
    fn test_compact_drops_unused_vertices() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0), // unused
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 2, 3]];
        let constrained = vec![false, true, false, false];

        let (v, f, c) = compact(&vertices, &faces, &constrained);
        assert_eq!(v.len(), 3);
        assert_eq!(f, vec![[0, 1, 2]]);
        assert!(c.iter().all(|&flag| !flag));
    }
}
