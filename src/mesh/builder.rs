//! Mesh construction utilities.
//!
//! This module is the conversion boundary between flat vertex/face arrays and
//! the half-edge representation. Vertex row index becomes the mesh's vertex id
//! (0-based, contiguous, order-preserving), faces reference vertices by row
//! index, and no deduplication of coincident vertices is performed.
//!
//! All index references and face shapes are validated before any mesh element
//! is created, so a malformed input never produces a partially built mesh.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as [v0, v1, v2] indices
///
/// # Returns
/// A half-edge mesh, or an error if the input is invalid.
///
/// # Example
/// ```
/// use waffle::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh> {
    let polygons: Vec<&[usize]> = faces.iter().map(|f| f.as_slice()).collect();
    build_mesh(vertices, &polygons)
}

/// Build a half-edge mesh from vertices and polygonal faces of arbitrary arity.
///
/// Every face must have at least three distinct, in-range vertex indices.
/// This is the ragged-input counterpart of [`build_from_triangles`].
pub fn build_from_polygons(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<HalfEdgeMesh> {
    let polygons: Vec<&[usize]> = faces.iter().map(|f| f.as_slice()).collect();
    build_mesh(vertices, &polygons)
}

fn build_mesh(vertices: &[Point3<f64>], faces: &[&[usize]]) -> Result<HalfEdgeMesh> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // Validate all faces before creating any mesh element.
    for (fi, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(MeshError::MalformedFace {
                face: fi,
                arity: face.len(),
            });
        }
        for &vi in face.iter() {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        for (i, &vi) in face.iter().enumerate() {
            if face[i + 1..].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    for &pos in vertices {
        mesh.add_vertex(pos);
    }

    // Map from directed edge (v0, v1) to half-edge ID
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId> = HashMap::new();

    // First pass: create interior half-edges and faces
    for face in faces {
        let k = face.len();
        let base = mesh.num_halfedges();
        for _ in 0..k {
            mesh.halfedges.push(HalfEdge::new());
        }

        let face_id = FaceId::new(mesh.num_faces());
        mesh.faces.push(Face::new(HalfEdgeId::new(base)));

        for (i, &vi) in face.iter().enumerate() {
            let he_id = HalfEdgeId::new(base + i);
            {
                let he = mesh.halfedge_mut(he_id);
                he.origin = VertexId::new(vi);
                he.next = HalfEdgeId::new(base + (i + 1) % k);
                he.prev = HalfEdgeId::new(base + (i + k - 1) % k);
                he.face = face_id;
            }
            mesh.vertex_mut(VertexId::new(vi)).halfedge = he_id;

            let key = (vi, face[(i + 1) % k]);
            if edge_map.insert(key, he_id).is_some() {
                return Err(MeshError::NonManifold {
                    details: format!(
                        "directed edge ({}, {}) appears in more than one face",
                        key.0, key.1
                    ),
                });
            }
        }
    }

    // Second pass: link twins, creating boundary half-edges for unpaired edges
    let directed: Vec<((usize, usize), HalfEdgeId)> =
        edge_map.iter().map(|(&e, &he)| (e, he)).collect();
    for ((v0, v1), he) in directed {
        if let Some(&twin) = edge_map.get(&(v1, v0)) {
            mesh.halfedge_mut(he).twin = twin;
        } else {
            let boundary_he = HalfEdgeId::new(mesh.num_halfedges());
            mesh.halfedges.push(HalfEdge::new());

            mesh.halfedge_mut(he).twin = boundary_he;
            let bhe = mesh.halfedge_mut(boundary_he);
            bhe.origin = VertexId::new(v1);
            bhe.twin = he;
            // Face stays invalid (boundary)
        }
    }

    link_boundary_loops(&mut mesh);
    fix_boundary_vertex_halfedges(&mut mesh);

    Ok(mesh)
}

/// Link boundary half-edges into loops.
///
/// At a cusp vertex more than one boundary half-edge can originate from the
/// same vertex; candidates are consumed in id order so the linking is
/// deterministic for a given input.
fn link_boundary_loops(mesh: &mut HalfEdgeMesh) {
    let boundary_hes: Vec<HalfEdgeId> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let mut outgoing: HashMap<usize, Vec<HalfEdgeId>> = HashMap::new();
    for &he in &boundary_hes {
        outgoing.entry(mesh.origin(he).index()).or_default().push(he);
    }
    for candidates in outgoing.values_mut() {
        candidates.sort();
    }

    for &he in &boundary_hes {
        // The next boundary half-edge starts where this one ends
        let dest = mesh.dest(he).index();
        let next_he = outgoing.get(&dest).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&c| !mesh.halfedge(c).prev.is_valid())
        });
        if let Some(next_he) = next_he {
            mesh.halfedge_mut(he).next = next_he;
            mesh.halfedge_mut(next_he).prev = he;
        }
    }
}

/// Ensure boundary vertices store an outgoing boundary half-edge.
///
/// This anchors every rotation around a boundary vertex at its boundary edge,
/// which downstream boundary-ordering code relies on.
fn fix_boundary_vertex_halfedges(mesh: &mut HalfEdgeMesh) {
    for vid in mesh.vertex_ids().collect::<Vec<_>>() {
        if !mesh.vertex(vid).halfedge.is_valid() {
            continue;
        }

        let boundary_he = mesh
            .vertex_halfedges(vid)
            .find(|&he| mesh.is_boundary_halfedge(he));
        if let Some(he) = boundary_he {
            mesh.vertex_mut(vid).halfedge = he;
        }
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns a (vertices, faces) tuple. Vertex positions come back bit-for-bit
/// unchanged, in id order. The mesh must be a pure triangle mesh; calling this
/// on a mesh with larger faces is a caller error (guarded by a debug
/// assertion). Use [`to_polygons`] for mixed-arity meshes.
pub fn to_face_vertex(mesh: &HalfEdgeMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .map(|f| {
            debug_assert_eq!(mesh.face_arity(f), 3, "non-triangular face {:?}", f);
            let [v0, v1, v2] = mesh.face_triangle(f);
            [v0.index(), v1.index(), v2.index()]
        })
        .collect();

    (vertices, faces)
}

/// Convert a half-edge mesh to a ragged face-vertex representation.
///
/// Returns a (vertices, faces) tuple where each face is a variable-length
/// index list.
pub fn to_polygons(mesh: &HalfEdgeMesh) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<Vec<usize>> = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        (vertices, faces)
    }

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        // Two triangles sharing an edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());

        // All vertices should be on boundary
        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        // 6 interior half-edges + 4 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_roundtrip_exact() {
        let (vertices, faces) = two_triangles();
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);

        // Positions are reproduced bit-for-bit (no merging, no reordering)
        assert_eq!(vertices, out_verts);
        assert_eq!(faces, out_faces);
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]]; // Indices 1 and 2 are invalid

        let result = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let (vertices, _) = single_triangle();
        let faces = vec![[0, 0, 2]]; // Degenerate: v0 == v1

        let result = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_empty_face_list() {
        let (vertices, _) = single_triangle();
        let result = build_from_triangles(&vertices, &[]);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_inconsistent_winding_is_nonmanifold() {
        let (vertices, _) = two_triangles();
        // Both faces traverse the shared edge 0 -> 1 in the same direction
        let faces = vec![[0, 1, 2], [0, 1, 3]];

        let result = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::NonManifold { .. })));
    }

    #[test]
    fn test_build_from_polygons_mixed_arity() {
        // A quad glued to a triangle along edge (1, 2)
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![2, 1, 4]];

        let mesh = build_from_polygons(&vertices, &faces).unwrap();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.is_valid());

        let (out_verts, out_faces) = to_polygons(&mesh);
        assert_eq!(out_verts, vertices);
        assert_eq!(out_faces, faces);
    }

    #[test]
    fn test_malformed_polygon() {
        let (vertices, _) = single_triangle();
        let faces = vec![vec![0, 1]];

        let result = build_from_polygons(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::MalformedFace { face: 0, arity: 2 })
        ));
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mesh = build_from_triangles(&vertices, &faces).unwrap();
        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v));
        }
    }
}
