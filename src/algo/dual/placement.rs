//! Dual-vertex placement.
//!
//! Every primal face produces exactly one dual vertex. Three placement
//! policies are supported:
//!
//! - **Centroid**: the arithmetic mean of the three corners. Always defined.
//! - **Circumcenter**: the center of the circumscribed circle. Only sensible
//!   for acute, near-equilateral triangles; for a degenerate (collinear)
//!   triangle the face falls back to its centroid.
//! - **Area-weighted centroid**: corners weighted by per-vertex weights
//!   `w[v] = sqrt(Σ area(f))` over the faces incident to v, approximating a
//!   mass-proportional dual. This is the default for the remesh-then-dualize
//!   pipeline.
//!
//! Degenerate faces never poison the output: whenever a weight sum or a
//! circumcenter denominator underflows, the affected face falls back to the
//! plain centroid and a warning is logged. Callers who need strict behavior
//! should reject zero-area faces up front.

use log::warn;
use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh};

/// How to position the dual vertex of a primal face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementPolicy {
    /// Arithmetic mean of the face corners.
    Centroid,
    /// Circumcenter of the face. Unstable for obtuse or degenerate faces.
    Circumcenter,
    /// Corners weighted by the square root of summed incident face areas.
    #[default]
    AreaWeighted,
}

/// Compute the area of every face, indexed by face id.
pub fn face_areas(mesh: &HalfEdgeMesh) -> Vec<f64> {
    mesh.face_ids().map(|f| mesh.face_area(f)).collect()
}

/// Compute per-vertex weights as the square root of the summed areas of the
/// incident faces, indexed by vertex id.
pub fn vertex_weights(mesh: &HalfEdgeMesh, areas: &[f64]) -> Vec<f64> {
    let mut summed = vec![0.0f64; mesh.num_vertices()];
    for f in mesh.face_ids() {
        for v in mesh.face_vertices(f) {
            summed[v.index()] += areas[f.index()];
        }
    }
    summed.into_iter().map(f64::sqrt).collect()
}

/// Compute one dual-vertex position per primal face, in face-id order.
///
/// `weights_override` replaces the computed vertex weights for the
/// [`PlacementPolicy::AreaWeighted`] policy; its length must equal the vertex
/// count. The override is validated before any geometry is touched.
pub fn place_dual_vertices(
    mesh: &HalfEdgeMesh,
    policy: PlacementPolicy,
    weights_override: Option<&[f64]>,
) -> Result<Vec<Point3<f64>>> {
    if let Some(weights) = weights_override {
        if weights.len() != mesh.num_vertices() {
            return Err(MeshError::LengthMismatch {
                name: "vertex_weights",
                expected: mesh.num_vertices(),
                actual: weights.len(),
            });
        }
    }

    let positions = match policy {
        PlacementPolicy::Centroid => mesh.face_ids().map(|f| mesh.face_centroid(f)).collect(),
        PlacementPolicy::Circumcenter => mesh
            .face_ids()
            .map(|f| {
                circumcenter(&mesh.face_positions(f)).unwrap_or_else(|| {
                    warn!("face {:?} is degenerate, circumcenter fell back to centroid", f);
                    mesh.face_centroid(f)
                })
            })
            .collect(),
        PlacementPolicy::AreaWeighted => {
            let computed;
            let weights = match weights_override {
                Some(w) => w,
                None => {
                    let areas = face_areas(mesh);
                    computed = vertex_weights(mesh, &areas);
                    computed.as_slice()
                }
            };
            mesh.face_ids()
                .map(|f| weighted_centroid(mesh, f, weights))
                .collect()
        }
    };

    Ok(positions)
}

fn weighted_centroid(mesh: &HalfEdgeMesh, f: FaceId, weights: &[f64]) -> Point3<f64> {
    let [v0, v1, v2] = mesh.face_triangle(f);
    let [p0, p1, p2] = mesh.face_positions(f);
    let (w0, w1, w2) = (
        weights[v0.index()],
        weights[v1.index()],
        weights[v2.index()],
    );

    let total = w0 + w1 + w2;
    if total < 1e-12 {
        warn!("face {:?} has zero weight sum, fell back to centroid", f);
        return mesh.face_centroid(f);
    }

    Point3::from((p0.coords * w0 + p1.coords * w1 + p2.coords * w2) / total)
}

/// Circumcenter of a triangle, or `None` when the triangle is (near)
/// degenerate.
fn circumcenter(points: &[Point3<f64>; 3]) -> Option<Point3<f64>> {
    let [a, b, c] = points;
    let ab = b - a;
    let ac = c - a;
    let n = ab.cross(&ac);

    let denominator = 2.0 * n.norm_squared();
    if denominator < 1e-20 {
        return None;
    }

    // Standard barycentric-free form: offset from `a` along the bisector
    // plane intersection.
    let offset =
        (n.cross(&ab) * ac.norm_squared() + ac.cross(&n) * ab.norm_squared()) / denominator;
    Some(a + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use approx::relative_eq;
    use nalgebra::Point3;

    fn right_triangle_mesh() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_centroid_placement() {
        let mesh = right_triangle_mesh();
        let duals = place_dual_vertices(&mesh, PlacementPolicy::Centroid, None).unwrap();
        assert_eq!(duals.len(), 1);
        assert!(relative_eq!(
            duals[0],
            Point3::new(2.0 / 3.0, 2.0 / 3.0, 0.0),
            epsilon = 1e-12
        ));
    }

    #[test]
    fn test_circumcenter_of_right_triangle() {
        // The circumcenter of a right triangle is the hypotenuse midpoint.
        let mesh = right_triangle_mesh();
        let duals = place_dual_vertices(&mesh, PlacementPolicy::Circumcenter, None).unwrap();
        assert!(relative_eq!(
            duals[0],
            Point3::new(1.0, 1.0, 0.0),
            epsilon = 1e-12
        ));
    }

    #[test]
    fn test_circumcenter_is_equidistant() {
        let vertices = vec![
            Point3::new(0.1, 0.2, 0.3),
            Point3::new(1.3, 0.1, -0.2),
            Point3::new(0.4, 1.1, 0.5),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let duals = place_dual_vertices(&mesh, PlacementPolicy::Circumcenter, None).unwrap();

        let d0 = (duals[0] - vertices[0]).norm();
        let d1 = (duals[0] - vertices[1]).norm();
        let d2 = (duals[0] - vertices[2]).norm();
        assert!((d0 - d1).abs() < 1e-10);
        assert!((d1 - d2).abs() < 1e-10);
    }

    #[test]
    fn test_one_dual_vertex_per_face() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        for policy in [
            PlacementPolicy::Centroid,
            PlacementPolicy::Circumcenter,
            PlacementPolicy::AreaWeighted,
        ] {
            let duals = place_dual_vertices(&mesh, policy, None).unwrap();
            assert_eq!(duals.len(), mesh.num_faces());
        }
    }

    #[test]
    fn test_equal_weights_reduce_to_centroid() {
        let mesh = right_triangle_mesh();
        let uniform = vec![1.0; mesh.num_vertices()];

        let weighted =
            place_dual_vertices(&mesh, PlacementPolicy::AreaWeighted, Some(&uniform)).unwrap();
        let centroid = place_dual_vertices(&mesh, PlacementPolicy::Centroid, None).unwrap();

        assert!((weighted[0] - centroid[0]).norm() < 1e-12);
    }

    #[test]
    fn test_weights_length_mismatch_fails_fast() {
        let mesh = right_triangle_mesh();
        let too_short = vec![1.0; 2];

        let result = place_dual_vertices(&mesh, PlacementPolicy::AreaWeighted, Some(&too_short));
        assert!(matches!(
            result,
            Err(MeshError::LengthMismatch {
                name: "vertex_weights",
                expected: 3,
                actual: 2,
            })
        ));
    }

    #[test]
    fn test_vertex_weights_formula() {
        // Two unit right triangles sharing an edge; each face has area 0.5.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        let areas = face_areas(&mesh);
        assert!(areas.iter().all(|&a| (a - 0.5).abs() < 1e-12));

        let weights = vertex_weights(&mesh, &areas);
        // Vertices 0 and 2 touch both faces, 1 and 3 only one.
        assert!((weights[0] - 1.0f64.sqrt()).abs() < 1e-12);
        assert!((weights[1] - 0.5f64.sqrt()).abs() < 1e-12);
        assert!((weights[2] - 1.0f64.sqrt()).abs() < 1e-12);
        assert!((weights[3] - 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_face_falls_back_to_centroid() {
        // Collinear corners: circumcenter is undefined.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        let duals = place_dual_vertices(&mesh, PlacementPolicy::Circumcenter, None).unwrap();
        assert!(relative_eq!(
            duals[0],
            Point3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        ));

        // Zero-area faces also mean zero vertex weights; the weighted policy
        // must fall back rather than divide by zero.
        let weighted = place_dual_vertices(&mesh, PlacementPolicy::AreaWeighted, None).unwrap();
        assert!(weighted[0].x.is_finite());
    }
}
