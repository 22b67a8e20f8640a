//! Projection of points onto a reference surface.
//!
//! This module wraps a triangle-soup spatial index (an AABB-backed
//! bounding-volume hierarchy) built once over a reference mesh, and answers
//! closest-point and ray queries against it. It is used to keep remeshed and
//! dual vertices on the original surface.
//!
//! # Query policy
//!
//! Ray casting along a supplied direction gives better results than
//! closest-point for quasi-planar offset surfaces, but only closest-point is
//! guaranteed to return a result. [`SurfaceIndex::project`] therefore applies
//! the fallback chain: ray along `dir`, then along `-dir`, then closest point.
//!
//! Boundary vertices are never projected by
//! [`SurfaceIndex::project_interior_vertices`]: moving them would collapse
//! open boundaries onto an arbitrary nearby surface patch.

use nalgebra::{Point3, Vector3};
use parry3d_f64::math::Isometry;
use parry3d_f64::query::{PointQuery, Ray, RayCast};
use parry3d_f64::shape::TriMesh;

use crate::error::{MeshError, Result};
use crate::mesh::{to_face_vertex, HalfEdgeMesh};

/// A read-only spatial index over the triangles of a reference mesh.
///
/// Built once per call, queried many times, dropped at call end.
pub struct SurfaceIndex {
    trimesh: TriMesh,
}

impl SurfaceIndex {
    /// Build an index over the triangles of a half-edge mesh.
    pub fn build(mesh: &HalfEdgeMesh) -> Result<Self> {
        let (vertices, faces) = to_face_vertex(mesh);
        Self::from_arrays(&vertices, &faces)
    }

    /// Build an index from a flat vertex/face representation.
    pub fn from_arrays(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<Self> {
        if faces.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        for (fi, face) in faces.iter().enumerate() {
            for &vi in face {
                if vi >= vertices.len() {
                    return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
        }

        let points: Vec<Point3<f64>> = vertices.to_vec();
        let indices: Vec<[u32; 3]> = faces
            .iter()
            .map(|f| [f[0] as u32, f[1] as u32, f[2] as u32])
            .collect();

        Ok(Self {
            trimesh: TriMesh::new(points, indices),
        })
    }

    /// Number of triangles in the index.
    pub fn num_triangles(&self) -> usize {
        self.trimesh.indices().len()
    }

    /// Closest point on the reference surface. Always succeeds.
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.trimesh
            .project_point(&Isometry::identity(), point, true)
            .point
    }

    /// Cast a ray from `point` along `dir`, then along `-dir`.
    ///
    /// Returns the first hit, or `None` when both casts miss or `dir` has no
    /// usable length.
    pub fn ray_project(&self, point: &Point3<f64>, dir: &Vector3<f64>) -> Option<Point3<f64>> {
        if dir.norm_squared() < 1e-24 {
            return None;
        }

        let identity = Isometry::identity();
        for direction in [*dir, -*dir] {
            let ray = Ray::new(*point, direction);
            if let Some(toi) = self.trimesh.cast_ray(&identity, &ray, f64::MAX, true) {
                return Some(ray.point_at(toi));
            }
        }
        None
    }

    /// Project `point` onto the reference surface.
    ///
    /// Fallback chain: ray along `dir`, ray along `-dir`, closest point.
    pub fn project(&self, point: &Point3<f64>, dir: &Vector3<f64>) -> Point3<f64> {
        self.ray_project(point, dir)
            .unwrap_or_else(|| self.closest_point(point))
    }

    /// Move every interior vertex of `mesh` to its closest point on the
    /// reference surface. Boundary vertices are left untouched.
    pub fn project_interior_vertices(&self, mesh: &mut HalfEdgeMesh) {
        let interior: Vec<_> = mesh
            .vertex_ids()
            .filter(|&v| mesh.is_interior_vertex(v))
            .collect();

        for v in interior {
            let projected = self.closest_point(mesh.position(v));
            mesh.set_position(v, projected);
        }
    }
}

impl std::fmt::Debug for SurfaceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceIndex")
            .field("num_triangles", &self.num_triangles())
            .finish()
    }
}
