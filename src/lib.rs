//! # Waffle
//!
//! A mesh dualization library: half-edge triangle meshes, isotropic
//! remeshing, and dual-mesh construction with boundary-polyline handling.
//!
//! Waffle converts flat vertex/face arrays into a half-edge mesh, optionally
//! remeshes it toward a uniform edge length while pinning a caller-chosen set
//! of vertices, and derives the dual mesh: one dual vertex per primal face,
//! one variable-arity dual face per interior primal vertex, and polyline
//! strips that close the dual along open boundaries.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Array conversion boundary**: exact, order-preserving round trips between
//!   flat arrays and the half-edge representation
//! - **Isotropic remeshing**: split/collapse/flip/smooth with constrained
//!   vertices and compaction before ids are read back out
//! - **Dual construction**: centroid, circumcenter, or area-weighted dual
//!   vertex placement; dual graph connected components; boundary strips with a
//!   sharp-corner retention test
//! - **Surface projection**: AABB-backed closest-point and ray queries for
//!   keeping results on a reference surface
//!
//! ## Quick Start
//!
//! ```
//! use waffle::prelude::*;
//! use nalgebra::Point3;
//!
//! // A closed tetrahedron
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! let dual = dual_mesh(&mesh, &DualOptions::new()).unwrap();
//!
//! // One dual vertex per face, one dual face per (interior) vertex.
//! assert_eq!(dual.vertices.len(), mesh.num_faces());
//! assert_eq!(dual.faces.len(), mesh.num_vertices());
//! ```
//!
//! ## Remesh + Dual Pipeline
//!
//! ```no_run
//! use waffle::algo::dual::{remesh_dual, RemeshDualOptions};
//! use nalgebra::Point3;
//!
//! # let vertices: Vec<Point3<f64>> = vec![];
//! # let faces: Vec<[usize; 3]> = vec![];
//! let options = RemeshDualOptions::default()
//!     .with_length_factor(1.0)
//!     .with_iterations(10)
//!     .with_angle_threshold(0.9)
//!     .with_fixed_vertices(vec![0, 1]);
//!
//! let result = remesh_dual(&vertices, &faces, &options).unwrap();
//! println!("dual has {} faces", result.dual.faces.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use waffle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::dual::{
        dual_mesh, remesh_dual, DualMesh, DualOptions, PlacementPolicy, RemeshDualOptions,
        RemeshDualResult,
    };
    pub use crate::algo::project::SurfaceIndex;
    pub use crate::algo::remesh::{average_edge_length, isotropic_remesh, RemeshOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_face_vertex, to_polygons, Face, FaceId,
        HalfEdge, HalfEdgeId, HalfEdgeMesh, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron_dual() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mesh = build_from_triangles(&vertices, &faces).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert!(mesh.is_valid());

        let dual = dual_mesh(&mesh, &DualOptions::new()).unwrap();
        assert_eq!(dual.num_face_duals, 4);
        assert_eq!(dual.faces.len(), 4);
        assert_eq!(dual.num_components, 1);
    }
}
