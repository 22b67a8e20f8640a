//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and the conversion
//! boundary between flat vertex/face arrays and that representation.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a triangle mesh using
//! a half-edge (doubly-connected edge list) data structure. This representation
//! provides O(1) adjacency queries, making it efficient for geometry processing
//! algorithms.
//!
//! Mesh elements are identified by the type-safe index wrappers [`VertexId`],
//! [`HalfEdgeId`] and [`FaceId`], all backed by plain `u32` values that mirror
//! the row indices of the arrays the mesh was built from.
//!
//! # Construction
//!
//! ```
//! use waffle::mesh::{build_from_triangles, to_face_vertex};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! let (v, f) = to_face_vertex(&mesh);
//! assert_eq!(v, vertices);
//! assert_eq!(f, faces);
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::{build_from_polygons, build_from_triangles, to_face_vertex, to_polygons};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{FaceId, HalfEdgeId, VertexId};
