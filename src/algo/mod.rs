//! Mesh processing algorithms.
//!
//! This module contains the geometry-processing passes built on the half-edge
//! mesh:
//!
//! - **Remeshing**: isotropic remeshing with a constrained-vertex set
//! - **Projection**: AABB-backed closest-point and ray queries against a
//!   reference surface
//! - **Dualization**: dual-mesh construction with boundary polylines

pub mod dual;
pub mod project;
pub mod remesh;
