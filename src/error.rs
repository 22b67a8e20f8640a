//! Error types for waffle.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A vertex index supplied outside of a face list (e.g. a constrained or
    /// fixed vertex) is out of range for the mesh.
    #[error("vertex index {vertex} is out of range for a mesh with {num_vertices} vertices")]
    VertexOutOfRange {
        /// The invalid vertex index.
        vertex: usize,
        /// The number of vertices in the mesh.
        num_vertices: usize,
    },

    /// A face has duplicate vertex indices (degenerate polygon).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A polygonal face has fewer than three corners.
    #[error("face {face} is malformed: {arity} corners (need at least 3)")]
    MalformedFace {
        /// The face index.
        face: usize,
        /// The number of corners the face was given.
        arity: usize,
    },

    /// An auxiliary array does not match the mesh element count it indexes.
    #[error("{name} has {actual} entries, expected {expected}")]
    LengthMismatch {
        /// Name of the mismatched array.
        name: &'static str,
        /// The expected entry count.
        expected: usize,
        /// The actual entry count.
        actual: usize,
    },

    /// The mesh has non-manifold topology.
    #[error("mesh has non-manifold topology: {details}")]
    NonManifold {
        /// Description of the non-manifold condition.
        details: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// An operation ran but could not produce a usable result.
    #[error("{operation} failed: {message}")]
    OperationFailed {
        /// Name of the operation that failed.
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
