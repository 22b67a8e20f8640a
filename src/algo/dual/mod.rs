//! Dual-mesh construction.
//!
//! Builds the dual of a triangle mesh: one dual vertex per primal face, one
//! dual face per interior primal vertex (the surrounding face duals in cyclic
//! order), and one polyline strip per primal boundary vertex linking
//! boundary-edge midpoints through the incident face duals.
//!
//! Dual faces are variable-arity index lists rather than a triangle matrix.
//! An interior vertex of degree d yields a d-corner dual face; nothing is
//! merged or deduplicated.
//!
//! Two entry points are provided: [`dual_mesh`] dualizes an existing mesh, and
//! [`remesh_dual`] runs the full pipeline: isotropic remeshing with
//! constrained vertices, projection back onto the input surface, dual-vertex
//! placement, dual projection along face normals, and boundary assembly.
//!
//! ```
//! use waffle::algo::dual::{remesh_dual, RemeshDualOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let options = RemeshDualOptions::default();
//! let result = remesh_dual(&vertices, &faces, &options).unwrap();
//! assert_eq!(result.dual.num_face_duals, result.faces.len());
//! ```

mod boundary;
mod placement;
mod topology;

pub use boundary::assemble_boundary_strips;
pub use placement::{face_areas, place_dual_vertices, vertex_weights, PlacementPolicy};
pub use topology::{interior_vertex_fans, DualTopology};

use log::debug;
use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, VertexId};

use super::project::SurfaceIndex;
use super::remesh::{average_edge_length, isotropic_remesh, RemeshOptions};

/// A dual mesh: variable-arity faces over dual vertices.
///
/// The first [`DualMesh::num_face_duals`] vertices correspond one-to-one with
/// the primal faces (dual vertex `i` belongs to primal face `i`);
/// boundary-edge midpoints and retained boundary vertices follow.
#[derive(Debug, Clone)]
pub struct DualMesh {
    /// Dual vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Dual faces and boundary strips as index lists into `vertices`.
    pub faces: Vec<Vec<usize>>,
    /// Number of leading vertices that are primal-face duals.
    pub num_face_duals: usize,
    /// Number of connected components of the dual graph.
    pub num_components: usize,
}

/// Options for [`dual_mesh`].
#[derive(Debug, Default)]
pub struct DualOptions<'a> {
    /// How to place the per-face dual vertices.
    pub placement: PlacementPolicy,

    /// Boundary-corner retention threshold in radians; 0 disables the test.
    pub angle_threshold: f64,

    /// Boundary vertices coinciding with any of these points are always
    /// retained in their strip.
    pub fixed_points: Vec<Point3<f64>>,

    /// Caller-supplied per-vertex weights for the area-weighted placement.
    /// Must have exactly one entry per primal vertex.
    pub vertex_weights: Option<Vec<f64>>,

    /// Reference surface to project the face-dual vertices onto, by ray cast
    /// along the primal face normal with closest-point fallback.
    pub project_to: Option<&'a SurfaceIndex>,
}

impl<'a> DualOptions<'a> {
    /// Create default options (area-weighted placement, no angle test).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dual-vertex placement policy.
    pub fn with_placement(mut self, placement: PlacementPolicy) -> Self {
        self.placement = placement;
        self
    }

    /// Set the boundary-corner retention threshold (radians).
    pub fn with_angle_threshold(mut self, radians: f64) -> Self {
        self.angle_threshold = radians;
        self
    }

    /// Set the fixed points that force boundary-vertex retention.
    pub fn with_fixed_points(mut self, points: Vec<Point3<f64>>) -> Self {
        self.fixed_points = points;
        self
    }

    /// Override the computed vertex weights.
    pub fn with_vertex_weights(mut self, weights: Vec<f64>) -> Self {
        self.vertex_weights = Some(weights);
        self
    }

    /// Project face-dual vertices onto a reference surface.
    pub fn with_projection(mut self, index: &'a SurfaceIndex) -> Self {
        self.project_to = Some(index);
        self
    }
}

/// Build the dual mesh of `mesh`.
///
/// Exactly one dual vertex is created per primal face before any dual face
/// references it. Interior vertices of degree d contribute a d-corner dual
/// face (d ≥ 3); boundary vertices contribute polyline strips. The result is
/// either a complete, self-consistent dual mesh or an error, never a
/// partially built one.
pub fn dual_mesh(mesh: &HalfEdgeMesh, options: &DualOptions<'_>) -> Result<DualMesh> {
    if mesh.num_faces() == 0 {
        return Err(MeshError::EmptyMesh);
    }

    let mut vertices = place_dual_vertices(
        mesh,
        options.placement,
        options.vertex_weights.as_deref(),
    )?;

    if let Some(index) = options.project_to {
        for f in mesh.face_ids() {
            let normal = mesh.face_normal(f);
            vertices[f.index()] = index.project(&vertices[f.index()], &normal);
        }
    }

    let topology = DualTopology::build(mesh);

    let mut faces: Vec<Vec<usize>> = interior_vertex_fans(mesh)
        .into_iter()
        .map(|(_, fan)| fan.into_iter().map(|f| f.index()).collect())
        .collect();

    let strips = assemble_boundary_strips(
        mesh,
        &mut vertices,
        options.angle_threshold,
        &options.fixed_points,
    );
    let num_strips = strips.len();
    faces.extend(strips);

    debug!(
        "dual mesh: {} face duals, {} interior faces, {} boundary strips, {} components",
        mesh.num_faces(),
        faces.len() - num_strips,
        num_strips,
        topology.num_components
    );

    Ok(DualMesh {
        vertices,
        faces,
        num_face_duals: mesh.num_faces(),
        num_components: topology.num_components,
    })
}

/// Options for [`remesh_dual`].
#[derive(Debug, Clone)]
pub struct RemeshDualOptions {
    /// Target edge length as a multiple of the input's average edge length.
    pub length_factor: f64,

    /// Number of remeshing iterations.
    pub iterations: usize,

    /// Boundary-corner retention threshold in radians; 0 disables the test.
    pub angle_threshold: f64,

    /// Input vertex ids to preserve verbatim through remeshing and boundary
    /// assembly.
    pub fixed_vertices: Vec<usize>,

    /// How to place the per-face dual vertices.
    pub placement: PlacementPolicy,

    /// Whether to project remeshed and dual vertices back onto the input
    /// surface.
    pub project_to_input: bool,
}

impl Default for RemeshDualOptions {
    fn default() -> Self {
        Self {
            length_factor: 1.0,
            iterations: 10,
            angle_threshold: 0.0,
            fixed_vertices: Vec::new(),
            placement: PlacementPolicy::AreaWeighted,
            project_to_input: true,
        }
    }
}

impl RemeshDualOptions {
    /// Set the target edge length as a multiple of the average edge length.
    pub fn with_length_factor(mut self, factor: f64) -> Self {
        self.length_factor = factor;
        self
    }

    /// Set the number of remeshing iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the boundary-corner retention threshold (radians).
    pub fn with_angle_threshold(mut self, radians: f64) -> Self {
        self.angle_threshold = radians;
        self
    }

    /// Set the input vertex ids that must survive verbatim.
    pub fn with_fixed_vertices(mut self, fixed: Vec<usize>) -> Self {
        self.fixed_vertices = fixed;
        self
    }

    /// Set the dual-vertex placement policy.
    pub fn with_placement(mut self, placement: PlacementPolicy) -> Self {
        self.placement = placement;
        self
    }

    /// Set whether to project results back onto the input surface.
    pub fn with_project_to_input(mut self, project: bool) -> Self {
        self.project_to_input = project;
        self
    }
}

/// Result of [`remesh_dual`]: the remeshed primal mesh and its dual.
#[derive(Debug, Clone)]
pub struct RemeshDualResult {
    /// Remeshed primal vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Remeshed primal triangles.
    pub faces: Vec<[usize; 3]>,
    /// The dual of the remeshed mesh.
    pub dual: DualMesh,
}

/// Remesh a triangle mesh and build the dual of the result.
///
/// The pipeline: validate inputs, build the primal mesh, derive the remeshing
/// target from the average edge length, remesh with the fixed vertices
/// constrained, project interior vertices back onto the input surface, place
/// and project the dual vertices, and assemble dual topology and boundary
/// strips. Fixed vertices keep their exact input positions and are always
/// retained in their boundary strips.
pub fn remesh_dual(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
    options: &RemeshDualOptions,
) -> Result<RemeshDualResult> {
    if !(options.length_factor > 0.0 && options.length_factor.is_finite()) {
        return Err(MeshError::invalid_param(
            "length_factor",
            options.length_factor,
            "must be a positive finite number",
        ));
    }
    for &v in &options.fixed_vertices {
        if v >= vertices.len() {
            return Err(MeshError::VertexOutOfRange {
                vertex: v,
                num_vertices: vertices.len(),
            });
        }
    }

    let mut mesh = build_from_triangles(vertices, faces)?;

    // Capture the fixed positions now: remeshing renumbers vertices, but the
    // constrained positions survive bit-for-bit and are matched by point.
    let fixed_points: Vec<Point3<f64>> = options
        .fixed_vertices
        .iter()
        .map(|&v| vertices[v])
        .collect();

    let target = average_edge_length(&mesh) * options.length_factor;
    let remesh_options = RemeshOptions::with_target_length(target)
        .with_iterations(options.iterations)
        .with_project_to_input(options.project_to_input)
        .with_constrained_vertices(
            options.fixed_vertices.iter().map(|&v| VertexId::new(v)).collect(),
        );
    isotropic_remesh(&mut mesh, &remesh_options)?;

    let reference = if options.project_to_input {
        Some(SurfaceIndex::from_arrays(vertices, faces)?)
    } else {
        None
    };
    let mut dual_options = DualOptions::new()
        .with_placement(options.placement)
        .with_angle_threshold(options.angle_threshold)
        .with_fixed_points(fixed_points);
    if let Some(ref index) = reference {
        dual_options = dual_options.with_projection(index);
    }

    let dual = dual_mesh(&mesh, &dual_options)?;
    let (remeshed_vertices, remeshed_faces) = to_face_vertex(&mesh);

    Ok(RemeshDualResult {
        vertices: remeshed_vertices,
        faces: remeshed_faces,
        dual,
    })
}
