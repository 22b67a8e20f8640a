//! Dual graph construction.
//!
//! The dual graph has one node per primal face and an edge between two nodes
//! exactly when the corresponding faces share a non-boundary primal edge.
//! Boundary edges contribute nothing: the graph is built from interior
//! half-edge twins only, so no sentinel "outside" node ever appears.
//!
//! On top of the graph this module extracts connected components (BFS over
//! the adjacency, labels assigned in face-id order) and the interior-vertex
//! fans that become the dual faces.

use log::debug;

use crate::mesh::{FaceId, HalfEdgeMesh, VertexId};

/// The dual graph of a primal mesh, with connected-component labels.
#[derive(Debug, Clone)]
pub struct DualTopology {
    /// Adjacent face ids per face id, in half-edge order around each face.
    pub adjacency: Vec<Vec<FaceId>>,
    /// Connected-component label per face id.
    pub component_of: Vec<usize>,
    /// Number of connected components.
    pub num_components: usize,
}

impl DualTopology {
    /// Build the dual graph of `mesh`.
    pub fn build(mesh: &HalfEdgeMesh) -> Self {
        let mut adjacency: Vec<Vec<FaceId>> = vec![Vec::new(); mesh.num_faces()];

        for f in mesh.face_ids() {
            for he in mesh.face_halfedges(f) {
                // Border edges are filtered out entirely; only an interior
                // twin yields a dual edge.
                if mesh.is_boundary_edge(he) {
                    continue;
                }
                let neighbor = mesh.face_of(mesh.twin(he));
                adjacency[f.index()].push(neighbor);
            }
        }

        let (component_of, num_components) = connected_components(&adjacency);

        debug!(
            "dual graph: {} nodes, {} components",
            adjacency.len(),
            num_components
        );

        Self {
            adjacency,
            component_of,
            num_components,
        }
    }

    /// Number of nodes (primal faces) in the dual graph.
    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }
}

/// Label the connected components of a face-adjacency list.
///
/// Components are numbered in order of their lowest face id, so labels are
/// deterministic for a given mesh.
fn connected_components(adjacency: &[Vec<FaceId>]) -> (Vec<usize>, usize) {
    let mut component_of = vec![usize::MAX; adjacency.len()];
    let mut num_components = 0;

    for start in 0..adjacency.len() {
        if component_of[start] != usize::MAX {
            continue;
        }

        let label = num_components;
        num_components += 1;

        let mut queue = std::collections::VecDeque::from([start]);
        component_of[start] = label;
        while let Some(node) = queue.pop_front() {
            for &neighbor in &adjacency[node] {
                let n = neighbor.index();
                if component_of[n] == usize::MAX {
                    component_of[n] = label;
                    queue.push_back(n);
                }
            }
        }
    }

    (component_of, num_components)
}

/// Collect the fan of incident faces for every interior primal vertex with at
/// least three incident faces, in the cyclic order induced by half-edge
/// rotation around the vertex.
///
/// Interior vertices of degree < 3 produce no fan (a degenerate boundary
/// condition, not an error). Boundary vertices are handled separately by the
/// boundary polyline assembler.
pub fn interior_vertex_fans(mesh: &HalfEdgeMesh) -> Vec<(VertexId, Vec<FaceId>)> {
    let mut fans = Vec::new();

    for v in mesh.vertex_ids() {
        if !mesh.is_interior_vertex(v) {
            continue;
        }

        let fan: Vec<FaceId> = mesh.vertex_faces(v).collect();
        if fan.len() >= 3 {
            fans.push((v, fan));
        }
    }

    fans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    fn tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_closed_mesh_every_face_has_three_neighbors() {
        let mesh = tetrahedron();
        let topology = DualTopology::build(&mesh);

        assert_eq!(topology.num_nodes(), 4);
        assert_eq!(topology.num_components, 1);
        for neighbors in &topology.adjacency {
            assert_eq!(neighbors.len(), 3);
        }
    }

    #[test]
    fn test_boundary_edges_produce_no_dual_edge() {
        // Two triangles sharing one edge: each dual node has exactly one
        // neighbor; the four boundary edges contribute nothing.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        let topology = DualTopology::build(&mesh);
        assert_eq!(topology.adjacency[0], vec![FaceId::new(1)]);
        assert_eq!(topology.adjacency[1], vec![FaceId::new(0)]);
        assert_eq!(topology.num_components, 1);
    }

    #[test]
    fn test_disconnected_patches_are_separate_components() {
        // Two triangles with no shared edge.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(5.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [3, 4, 5]];
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        let topology = DualTopology::build(&mesh);
        assert_eq!(topology.num_components, 2);
        assert_ne!(topology.component_of[0], topology.component_of[1]);
    }

    #[test]
    fn test_interior_fans_on_closed_mesh() {
        let mesh = tetrahedron();
        let fans = interior_vertex_fans(&mesh);

        // All four vertices are interior with degree 3.
        assert_eq!(fans.len(), 4);
        for (_, fan) in &fans {
            assert_eq!(fan.len(), 3);
        }
    }

    #[test]
    fn test_fan_size_matches_vertex_degree() {
        // 3x3 grid: the center vertex has six incident faces.
        let mut vertices = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..2usize {
            for i in 0..2usize {
                let v00 = j * 3 + i;
                let v10 = v00 + 1;
                let v01 = v00 + 3;
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        let fans = interior_vertex_fans(&mesh);
        assert_eq!(fans.len(), 1);
        let (v, fan) = &fans[0];
        assert_eq!(v.index(), 4);
        assert_eq!(fan.len(), 6);

        // Cyclic order: consecutive fan faces share a non-boundary edge.
        let topology = DualTopology::build(&mesh);
        for i in 0..fan.len() {
            let a = fan[i];
            let b = fan[(i + 1) % fan.len()];
            assert!(
                topology.adjacency[a.index()].contains(&b),
                "fan faces {:?} and {:?} are not adjacent",
                a,
                b
            );
        }
    }

    #[test]
    fn test_no_fans_without_interior_vertices() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        assert!(interior_vertex_fans(&mesh).is_empty());
    }
}
