//! Half-edge mesh data structure.
//!
//! Every face owns three half-edges stored consecutively in an arena, so all
//! adjacency queries are plain index lookups.
//!
//! # Structure
//!
//! - Each half-edge knows its **origin vertex**, its **next**/**prev**
//!   half-edge around the face, its **face** and, where the topology allows
//!   it, its **twin** running the opposite way in the neighboring face.
//! - A half-edge without a twin lies on the mesh boundary (or on an edge the
//!   builder refused to link, see [`AddMeshWarning`](crate::AddMeshWarning)).
//! - Vertices are the caller's input vertices. Twins are matched through the
//!   vertex's colocal representative, so two half-edges may be twins while
//!   their endpoints are different input vertices. Such an edge is a *seam*.

use nalgebra::{Point2, Point3, Vector3};

use super::index::{FaceId, HalfEdgeId, VertexId};

/// Faces with less area than this are treated as degenerate.
pub(crate) const DEGENERATE_AREA: f64 = 1e-14;

/// An input vertex.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Unit normal (supplied or derived from adjacent faces); zero if unknown.
    pub normal: Vector3<f64>,

    /// UV hint supplied by the caller.
    pub uv: Option<Point2<f64>>,

    /// Representative of the vertex's colocal group. Equal to the vertex itself
    /// when welding is disabled or no other vertex shares its position.
    pub colocal: VertexId,
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// The vertex this half-edge originates from.
    pub origin: VertexId,

    /// The opposite half-edge in the neighboring face. Invalid on boundaries.
    pub twin: HalfEdgeId,

    /// The next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId,

    /// The previous half-edge around the face.
    pub prev: HalfEdgeId,

    /// The face this half-edge belongs to.
    pub face: FaceId,
}

impl HalfEdge {
    /// Check if this half-edge has no twin.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.twin.is_valid()
    }
}

/// A triangular face.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// First of the face's three half-edges.
    pub halfedge: HalfEdgeId,

    /// Material id supplied by the caller (0 if none).
    pub material: u16,
}

/// A half-edge mesh built from one input mesh.
///
/// Built once by [`build_mesh`](super::build_mesh) and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) halfedges: Vec<HalfEdge>,
    pub(crate) faces: Vec<Face>,
}

impl HalfEdgeMesh {
    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_faces * 3),
            faces: Vec::with_capacity(num_faces),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Colocal representative of a vertex.
    #[inline]
    pub fn colocal(&self, v: VertexId) -> VertexId {
        self.vertex(v).colocal
    }

    /// Material id of a face.
    #[inline]
    pub fn material(&self, f: FaceId) -> u16 {
        self.face(f).material
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge, invalid on boundaries.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).prev
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.origin(self.next(he))
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId) -> FaceId {
        self.halfedge(he).face
    }

    /// Face on the other side of a half-edge, if linked.
    #[inline]
    pub fn opposite_face(&self, he: HalfEdgeId) -> Option<FaceId> {
        let twin = self.twin(he);
        twin.is_valid().then(|| self.face_of(twin))
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if a linked edge joins different input vertices on its two sides.
    pub fn is_seam(&self, he: HalfEdgeId) -> bool {
        let twin = self.twin(he);
        if !twin.is_valid() {
            return false;
        }
        self.origin(he) != self.dest(twin) || self.dest(he) != self.origin(twin)
    }

    /// Check if a seam separates vertices with different normals.
    pub fn is_normal_seam(&self, he: HalfEdgeId) -> bool {
        if !self.is_seam(he) {
            return false;
        }
        let twin = self.twin(he);
        self.vertex(self.origin(he)).normal != self.vertex(self.dest(twin)).normal
            || self.vertex(self.dest(he)).normal != self.vertex(self.origin(twin)).normal
    }

    /// Check if a linked edge separates faces of different materials.
    pub fn is_material_seam(&self, he: HalfEdgeId) -> bool {
        let twin = self.twin(he);
        twin.is_valid() && self.material(self.face_of(he)) != self.material(self.face_of(twin))
    }

    /// Check if a linked edge separates different materials, or is a seam
    /// whose two sides carry different UV hints.
    pub fn is_texture_seam(&self, he: HalfEdgeId) -> bool {
        let twin = self.twin(he);
        if !twin.is_valid() {
            return false;
        }
        if self.is_material_seam(he) {
            return true;
        }
        if !self.is_seam(he) {
            return false;
        }
        self.vertex(self.origin(he)).uv != self.vertex(self.dest(twin)).uv
            || self.vertex(self.dest(he)).uv != self.vertex(self.origin(twin)).uv
    }

    // ==================== Iteration ====================

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// The three half-edges of a face, in winding order.
    #[inline]
    pub fn face_halfedges(&self, f: FaceId) -> [HalfEdgeId; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        [he0, he1, self.next(he1)]
    }

    /// Get the three vertices of a face.
    pub fn face_triangle(&self, f: FaceId) -> [VertexId; 3] {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Get the positions of the three vertices of a face.
    pub fn face_positions(&self, f: FaceId) -> [Point3<f64>; 3] {
        self.face_triangle(f).map(|v| *self.position(v))
    }

    // ==================== Geometry ====================

    /// Unnormalized face normal (twice the area, pointing along the normal).
    pub fn face_normal_weighted(&self, f: FaceId) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Unit face normal, or zero for degenerate faces.
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        let n = self.face_normal_weighted(f);
        let len = n.norm();
        if 0.5 * len > DEGENERATE_AREA && len.is_finite() {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let area = 0.5 * self.face_normal_weighted(f).norm();
        if area.is_finite() {
            area
        } else {
            0.0
        }
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId) -> f64 {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        let len = (p1 - p0).norm();
        if len.is_finite() {
            len
        } else {
            0.0
        }
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = first.position;
        let mut max = first.position;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Number of half-edges without a twin.
    pub fn num_boundary_halfedges(&self) -> usize {
        self.halfedges.iter().filter(|he| he.is_boundary()).count()
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        for (i, he) in self.halfedges.iter().enumerate() {
            let id = HalfEdgeId::new(i);

            if he.twin.is_valid() {
                let twin = self.halfedge(he.twin);
                if twin.twin != id || twin.face == he.face {
                    return false;
                }
                // Twins run in opposite directions between the same colocal groups.
                if self.colocal(twin.origin) != self.colocal(self.dest(id))
                    || self.colocal(self.dest(he.twin)) != self.colocal(he.origin)
                {
                    return false;
                }
            }

            if self.halfedge(he.next).prev != id || self.halfedge(he.prev).next != id {
                return false;
            }
            if self.halfedge(he.next).face != he.face {
                return false;
            }
        }

        self.faces.iter().all(|f| f.halfedge.is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_mesh, IndexData, InputMesh};

    fn quad_with_seam() -> HalfEdgeMesh {
        // Two triangles sharing the 1-2 edge, but the second face uses
        // duplicated vertices 4 and 5 at the same positions.
        let positions = [
            [0.0f32, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let uvs = [
            [0.0f32, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.5, 0.5],
            [0.2, 0.0],
            [0.0, 0.2],
        ];
        let indices = [0u32, 1, 2, 4, 3, 5];
        let input = InputMesh::from_positions(&positions, IndexData::U32(&indices)).with_uvs(&uvs);
        build_mesh(&input, true, &mut |_| {}).unwrap()
    }

    #[test]
    fn test_face_geometry() {
        let mesh = quad_with_seam();
        let f = FaceId::new(0);
        assert!((mesh.face_area(f) - 0.5).abs() < 1e-12);
        assert!((mesh.face_normal(f) - Vector3::z()).norm() < 1e-12);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
        let c = mesh.face_centroid(f);
        assert!((c.x - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_seam_detection() {
        let mesh = quad_with_seam();
        assert!(mesh.is_valid());

        let shared = mesh
            .face_halfedges(FaceId::new(0))
            .into_iter()
            .find(|&he| !mesh.is_boundary_halfedge(he))
            .unwrap();
        assert_eq!(mesh.opposite_face(shared), Some(FaceId::new(1)));
        assert!(mesh.is_seam(shared));
        assert!(mesh.is_texture_seam(shared));
        assert!(!mesh.is_material_seam(shared));
        assert!(!mesh.is_normal_seam(shared));
        assert_eq!(mesh.num_boundary_halfedges(), 4);
    }

    #[test]
    fn test_face_loops_close() {
        let mesh = quad_with_seam();
        for f in mesh.face_ids() {
            let [a, b, c] = mesh.face_halfedges(f);
            assert_eq!(mesh.prev(a), c);
            assert_eq!(mesh.prev(b), a);
            assert_eq!(mesh.next(mesh.prev(c)), c);
            assert_eq!(mesh.dest(mesh.prev(a)), mesh.origin(a));
        }
    }

    #[test]
    fn test_degenerate_face_normal_is_zero() {
        let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let indices = [0u16, 1, 2];
        let input = InputMesh::from_positions(&positions, IndexData::U16(&indices));
        let mesh = build_mesh(&input, true, &mut |_| {}).unwrap();
        let f = FaceId::new(0);
        assert_eq!(mesh.face_normal(f), Vector3::zeros());
        assert_eq!(mesh.face_area(f), 0.0);
    }
}
