//! Mesh construction from caller buffers.
//!
//! [`build_mesh`] validates an [`InputMesh`], groups colocal vertices, links
//! twin half-edges and classifies degenerate edges. Degenerate edges are
//! reported and left unlinked; every face is kept so that charting still
//! covers the whole mesh.

use std::collections::HashMap;

use nalgebra::{Point2, Point3, Vector3};

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::index::{FaceId, HalfEdgeId, VertexId};
use super::input::InputMesh;
use crate::error::{AddMeshError, AddMeshWarning, MeshWarning};

/// Build a half-edge mesh from an input mesh.
///
/// With `use_colocal`, vertices whose positions are bit-identical share one
/// topological vertex for adjacency (`-0.0` counts as `0.0`); their
/// attributes stay separate.
/// Non-fatal problems are passed to `on_warning` in face order.
///
/// # Example
/// ```
/// use mesh_atlas::mesh::{build_mesh, IndexData, InputMesh};
///
/// let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]];
/// let indices = [0u32, 1, 2];
/// let input = InputMesh::from_positions(&positions, IndexData::U32(&indices));
///
/// let mesh = build_mesh(&input, true, &mut |_| {}).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_mesh(
    input: &InputMesh<'_>,
    use_colocal: bool,
    on_warning: &mut dyn FnMut(MeshWarning),
) -> std::result::Result<HalfEdgeMesh, AddMeshError> {
    let index_count = input.indices.len();
    if index_count % 3 != 0 {
        return Err(AddMeshError::InvalidIndexCount {
            count: index_count as u32,
        });
    }

    let vertex_count = input.vertex_count();
    for i in 0..index_count {
        let index = input.indices.get(i);
        if index as usize >= vertex_count {
            return Err(AddMeshError::IndexOutOfRange { index });
        }
    }

    let face_count = input.face_count();
    let mut mesh = HalfEdgeMesh::with_capacity(vertex_count, face_count);

    add_vertices(&mut mesh, input, vertex_count, use_colocal);

    // Directed edge between colocal groups -> the half-edge that claimed it.
    let mut edge_map: HashMap<(VertexId, VertexId), HalfEdgeId> =
        HashMap::with_capacity(face_count * 3);
    let mut linkable = vec![false; face_count * 3];

    for f in 0..face_count {
        let tri = [
            input.indices.get(3 * f),
            input.indices.get(3 * f + 1),
            input.indices.get(3 * f + 2),
        ];
        let face_id = FaceId::new(f);
        let base = mesh.num_halfedges();

        for k in 0..3 {
            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(tri[k] as usize),
                twin: HalfEdgeId::invalid(),
                next: HalfEdgeId::new(base + (k + 1) % 3),
                prev: HalfEdgeId::new(base + (k + 2) % 3),
                face: face_id,
            });
        }
        mesh.faces.push(Face {
            halfedge: HalfEdgeId::new(base),
            material: input.face_material(f),
        });

        let mut flagged = [false; 3];
        let mut emit = |k: usize, kind: AddMeshWarning| {
            on_warning(MeshWarning {
                kind,
                face: f as u32,
                index0: tri[k],
                index1: tri[(k + 1) % 3],
            });
        };

        for k in 0..3 {
            if let Some(kind) = classify_edge(&mesh, tri[k], tri[(k + 1) % 3]) {
                flagged[k] = true;
                emit(k, kind);
            }
        }

        // A collapsed corner leaves the other two edges spanning the same pair.
        if flagged.iter().any(|&x| x) {
            let key = |k: usize| {
                let a = mesh.colocal(VertexId::new(tri[k] as usize));
                let b = mesh.colocal(VertexId::new(tri[(k + 1) % 3] as usize));
                (a.min(b), a.max(b))
            };
            'pairs: for j in 0..3 {
                for k in (j + 1)..3 {
                    if !flagged[j] && !flagged[k] && key(j) == key(k) {
                        flagged[k] = true;
                        emit(k, AddMeshWarning::DuplicateEdge);
                        break 'pairs;
                    }
                }
            }
        }

        for k in 0..3 {
            if flagged[k] {
                continue;
            }
            let he = HalfEdgeId::new(base + k);
            let a = mesh.colocal(VertexId::new(tri[k] as usize));
            let b = mesh.colocal(VertexId::new(tri[(k + 1) % 3] as usize));
            if edge_map.contains_key(&(a, b)) {
                emit(k, AddMeshWarning::AlreadyAddedEdge);
            } else {
                edge_map.insert((a, b), he);
                linkable[he.index()] = true;
            }
        }
    }

    link_twins(&mut mesh, &edge_map, &linkable);

    if input.normals.is_none() {
        compute_vertex_normals(&mut mesh);
    }

    Ok(mesh)
}

/// Copy vertex attributes and assign colocal representatives.
fn add_vertices(mesh: &mut HalfEdgeMesh, input: &InputMesh<'_>, count: usize, use_colocal: bool) {
    let mut groups: HashMap<[u32; 3], VertexId> = HashMap::new();

    for i in 0..count {
        let p = input.positions.read_vec3(i).unwrap_or_default();
        let id = VertexId::new(i);

        let colocal = if use_colocal {
            *groups.entry(weld_key(p)).or_insert(id)
        } else {
            id
        };

        let normal = input
            .normals
            .and_then(|n| n.read_vec3(i))
            .map(|n| {
                let n = Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64);
                let len = n.norm();
                if len > 0.0 && len.is_finite() {
                    n / len
                } else {
                    Vector3::zeros()
                }
            })
            .unwrap_or_else(Vector3::zeros);

        let uv = input
            .uvs
            .and_then(|t| t.read_vec2(i))
            .map(|t| Point2::new(t[0] as f64, t[1] as f64));

        mesh.vertices.push(Vertex {
            position: Point3::new(p[0] as f64, p[1] as f64, p[2] as f64),
            normal,
            uv,
            colocal,
        });
    }
}

/// Bit pattern of a position with `-0.0` folded into `0.0`, so corners that
/// compare equal always land in the same group.
fn weld_key(p: [f32; 3]) -> [u32; 3] {
    p.map(|c| if c == 0.0 { 0 } else { c.to_bits() })
}

fn classify_edge(mesh: &HalfEdgeMesh, a: u32, b: u32) -> Option<AddMeshWarning> {
    if a == b {
        return Some(AddMeshWarning::DegenerateEdge);
    }
    let va = VertexId::new(a as usize);
    let vb = VertexId::new(b as usize);
    if mesh.position(va) == mesh.position(vb) {
        return Some(AddMeshWarning::ZeroLengthEdge);
    }
    if mesh.colocal(va) == mesh.colocal(vb) {
        return Some(AddMeshWarning::DegenerateColocalEdge);
    }
    None
}

/// Pair each registered half-edge with the one running the other way.
///
/// Walks half-edges in index order so the result does not depend on hash order.
fn link_twins(
    mesh: &mut HalfEdgeMesh,
    edge_map: &HashMap<(VertexId, VertexId), HalfEdgeId>,
    linkable: &[bool],
) {
    for i in 0..mesh.num_halfedges() {
        if !linkable[i] || mesh.halfedges[i].twin.is_valid() {
            continue;
        }
        let he = HalfEdgeId::new(i);
        let a = mesh.colocal(mesh.origin(he));
        let b = mesh.colocal(mesh.dest(he));

        if let Some(&twin) = edge_map.get(&(b, a)) {
            if mesh.face_of(twin) != mesh.face_of(he) && !mesh.halfedges[twin.index()].twin.is_valid() {
                mesh.halfedges[i].twin = twin;
                mesh.halfedges[twin.index()].twin = he;
            }
        }
    }
}

/// Area-weighted normals, shared by every vertex of a colocal group.
fn compute_vertex_normals(mesh: &mut HalfEdgeMesh) {
    let mut sums = vec![Vector3::<f64>::zeros(); mesh.num_vertices()];

    for f in mesh.face_ids() {
        let n = mesh.face_normal_weighted(f);
        if !n.iter().all(|c| c.is_finite()) {
            continue;
        }
        for v in mesh.face_triangle(f) {
            sums[mesh.colocal(v).index()] += n;
        }
    }

    for i in 0..mesh.num_vertices() {
        let rep = mesh.vertices[i].colocal.index();
        let n = sums[rep];
        let len = n.norm();
        mesh.vertices[i].normal = if len > 0.0 { n / len } else { Vector3::zeros() };
    }
}
