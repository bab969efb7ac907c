//! Chart parameterization.
//!
//! Flattens every chart into its own 2D domain. Charts are flattened with
//! [`lscm`]; charts LSCM cannot handle (closed, degenerate, or not converging)
//! fall back to an orthogonal projection onto the chart's proxy plane.
//!
//! Results are rescaled so that UV area equals surface area, and anchored at
//! the origin. A chart whose flattening folds over itself is split into two
//! connected halves that are flattened again, so every face still ends up in
//! exactly one chart.
//!
//! # Example
//!
//! ```
//! use mesh_atlas::algo::charts::{build_charts, CharterOptions};
//! use mesh_atlas::algo::parameterize::parameterize_charts;
//! use mesh_atlas::algo::Progress;
//! use mesh_atlas::mesh::{build_mesh, IndexData, InputMesh};
//!
//! let positions = [[0.0f32, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
//! let indices = [0u16, 1, 2];
//! let input = InputMesh::from_positions(&positions, IndexData::U16(&indices));
//! let mesh = build_mesh(&input, true, &mut |_| {}).unwrap();
//!
//! let charts = build_charts(&mesh, &CharterOptions::default(), &Progress::none());
//! let params = parameterize_charts(&mesh, &charts, true);
//! assert_eq!(params.len(), 1);
//! assert!((params[0].uv_area() - 1.0).abs() < 1e-6);
//! ```
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

mod lscm;
mod sparse;
mod uv;

use std::collections::{HashMap, HashSet, VecDeque};

use nalgebra::{Point2, Point3, Vector3};
use rayon::prelude::*;

use crate::mesh::{FaceId, HalfEdgeMesh, VertexId, DEGENERATE_AREA};

use super::charts::Chart;

pub use lscm::{lscm, LSCMOptions};
pub use sparse::{conjugate_gradient, CsrMatrix};
pub use uv::UVMap;

/// How a chart was flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMethod {
    /// Least squares conformal map.
    Lscm,
    /// Orthogonal projection onto the proxy plane.
    Projection,
}

/// A flattened chart.
///
/// Local vertices are the colocal representatives of the chart's corners, so
/// a welded seam inside a chart stays continuous in UV space. Corners of one
/// face at equal positions also share a local vertex, so a zero-area face
/// keeps zero area in UV space even when welding is off.
#[derive(Debug, Clone)]
pub struct ChartParam {
    /// Faces of the chart.
    pub faces: Vec<FaceId>,

    /// Mesh vertex (smallest colocal representative) of each local vertex.
    pub vertices: Vec<VertexId>,

    /// Local vertex indices of each face, parallel to `faces`.
    pub triangles: Vec<[usize; 3]>,

    /// UV of each local vertex, in world units.
    pub uvs: UVMap,

    /// Surface area of the chart.
    pub area: f64,

    /// Method that produced `uvs`.
    pub method: ParamMethod,
}

impl ChartParam {
    /// Area covered in UV space.
    pub fn uv_area(&self) -> f64 {
        self.uvs.total_area(&self.triangles)
    }

    /// Number of faces whose UV triangle is flipped.
    ///
    /// A face without surface area counts as flipped once it covers more than
    /// a thousandth of an average face in UV space.
    pub fn flipped_faces(&self, mesh: &HalfEdgeMesh) -> usize {
        let opened = 1e-3 * self.area / self.faces.len().max(1) as f64;
        self.faces
            .iter()
            .zip(&self.triangles)
            .filter(|(&f, tri)| {
                let area = mesh.face_area(f);
                let uv_area = self.uvs.signed_area(tri);
                if area > DEGENERATE_AREA {
                    uv_area < -1e-6 * area
                } else {
                    uv_area.abs() > opened.max(DEGENERATE_AREA)
                }
            })
            .count()
    }
}

/// Flatten every chart, splitting charts that fold over.
///
/// The output order follows the input charts; pieces of a split chart are
/// adjacent. Identical for `parallel` on and off.
pub fn parameterize_charts(mesh: &HalfEdgeMesh, charts: &[Chart], parallel: bool) -> Vec<ChartParam> {
    let pieces: Vec<Vec<ChartParam>> = if parallel {
        charts.par_iter().map(|c| parameterize_or_split(mesh, c)).collect()
    } else {
        charts.iter().map(|c| parameterize_or_split(mesh, c)).collect()
    };
    pieces.into_iter().flatten().collect()
}

fn parameterize_or_split(mesh: &HalfEdgeMesh, chart: &Chart) -> Vec<ChartParam> {
    let param = parameterize_chart(mesh, chart);
    if chart.faces.len() < 2 || param.flipped_faces(mesh) == 0 {
        return vec![param];
    }

    log::debug!(
        "chart with {} faces folds over ({} flipped), splitting",
        chart.faces.len(),
        param.flipped_faces(mesh)
    );
    split_chart(mesh, &chart.faces)
        .into_iter()
        .flat_map(|faces| parameterize_or_split(mesh, &Chart::from_faces(mesh, faces)))
        .collect()
}

/// Flatten one chart without splitting it.
pub fn parameterize_chart(mesh: &HalfEdgeMesh, chart: &Chart) -> ChartParam {
    let merged = collapsed_corners(mesh, &chart.faces);
    let mut local: HashMap<VertexId, usize> = HashMap::new();
    let mut vertices = Vec::new();
    let triangles: Vec<[usize; 3]> = chart
        .faces
        .iter()
        .map(|&f| {
            mesh.face_triangle(f).map(|v| {
                let rep = find(&merged, mesh.colocal(v));
                *local.entry(rep).or_insert_with(|| {
                    vertices.push(rep);
                    vertices.len() - 1
                })
            })
        })
        .collect();
    let positions: Vec<Point3<f64>> = vertices.iter().map(|&v| *mesh.position(v)).collect();

    let options = LSCMOptions::default();
    let (mut uvs, method) = match lscm(&positions, &triangles, &options) {
        Ok(uvs) => (uvs, ParamMethod::Lscm),
        Err(e) => {
            log::debug!("LSCM failed for chart with {} faces: {}", chart.faces.len(), e);
            (project_to_plane(chart, &positions), ParamMethod::Projection)
        }
    };

    let uv_area = uvs.total_area(&triangles);
    if uv_area > 0.0 && chart.area > 0.0 && uv_area.is_finite() {
        uvs.scale((chart.area / uv_area).sqrt());
    }
    uvs.align_to_min_bounding_box();
    uvs.anchor_at_origin();

    ChartParam {
        faces: chart.faces.clone(),
        vertices,
        triangles,
        uvs,
        area: chart.area,
        method,
    }
}

/// Links between colocal representatives that meet at equal positions
/// inside one face. Every link points to the smaller id.
fn collapsed_corners(mesh: &HalfEdgeMesh, faces: &[FaceId]) -> HashMap<VertexId, VertexId> {
    let mut merged = HashMap::new();
    for &f in faces {
        let reps = mesh.face_triangle(f).map(|v| mesh.colocal(v));
        for (j, k) in [(0, 1), (1, 2), (2, 0)] {
            if mesh.position(reps[j]) != mesh.position(reps[k]) {
                continue;
            }
            let (a, b) = (find(&merged, reps[j]), find(&merged, reps[k]));
            if a != b {
                merged.insert(a.max(b), a.min(b));
            }
        }
    }
    merged
}

fn find(merged: &HashMap<VertexId, VertexId>, mut v: VertexId) -> VertexId {
    while let Some(&parent) = merged.get(&v) {
        v = parent;
    }
    v
}

/// Orthogonal projection onto the chart's proxy plane.
fn project_to_plane(chart: &Chart, positions: &[Point3<f64>]) -> UVMap {
    let normal = chart.proxy_normal();
    let normal = if normal == Vector3::zeros() { Vector3::z() } else { normal };
    let (tangent, bitangent) = plane_basis(&normal);
    let origin = chart.proxy_origin();

    let coords = positions
        .iter()
        .map(|p| {
            let d = p - origin;
            let uv = Point2::new(d.dot(&tangent), d.dot(&bitangent));
            if uv.x.is_finite() && uv.y.is_finite() {
                uv
            } else {
                Point2::origin()
            }
        })
        .collect();
    UVMap::new(coords)
}

/// Right-handed tangent frame `(t, b)` with `t x b = n`.
fn plane_basis(n: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        Vector3::x()
    } else if n.y.abs() <= n.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let tangent = (helper - n * n.dot(&helper)).normalize();
    let bitangent = n.cross(&tangent);
    (tangent, bitangent)
}

/// Split faces into a connected first half (in breadth-first order) and the
/// connected components of the rest.
fn split_chart(mesh: &HalfEdgeMesh, faces: &[FaceId]) -> Vec<Vec<FaceId>> {
    let members: HashSet<FaceId> = faces.iter().copied().collect();
    let order = breadth_first(mesh, faces[0], &members);

    // Faces unreachable from the seed (disconnected charts) go with the rest.
    let half = order.len().div_ceil(2).min(order.len().saturating_sub(1)).max(1);
    let first: Vec<FaceId> = order[..half].to_vec();
    let taken: HashSet<FaceId> = first.iter().copied().collect();
    let rest: Vec<FaceId> = faces.iter().copied().filter(|f| !taken.contains(f)).collect();

    let mut parts = vec![first];
    let mut remaining: HashSet<FaceId> = rest.iter().copied().collect();
    for &f in &rest {
        if remaining.contains(&f) {
            let component = breadth_first(mesh, f, &remaining);
            for g in &component {
                remaining.remove(g);
            }
            parts.push(component);
        }
    }
    parts
}

fn breadth_first(mesh: &HalfEdgeMesh, seed: FaceId, members: &HashSet<FaceId>) -> Vec<FaceId> {
    let mut visited = HashSet::from([seed]);
    let mut queue = VecDeque::from([seed]);
    let mut order = Vec::new();

    while let Some(f) = queue.pop_front() {
        order.push(f);
        for he in mesh.face_halfedges(f) {
            if let Some(g) = mesh.opposite_face(he) {
                if members.contains(&g) && visited.insert(g) {
                    queue.push_back(g);
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::charts::{build_charts, CharterOptions};
    use crate::algo::Progress;
    use crate::mesh::{build_mesh, IndexData, InputMesh};
    use nalgebra::Vector2;

    fn build(positions: &[[f32; 3]], indices: &[u32]) -> HalfEdgeMesh {
        let input = InputMesh::from_positions(positions, IndexData::U32(indices));
        build_mesh(&input, true, &mut |_| {}).unwrap()
    }

    fn all_faces(mesh: &HalfEdgeMesh) -> Chart {
        Chart::from_faces(mesh, mesh.face_ids().collect())
    }

    #[test]
    fn test_single_triangle_keeps_shape() {
        let mesh = build(&[[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 4.0, 0.0]], &[0, 1, 2]);
        let param = parameterize_chart(&mesh, &all_faces(&mesh));
        assert_eq!(param.method, ParamMethod::Lscm);
        assert_eq!(param.vertices.len(), 3);
        assert!((param.uv_area() - 6.0).abs() < 1e-6);
        let (min, _) = param.uvs.bounding_box().unwrap();
        assert!(min.x.abs() < 1e-12 && min.y.abs() < 1e-12);
        assert_eq!(param.flipped_faces(&mesh), 0);
    }

    #[test]
    fn test_closed_chart_falls_back_to_projection() {
        // Tetrahedron forced into one chart.
        let mesh = build(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.5, 0.5, 1.0]],
            &[0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3],
        );
        let param = parameterize_chart(&mesh, &all_faces(&mesh));
        assert_eq!(param.method, ParamMethod::Projection);
        assert_eq!(param.faces.len(), 4);
    }

    #[test]
    fn test_folded_chart_is_split() {
        // Tetrahedron as one chart folds under projection, so it gets split.
        let mesh = build(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.5, 0.5, 1.0]],
            &[0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3],
        );
        let params = parameterize_charts(&mesh, &[all_faces(&mesh)], false);
        assert!(params.len() >= 2);

        let mut seen = vec![0; mesh.num_faces()];
        for p in &params {
            assert_eq!(p.flipped_faces(&mesh), 0);
            for f in &p.faces {
                seen[f.index()] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_welded_seam_shares_local_vertex() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let mesh = build(&positions, &[0, 1, 2, 3, 4, 5]);
        let charts = build_charts(&mesh, &CharterOptions::default(), &Progress::none());
        assert_eq!(charts.len(), 1);
        let params = parameterize_charts(&mesh, &charts, true);
        assert_eq!(params[0].vertices.len(), 4);
        assert!((params[0].uv_area() - 1.0).abs() < 1e-6);
    }

    /// Two triangles fanned around a point that is split into vertices 0 and
    /// 1, joined by a zero-area face. Built without welding.
    fn split_fan() -> HalfEdgeMesh {
        let positions = [[0.0f32, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]];
        let indices = [0u32, 2, 3, 1, 3, 4, 0, 3, 1];
        let input = InputMesh::from_positions(&positions, IndexData::U32(&indices));
        build_mesh(&input, false, &mut |_| {}).unwrap()
    }

    #[test]
    fn test_equal_corners_share_local_vertex() {
        let mesh = split_fan();
        let param = parameterize_chart(&mesh, &all_faces(&mesh));
        assert_eq!(param.vertices.len(), 4);
        assert_eq!(param.vertices[0], VertexId::new(0));
        assert_eq!(param.triangles[2][0], param.triangles[2][2]);
        assert_eq!(param.uvs.signed_area(&param.triangles[2]), 0.0);
        assert!((param.uv_area() - 1.0).abs() < 1e-6);
        assert_eq!(param.flipped_faces(&mesh), 0);
    }

    #[test]
    fn test_opened_zero_area_face_counts_as_flipped() {
        let mesh = split_fan();
        let mut param = parameterize_chart(&mesh, &all_faces(&mesh));
        let [a, b, _] = param.triangles[2];

        // Give the collapsed corner its own UV, off the a-b edge.
        let mut coords = param.uvs.as_slice().to_vec();
        let d = coords[b] - coords[a];
        coords.push(coords[a] + Vector2::new(-d.y, d.x));
        param.triangles[2] = [a, b, coords.len() - 1];
        param.uvs = UVMap::new(coords);
        assert_eq!(param.flipped_faces(&mesh), 1);
    }

    #[test]
    fn test_split_chart_halves_are_connected() {
        // A strip of 6 triangles.
        let positions: Vec<[f32; 3]> = (0..8).map(|i| [(i / 2) as f32, (i % 2) as f32, 0.0]).collect();
        let mut indices = Vec::new();
        for q in 0..3u32 {
            let v = 2 * q;
            indices.extend_from_slice(&[v, v + 2, v + 3, v, v + 3, v + 1]);
        }
        let mesh = build(&positions, &indices);
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let parts = split_chart(&mesh, &faces);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 3);
        assert_eq!(parts[1].len(), 3);
    }

    #[test]
    fn test_plane_basis_is_right_handed() {
        for n in [Vector3::z(), Vector3::x(), -Vector3::y(), Vector3::new(1.0, 2.0, 3.0).normalize()] {
            let (t, b) = plane_basis(&n);
            assert!((t.cross(&b) - n).norm() < 1e-12);
        }
    }
}
