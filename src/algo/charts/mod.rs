//! Chart generation.
//!
//! Partitions the faces of a mesh into charts by greedy region growing. A chart
//! is seeded from the lowest-index unassigned face and repeatedly extended by
//! the adjacent unassigned face with the lowest weighted cost (see
//! [`metrics`]) until no candidate is cheap enough or a size budget is hit.
//!
//! # Example
//!
//! ```
//! use mesh_atlas::algo::charts::{build_charts, CharterOptions};
//! use mesh_atlas::algo::Progress;
//! use mesh_atlas::mesh::{build_mesh, IndexData, InputMesh};
//!
//! // A flat quad made of two triangles.
//! let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
//! let indices = [0u32, 1, 2, 0, 2, 3];
//! let input = InputMesh::from_positions(&positions, IndexData::U32(&indices));
//! let mesh = build_mesh(&input, true, &mut |_| {}).unwrap();
//!
//! let charts = build_charts(&mesh, &CharterOptions::default(), &Progress::none());
//! assert_eq!(charts.len(), 1);
//! assert_eq!(charts[0].faces.len(), 2);
//! ```

pub mod metrics;

use std::collections::BTreeSet;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::{AtlasError, Result};
use crate::mesh::{ChartId, FaceId, HalfEdgeMesh};

use super::Progress;
use metrics::Metrics;

/// Options for chart generation.
///
/// Defaults are tuned for lightmap atlases.
#[derive(Debug, Clone)]
pub struct CharterOptions {
    /// Weight of the proxy plane deviation term.
    pub proxy_fit_weight: f32,

    /// Weight of the roundness term.
    pub roundness_weight: f32,

    /// Weight of the straightness term.
    pub straightness_weight: f32,

    /// Weight of the normal seam term. Values of 1000 or more make normal
    /// seams hard chart boundaries.
    pub normal_seam_weight: f32,

    /// Weight of the texture seam term (UV hint discontinuities and
    /// material changes). Material changes count eight times their length,
    /// so at the default weight faces of different materials only share a
    /// chart when they also share edges within one material.
    pub texture_seam_weight: f32,

    /// A chart stops growing before its area would exceed this.
    pub max_chart_area: f32,

    /// A chart stops growing before its boundary length would exceed this.
    pub max_boundary_length: f32,

    /// Candidates costing more than this are never added.
    pub max_cost: f32,

    /// Whether to score candidates in parallel (default: true).
    pub parallel: bool,
}

impl Default for CharterOptions {
    fn default() -> Self {
        Self {
            proxy_fit_weight: 2.0,
            roundness_weight: 0.01,
            straightness_weight: 6.0,
            normal_seam_weight: 4.0,
            texture_seam_weight: 0.5,
            max_chart_area: f32::MAX,
            max_boundary_length: f32::MAX,
            max_cost: 2.0,
            parallel: true,
        }
    }
}

impl CharterOptions {
    /// Set the proxy fit weight.
    pub fn with_proxy_fit_weight(mut self, weight: f32) -> Self {
        self.proxy_fit_weight = weight;
        self
    }

    /// Set the roundness weight.
    pub fn with_roundness_weight(mut self, weight: f32) -> Self {
        self.roundness_weight = weight;
        self
    }

    /// Set the straightness weight.
    pub fn with_straightness_weight(mut self, weight: f32) -> Self {
        self.straightness_weight = weight;
        self
    }

    /// Set the normal seam weight.
    pub fn with_normal_seam_weight(mut self, weight: f32) -> Self {
        self.normal_seam_weight = weight;
        self
    }

    /// Set the texture seam weight.
    pub fn with_texture_seam_weight(mut self, weight: f32) -> Self {
        self.texture_seam_weight = weight;
        self
    }

    /// Set the maximum chart area.
    pub fn with_max_chart_area(mut self, area: f32) -> Self {
        self.max_chart_area = area;
        self
    }

    /// Set the maximum chart boundary length.
    pub fn with_max_boundary_length(mut self, length: f32) -> Self {
        self.max_boundary_length = length;
        self
    }

    /// Set the growth cost threshold.
    pub fn with_max_cost(mut self, cost: f32) -> Self {
        self.max_cost = cost;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check that every weight and limit is usable.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("proxy_fit_weight", self.proxy_fit_weight),
            ("roundness_weight", self.roundness_weight),
            ("straightness_weight", self.straightness_weight),
            ("normal_seam_weight", self.normal_seam_weight),
            ("texture_seam_weight", self.texture_seam_weight),
        ];
        for (name, w) in weights {
            if !(w >= 0.0) || w.is_infinite() {
                return Err(AtlasError::invalid_param(name, w, "must be finite and non-negative"));
            }
        }
        if !(self.max_chart_area > 0.0) {
            return Err(AtlasError::invalid_param("max_chart_area", self.max_chart_area, "must be positive"));
        }
        if !(self.max_boundary_length > 0.0) {
            return Err(AtlasError::invalid_param(
                "max_boundary_length",
                self.max_boundary_length,
                "must be positive",
            ));
        }
        if self.max_cost.is_nan() {
            return Err(AtlasError::invalid_param("max_cost", self.max_cost, "must not be NaN"));
        }
        Ok(())
    }
}

/// A set of faces sharing one parametrization, with its growth state.
#[derive(Debug, Clone)]
pub struct Chart {
    /// Faces in the order they were added.
    pub faces: Vec<FaceId>,

    /// Total 3D area.
    pub area: f64,

    /// Length of the edges not shared between two faces of the chart.
    pub boundary_length: f64,

    normal_sum: Vector3<f64>,
    centroid_sum: Vector3<f64>,
}

impl Chart {
    fn empty() -> Self {
        Self {
            faces: Vec::new(),
            area: 0.0,
            boundary_length: 0.0,
            normal_sum: Vector3::zeros(),
            centroid_sum: Vector3::zeros(),
        }
    }

    /// Build a chart from an arbitrary set of faces of `mesh`.
    pub fn from_faces(mesh: &HalfEdgeMesh, faces: Vec<FaceId>) -> Self {
        let mut chart = Self::empty();
        let members: BTreeSet<FaceId> = faces.iter().copied().collect();

        for &f in &faces {
            chart.accumulate(mesh, f);
            for he in mesh.face_halfedges(f) {
                let inside = mesh.opposite_face(he).is_some_and(|g| members.contains(&g));
                if !inside {
                    chart.boundary_length += mesh.edge_length(he);
                }
            }
        }
        chart.faces = faces;
        chart
    }

    fn accumulate(&mut self, mesh: &HalfEdgeMesh, f: FaceId) {
        let area = mesh.face_area(f);
        if area > 0.0 {
            self.area += area;
            self.normal_sum += mesh.face_normal(f) * area;
            self.centroid_sum += mesh.face_centroid(f).coords * area;
        }
    }

    /// Unit normal of the best-fit plane, or zero for degenerate charts.
    pub fn proxy_normal(&self) -> Vector3<f64> {
        let len = self.normal_sum.norm();
        if len > 0.0 && len.is_finite() {
            self.normal_sum / len
        } else {
            Vector3::zeros()
        }
    }

    /// Area-weighted centroid, a point on the proxy plane.
    pub fn proxy_origin(&self) -> Point3<f64> {
        if self.area > 0.0 {
            Point3::from(self.centroid_sum / self.area)
        } else {
            Point3::origin()
        }
    }
}

/// Partition all faces of `mesh` into charts.
///
/// Every face ends up in exactly one chart. Output is deterministic and does
/// not depend on `options.parallel`.
pub fn build_charts(mesh: &HalfEdgeMesh, options: &CharterOptions, progress: &Progress) -> Vec<Chart> {
    let num_faces = mesh.num_faces();
    let mut owner = vec![ChartId::invalid(); num_faces];
    let mut charts = Vec::new();
    let mut num_assigned = 0;
    let mut next_seed = 0;

    while num_assigned < num_faces {
        while owner[next_seed].is_valid() {
            next_seed += 1;
        }
        let id = ChartId::new(charts.len());
        let chart = grow_chart(mesh, id, FaceId::new(next_seed), &mut owner, options);
        num_assigned += chart.faces.len();
        progress.report(num_assigned, num_faces, "Building charts");
        charts.push(chart);
    }

    log::debug!("built {} charts from {} faces", charts.len(), num_faces);
    charts
}

/// Cost of each candidate plus the state needed to commit it.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    face: FaceId,
    cost: f64,
    boundary_length: f64,
}

fn grow_chart(
    mesh: &HalfEdgeMesh,
    id: ChartId,
    seed: FaceId,
    owner: &mut [ChartId],
    options: &CharterOptions,
) -> Chart {
    let mut chart = Chart::empty();
    let mut frontier = BTreeSet::new();

    let perimeter: f64 = mesh.face_halfedges(seed).iter().map(|&he| mesh.edge_length(he)).sum();
    add_face(mesh, &mut chart, id, seed, perimeter, owner, &mut frontier);

    loop {
        let candidates: Vec<FaceId> = frontier.iter().copied().collect();
        let state: &[ChartId] = owner;
        let score = |&f: &FaceId| evaluate(mesh, &chart, id, state, f, options);

        let best = if options.parallel && candidates.len() > 64 {
            candidates.par_iter().map(score).min_by(compare_candidates)
        } else {
            candidates.iter().map(score).min_by(compare_candidates)
        };

        let Some(best) = best else { break };
        if !best.cost.is_finite() || best.cost > options.max_cost as f64 {
            break;
        }
        add_face(mesh, &mut chart, id, best.face, best.boundary_length, owner, &mut frontier);
    }

    chart
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    a.cost.total_cmp(&b.cost).then(a.face.cmp(&b.face))
}

fn add_face(
    mesh: &HalfEdgeMesh,
    chart: &mut Chart,
    id: ChartId,
    f: FaceId,
    boundary_length: f64,
    owner: &mut [ChartId],
    frontier: &mut BTreeSet<FaceId>,
) {
    owner[f.index()] = id;
    frontier.remove(&f);
    chart.accumulate(mesh, f);
    chart.boundary_length = boundary_length;
    chart.faces.push(f);

    for he in mesh.face_halfedges(f) {
        if let Some(g) = mesh.opposite_face(he) {
            if !owner[g.index()].is_valid() {
                frontier.insert(g);
            }
        }
    }
}

/// Score adding the unassigned face `f` to chart `id`.
fn evaluate(
    mesh: &HalfEdgeMesh,
    chart: &Chart,
    id: ChartId,
    owner: &[ChartId],
    f: FaceId,
    options: &CharterOptions,
) -> Candidate {
    let reject = |boundary_length| Candidate {
        face: f,
        cost: f64::INFINITY,
        boundary_length,
    };

    let face_normal = mesh.face_normal(f);
    let proxy_normal = chart.proxy_normal();
    let degenerate = face_normal == Vector3::zeros() || proxy_normal == Vector3::zeros();
    if !degenerate && face_normal.dot(&proxy_normal) <= 0.0 {
        return reject(chart.boundary_length);
    }

    // Edges shared with the chart (l_in) versus exposed edges (l_out).
    let mut l_in = 0.0;
    let mut l_out = 0.0;
    let mut normal_seam = 0.0;
    let mut texture_seam = 0.0;
    let mut material_seam = 0.0;
    for he in mesh.face_halfedges(f) {
        let len = mesh.edge_length(he);
        let shared = mesh.opposite_face(he).is_some_and(|g| owner[g.index()] == id);
        if shared {
            l_in += len;
            if mesh.is_normal_seam(he) {
                normal_seam += len;
            }
            if mesh.is_material_seam(he) {
                material_seam += len;
            } else if mesh.is_texture_seam(he) {
                texture_seam += len;
            }
        } else {
            l_out += len;
        }
    }

    let new_area = chart.area + mesh.face_area(f);
    let new_boundary = chart.boundary_length + l_out - l_in;
    if new_area > options.max_chart_area as f64 || new_boundary > options.max_boundary_length as f64 {
        return reject(new_boundary);
    }

    let m = Metrics {
        proxy_fit: metrics::proxy_fit(&face_normal, &proxy_normal),
        roundness: metrics::roundness(chart.boundary_length, chart.area, new_boundary, new_area),
        straightness: metrics::straightness(l_in, l_out),
        normal_seam: metrics::seam_fraction(normal_seam, l_in),
        texture_seam: metrics::texture_seam(texture_seam, material_seam, l_in),
    };

    let cost = m.weighted(options);
    Candidate {
        face: f,
        cost: if cost.is_nan() { f64::INFINITY } else { cost },
        boundary_length: new_boundary,
    }
}
