//! Least squares conformal flattening.
//!
//! Minimizes, over all triangles, the area-weighted squared violation of the
//! Cauchy-Riemann equations between each triangle's plane and the UV plane.
//! The energy is invariant under similarity transforms, so the two boundary
//! vertices farthest apart are fixed on the u axis. Fixed vertices are
//! eliminated from the unknowns instead of being penalized.
//!
//! # References
//!
//! - Lévy, Petitjean, Ray, Maillot. "Least squares conformal maps for
//!   automatic texture atlas generation", SIGGRAPH 2002.

use std::collections::HashMap;

use nalgebra::{DVector, Point2, Point3};

use crate::error::{AtlasError, Result};
use crate::mesh::DEGENERATE_AREA;

use super::sparse::{conjugate_gradient, CsrMatrix};
use super::uv::UVMap;

/// Solver settings for [`lscm`].
#[derive(Debug, Clone)]
pub struct LSCMOptions {
    /// Iteration cap for the conjugate gradient solve. Charts with many
    /// unknowns get at least four iterations per unknown.
    pub max_iterations: usize,

    /// Relative residual at which the solve stops.
    pub tolerance: f64,
}

impl Default for LSCMOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-9,
        }
    }
}

impl LSCMOptions {
    /// Replace the iteration cap.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Replace the residual tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// A vertex held at a fixed UV while the rest are solved.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pin {
    vertex: usize,
    at: Point2<f64>,
}

/// Per-triangle gradient coefficients in the triangle's own plane.
struct TriangleTerm {
    verts: [usize; 3],
    grad: [(f64, f64); 3],
    area: f64,
}

/// Flatten a triangle soup with least squares conformal maps.
///
/// Vertices that only touch degenerate triangles are not part of the
/// system; they copy the UV of the nearest solved vertex of a shared triangle.
/// The result is in world units and preserves the distance between the two
/// pinned boundary vertices.
///
/// # Errors
///
/// - [`AtlasError::EmptyMesh`] if there are no triangles
/// - [`AtlasError::DegenerateChart`] if no triangle has area
/// - [`AtlasError::NoBoundary`] if the triangles form a closed surface
/// - [`AtlasError::ConvergenceFailed`] if the solver does not converge
///
/// # Example
///
/// ```
/// use mesh_atlas::algo::parameterize::{lscm, LSCMOptions};
/// use nalgebra::Point3;
///
/// let positions = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let uv = lscm(&positions, &[[0, 1, 2], [0, 2, 3]], &LSCMOptions::default()).unwrap();
/// assert!((uv.total_area(&[[0, 1, 2], [0, 2, 3]]) - 1.0).abs() < 1e-6);
/// ```
pub fn lscm(positions: &[Point3<f64>], triangles: &[[usize; 3]], options: &LSCMOptions) -> Result<UVMap> {
    let n = positions.len();
    if n == 0 || triangles.is_empty() {
        return Err(AtlasError::EmptyMesh);
    }

    let terms: Vec<TriangleTerm> = triangles
        .iter()
        .filter_map(|tri| triangle_term(positions, tri))
        .collect();
    if terms.is_empty() {
        return Err(AtlasError::DegenerateChart);
    }

    let mut active = vec![false; n];
    for t in &terms {
        for &v in &t.verts {
            active[v] = true;
        }
    }

    let solid: Vec<[usize; 3]> = terms.iter().map(|t| t.verts).collect();
    let boundary = boundary_vertices(&solid, n);
    if boundary.is_empty() {
        return Err(AtlasError::NoBoundary);
    }

    let pins = farthest_pair(positions, &boundary);
    if !(pins[1].at.x > 0.0) {
        return Err(AtlasError::DegenerateChart);
    }

    // Free vertices get consecutive unknowns: u in [0, m), v in [m, 2m).
    let mut free = vec![usize::MAX; n];
    let mut m = 0;
    for v in 0..n {
        if active[v] && pins.iter().all(|p| p.vertex != v) {
            free[v] = m;
            m += 1;
        }
    }

    let mut coords = vec![Point2::origin(); n];
    for pin in &pins {
        coords[pin.vertex] = pin.at;
    }

    if m > 0 {
        let (matrix, rhs) = build_lscm_system(&terms, &free, m, &pins);
        let max_iter = options.max_iterations.max(4 * m);
        let solution = conjugate_gradient(&matrix, &rhs, max_iter, options.tolerance)?;

        for v in 0..n {
            if free[v] != usize::MAX {
                coords[v] = Point2::new(solution[free[v]], solution[m + free[v]]);
            }
        }
    }

    place_inactive_vertices(positions, triangles, &mut active, &mut coords);

    Ok(UVMap::new(coords))
}

fn triangle_term(positions: &[Point3<f64>], tri: &[usize; 3]) -> Option<TriangleTerm> {
    let [i, j, k] = *tri;
    if i == j || j == k || k == i {
        return None;
    }
    let pi = &positions[i];
    let e1 = positions[j] - pi;
    let e2 = positions[k] - pi;

    let e1_len = e1.norm();
    let normal = e1.cross(&e2);
    let area = normal.norm() * 0.5;
    if !(area > DEGENERATE_AREA) || !area.is_finite() || !(e1_len > 0.0) {
        return None;
    }

    // Local frame: pi at origin, x-axis along e1, y-axis in the triangle plane.
    let x_axis = e1 / e1_len;
    let y_axis = normal.cross(&e1).normalize();
    let (qjx, qjy) = (e1_len, 0.0);
    let (qkx, qky) = (e2.dot(&x_axis), e2.dot(&y_axis));

    // Gradient of the linear interpolant: for vertex i,
    // d/dx = (y_j - y_k) / 2A, d/dy = (x_k - x_j) / 2A (cyclic).
    let inv_2a = 1.0 / (2.0 * area);
    let grad = [
        ((qjy - qky) * inv_2a, (qkx - qjx) * inv_2a),
        (qky * inv_2a, -qkx * inv_2a),
        (-qjy * inv_2a, qjx * inv_2a),
    ];

    Some(TriangleTerm {
        verts: [i, j, k],
        grad,
        area,
    })
}

/// Vertices on an edge used by exactly one triangle, ascending.
fn boundary_vertices(triangles: &[[usize; 3]], vertex_count: usize) -> Vec<usize> {
    let mut uses: HashMap<(usize, usize), u32> = HashMap::with_capacity(triangles.len() * 3);
    for tri in triangles {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            *uses.entry((a.min(b), a.max(b))).or_default() += 1;
        }
    }

    let mut on_boundary = vec![false; vertex_count];
    for (&(a, b), &n) in &uses {
        if n == 1 {
            on_boundary[a] = true;
            on_boundary[b] = true;
        }
    }
    (0..vertex_count).filter(|&v| on_boundary[v]).collect()
}

/// The two candidates farthest apart, the first at the origin and the
/// second on the positive u axis at their 3D distance. Ties keep the
/// earliest pair.
fn farthest_pair(positions: &[Point3<f64>], candidates: &[usize]) -> [Pin; 2] {
    let mut best = (candidates[0], candidates[0], 0.0f64);
    for (k, &a) in candidates.iter().enumerate() {
        for &b in &candidates[k + 1..] {
            let d2 = (positions[b] - positions[a]).norm_squared();
            if d2 > best.2 {
                best = (a, b, d2);
            }
        }
    }
    [
        Pin { vertex: best.0, at: Point2::origin() },
        Pin { vertex: best.1, at: Point2::new(best.2.sqrt(), 0.0) },
    ]
}

/// Build the reduced LSCM system over the free vertices.
///
/// The conformal energy of a triangle is
/// `A * ((du/dx - dv/dy)^2 + (du/dy + dv/dx)^2)`, a quadratic form in the
/// vertex UVs. Terms that couple a free unknown to a pinned value move to the
/// right-hand side.
fn build_lscm_system(
    terms: &[TriangleTerm],
    free: &[usize],
    m: usize,
    pins: &[Pin; 2],
) -> (CsrMatrix, DVector<f64>) {
    let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(terms.len() * 36);
    let mut rhs = DVector::zeros(2 * m);

    let pinned = |v: usize| pins.iter().find(|p| p.vertex == v).map(|p| (p.at.x, p.at.y));

    // (row, col, value) over u/v variables; `false` selects u, `true` selects v.
    let mut add = |row: (usize, bool), col: (usize, bool), value: f64| {
        let r = free[row.0];
        if r == usize::MAX {
            return;
        }
        let r = if row.1 { m + r } else { r };
        match pinned(col.0) {
            Some((u, v)) => {
                let fixed = if col.1 { v } else { u };
                rhs[r] -= value * fixed;
            }
            None => {
                let c = free[col.0];
                if c != usize::MAX {
                    triplets.push((r, if col.1 { m + c } else { c }, value));
                }
            }
        }
    };

    for t in terms {
        for a in 0..3 {
            let (vi, (ax_i, ay_i)) = (t.verts[a], t.grad[a]);
            for b in 0..3 {
                let (vj, (ax_j, ay_j)) = (t.verts[b], t.grad[b]);

                let uu = (ax_i * ax_j + ay_i * ay_j) * t.area;
                let uv = (ay_i * ax_j - ax_i * ay_j) * t.area;

                add((vi, false), (vj, false), uu);
                add((vi, true), (vj, true), uu);
                add((vi, false), (vj, true), uv);
                add((vi, true), (vj, false), -uv);
            }
        }
    }

    (CsrMatrix::from_triplets(2 * m, 2 * m, triplets), rhs)
}

/// Give vertices outside the solved system the UV of the closest solved
/// vertex they share a triangle with.
fn place_inactive_vertices(
    positions: &[Point3<f64>],
    triangles: &[[usize; 3]],
    active: &mut [bool],
    coords: &mut [Point2<f64>],
) {
    loop {
        let mut changed = false;
        for tri in triangles {
            for &v in tri {
                if active[v] {
                    continue;
                }
                let nearest = tri
                    .iter()
                    .filter(|&&w| active[w])
                    .min_by(|&&a, &&b| {
                        let da = (positions[a] - positions[v]).norm_squared();
                        let db = (positions[b] - positions[v]).norm_squared();
                        da.total_cmp(&db).then(a.cmp(&b))
                    });
                if let Some(&w) = nearest {
                    coords[v] = coords[w];
                    active[v] = true;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A flat `cells` x `cells` sheet of unit squares, two triangles each.
    fn sheet(cells: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let stride = cells + 1;
        let points = (0..stride * stride)
            .map(|k| Point3::new((k % stride) as f64, (k / stride) as f64, 0.0))
            .collect();
        let mut tris = Vec::with_capacity(2 * cells * cells);
        for row in 0..cells {
            for col in 0..cells {
                let corner = row * stride + col;
                tris.push([corner, corner + 1, corner + stride + 1]);
                tris.push([corner, corner + stride + 1, corner + stride]);
            }
        }
        (points, tris)
    }

    fn uv_length(uv: &UVMap, a: usize, b: usize) -> f64 {
        (uv.get(a) - uv.get(b)).norm()
    }

    #[test]
    fn test_tilted_triangle_keeps_edge_lengths() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let uv = lscm(&points, &[[0, 1, 2]], &LSCMOptions::default()).unwrap();
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            assert!((uv_length(&uv, a, b) - (points[a] - points[b]).norm()).abs() < 1e-6);
        }
        assert!(uv.signed_area(&[0, 1, 2]) > 0.0);
    }

    #[test]
    fn test_flat_sheet_unfolds_without_distortion() {
        let (points, tris) = sheet(4);
        let uv = lscm(&points, &tris, &LSCMOptions::default()).unwrap();
        assert_eq!(uv.len(), 25);
        assert!((uv.total_area(&tris) - 16.0).abs() < 1e-5);
        assert!((uv_length(&uv, 0, 24) - 32f64.sqrt()).abs() < 1e-6);
        assert!((uv_length(&uv, 6, 7) - 1.0).abs() < 1e-5);
        assert!(tris.iter().all(|t| uv.signed_area(t) > 0.0));
    }

    #[test]
    fn test_tetrahedron_has_no_boundary() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let tris = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let result = lscm(&points, &tris, &LSCMOptions::default());
        assert!(matches!(result, Err(AtlasError::NoBoundary)), "{:?}", result);
    }

    #[test]
    fn test_collinear_or_empty_input() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ];
        let options = LSCMOptions::default();
        assert!(matches!(lscm(&points, &[[0, 1, 2]], &options), Err(AtlasError::DegenerateChart)));
        assert!(matches!(lscm(&points, &[], &options), Err(AtlasError::EmptyMesh)));
    }

    #[test]
    fn test_sliver_vertex_copies_neighbor_uv() {
        // 3 sits on top of 2 and is only used by a zero-area triangle.
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let uv = lscm(&points, &[[0, 1, 2], [1, 3, 2]], &LSCMOptions::default()).unwrap();
        assert_eq!(uv.get(3), uv.get(2));
    }

    #[test]
    fn test_boundary_of_sheet_excludes_interior() {
        let (_, tris) = sheet(2);
        // Vertex 4 is the center of a 3x3 grid of points.
        assert_eq!(boundary_vertices(&tris, 9), vec![0, 1, 2, 3, 5, 6, 7, 8]);
        // Unreferenced vertices are never on the boundary.
        assert_eq!(boundary_vertices(&[[0, 1, 2]], 4), vec![0, 1, 2]);
    }

    #[test]
    fn test_tighter_solver_settings() {
        let options = LSCMOptions::default().with_max_iterations(2000).with_tolerance(1e-11);
        assert_eq!((options.max_iterations, options.tolerance), (2000, 1e-11));

        let (points, tris) = sheet(3);
        let uv = lscm(&points, &tris, &options).unwrap();
        assert!((uv.total_area(&tris) - 9.0).abs() < 1e-8);
        assert!((uv_length(&uv, 5, 6) - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_farthest_pair_lies_on_u_axis() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        let [a, b] = farthest_pair(&points, &[0, 1, 2]);
        assert_eq!((a.vertex, b.vertex), (1, 2));
        assert_eq!(a.at, Point2::origin());
        assert!((b.at.x - 5.0).abs() < 1e-12 && b.at.y == 0.0);
    }
}
