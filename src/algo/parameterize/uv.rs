//! UV coordinate storage.
//!
//! This module provides the [`UVMap`] type for storing the 2D coordinates of
//! one chart, indexed by chart-local vertex.

use nalgebra::{Point2, Vector2};

/// UV coordinates for the local vertices of a chart.
///
/// Before packing, coordinates are in world units (one UV unit per unit of
/// surface length) with the bounding box anchored at the origin.
///
/// # Example
///
/// ```
/// use mesh_atlas::algo::parameterize::UVMap;
/// use nalgebra::Point2;
///
/// let uv = UVMap::new(vec![Point2::new(1.0, 1.0), Point2::new(3.0, 1.0), Point2::new(1.0, 2.0)]);
/// assert!((uv.total_area(&[[0, 1, 2]]) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UVMap {
    coords: Vec<Point2<f64>>,
}

impl UVMap {
    /// Create a new UV map with the given coordinates.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self { coords }
    }

    /// Create a UV map filled with zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            coords: vec![Point2::origin(); n],
        }
    }

    /// Get the UV coordinates of a local vertex.
    #[inline]
    pub fn get(&self, v: usize) -> Point2<f64> {
        self.coords[v]
    }

    /// Set the UV coordinates of a local vertex.
    #[inline]
    pub fn set(&mut self, v: usize, uv: Point2<f64>) {
        self.coords[v] = uv;
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Get the raw coordinates slice.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Compute the bounding box of the UV coordinates.
    ///
    /// Returns `None` if the UV map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.coords.first()?;
        let mut min = first;
        let mut max = first;

        for uv in &self.coords {
            min.x = min.x.min(uv.x);
            min.y = min.y.min(uv.y);
            max.x = max.x.max(uv.x);
            max.y = max.y.max(uv.y);
        }

        Some((min, max))
    }

    /// Width and height of the bounding box.
    pub fn extent(&self) -> Vector2<f64> {
        self.bounding_box().map(|(min, max)| max - min).unwrap_or_else(Vector2::zeros)
    }

    /// Scale all coordinates uniformly about the origin.
    pub fn scale(&mut self, factor: f64) {
        for uv in &mut self.coords {
            uv.coords *= factor;
        }
    }

    /// Rotate about the origin so that the axis-aligned bounding box has the
    /// smallest area.
    ///
    /// A minimal box has one side along an edge of the convex hull, so only
    /// hull edge directions are tried. The map is left alone unless the best
    /// direction actually shrinks the box.
    pub fn align_to_min_bounding_box(&mut self) {
        let hull = convex_hull(&self.coords);
        if hull.len() < 3 {
            return;
        }

        let box_area = |c: f64, s: f64| {
            let (mut min, mut max) = (Vector2::repeat(f64::INFINITY), Vector2::repeat(f64::NEG_INFINITY));
            for p in &hull {
                let r = Vector2::new(c * p.x + s * p.y, c * p.y - s * p.x);
                min = min.inf(&r);
                max = max.sup(&r);
            }
            let e = max - min;
            e.x * e.y
        };

        let mut best = (box_area(1.0, 0.0), 1.0, 0.0);
        let current = best.0;
        for (i, a) in hull.iter().enumerate() {
            let e = hull[(i + 1) % hull.len()] - a;
            let len = e.norm();
            if len <= 0.0 {
                continue;
            }
            let (c, s) = (e.x / len, e.y / len);
            let area = box_area(c, s);
            if area < best.0 {
                best = (area, c, s);
            }
        }

        if best.0 < current * (1.0 - 1e-9) {
            let (_, c, s) = best;
            for uv in &mut self.coords {
                *uv = Point2::new(c * uv.x + s * uv.y, c * uv.y - s * uv.x);
            }
        }
    }

    /// Translate so that the bounding box starts at the origin.
    pub fn anchor_at_origin(&mut self) {
        if let Some((min, _)) = self.bounding_box() {
            for uv in &mut self.coords {
                *uv -= min.coords;
            }
        }
    }

    /// Signed area of one triangle; positive when counter-clockwise.
    pub fn signed_area(&self, tri: &[usize; 3]) -> f64 {
        let p0 = self.coords[tri[0]];
        let p1 = self.coords[tri[1]];
        let p2 = self.coords[tri[2]];
        0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y))
    }

    /// Compute the total (unsigned) area in UV space.
    pub fn total_area(&self, triangles: &[[usize; 3]]) -> f64 {
        triangles.iter().map(|t| self.signed_area(t).abs()).sum()
    }
}

/// Convex hull in counter-clockwise order (monotone chain). Empty if any
/// coordinate is not finite.
fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Vec::new();
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let cross = |o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>| (a - o).perp(&(b - o));
    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(sorted.len() + 1);
    for pass in [&sorted[..], &sorted.iter().rev().copied().collect::<Vec<_>>()[..]] {
        let start = hull.len();
        for p in pass {
            while hull.len() >= start + 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
                hull.pop();
            }
            hull.push(*p);
        }
        hull.pop();
    }
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_hull() {
        let pts = [(0.0, 0.0), (1.0, 0.0), (0.5, 0.5), (1.0, 1.0), (0.0, 1.0)].map(|(x, y)| Point2::new(x, y));
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point2::new(0.5, 0.5)));
    }

    #[test]
    fn test_align_diamond_to_axes() {
        // A unit square standing on a corner.
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let mut uv_map = UVMap::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(h, h),
            Point2::new(0.0, 2.0 * h),
            Point2::new(-h, h),
        ]);
        uv_map.align_to_min_bounding_box();
        let e = uv_map.extent();
        assert!((e.x - 1.0).abs() < 1e-9 && (e.y - 1.0).abs() < 1e-9);
        assert!((uv_map.total_area(&[[0, 1, 2], [0, 2, 3]]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_align_keeps_aligned_map() {
        let coords = vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(2.0, 1.0)];
        let mut uv_map = UVMap::new(coords.clone());
        uv_map.align_to_min_bounding_box();
        assert_eq!(uv_map.as_slice(), &coords[..]);
    }

    #[test]
    fn test_uv_map_basic() {
        let mut uv_map = UVMap::zeros(3);
        uv_map.set(1, Point2::new(1.0, 0.0));
        uv_map.set(2, Point2::new(0.5, 1.0));

        assert_eq!(uv_map.len(), 3);
        assert!(!uv_map.is_empty());
        assert_eq!(uv_map.get(0), Point2::new(0.0, 0.0));
        assert_eq!(uv_map.get(2), Point2::new(0.5, 1.0));
    }

    #[test]
    fn test_uv_map_bounding_box() {
        let uv_map = UVMap::new(vec![
            Point2::new(-1.0, 0.5),
            Point2::new(2.0, -0.5),
            Point2::new(0.5, 3.0),
        ]);

        let (min, max) = uv_map.bounding_box().unwrap();
        assert_eq!(min, Point2::new(-1.0, -0.5));
        assert_eq!(max, Point2::new(2.0, 3.0));
        assert_eq!(uv_map.extent(), Vector2::new(3.0, 3.5));
        assert!(UVMap::default().bounding_box().is_none());
    }

    #[test]
    fn test_scale_and_anchor() {
        let mut uv_map = UVMap::new(vec![Point2::new(-1.0, 2.0), Point2::new(1.0, 4.0)]);
        uv_map.scale(2.0);
        uv_map.anchor_at_origin();
        assert_eq!(uv_map.get(0), Point2::new(0.0, 0.0));
        assert_eq!(uv_map.get(1), Point2::new(4.0, 4.0));
    }

    #[test]
    fn test_signed_area_orientation() {
        let uv_map = UVMap::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ]);
        assert!((uv_map.signed_area(&[0, 1, 2]) - 0.5).abs() < 1e-12);
        assert!((uv_map.signed_area(&[0, 2, 1]) + 0.5).abs() < 1e-12);
        assert!((uv_map.total_area(&[[0, 2, 1]]) - 0.5).abs() < 1e-12);
    }
}
