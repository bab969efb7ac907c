//! Conservative triangle rasterization.
//!
//! A texel is covered when the triangle overlaps its square, tested with the
//! separating axis theorem (two box axes plus the three edge normals).

use nalgebra::{Point2, Vector2};

use super::bitimage::BitImage;

/// Texel squares are shrunk by this much so that triangles merely touching a
/// texel's border do not cover it.
const TEXEL_INSET: f64 = 1e-5;

/// Mark every texel of `image` that the triangle overlaps.
pub fn rasterize_triangle(image: &mut BitImage, tri: [Point2<f64>; 3]) {
    if tri.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return;
    }

    let min_x = tri.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = tri.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = tri.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = tri.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.floor().max(0.0) as u32).min(image.width().saturating_sub(1));
    let y1 = (max_y.floor().max(0.0) as u32).min(image.height().saturating_sub(1));
    if image.width() == 0 || image.height() == 0 || x0 > x1 || y0 > y1 {
        return;
    }

    for y in y0..=y1 {
        for x in x0..=x1 {
            if triangle_overlaps_texel(&tri, x as f64, y as f64) {
                image.set(x, y);
            }
        }
    }
}

/// Rasterize a set of triangles, marking at least one texel.
///
/// Charts collapsed to a point or a line still occupy the texel holding
/// their first vertex.
pub fn rasterize_chart(image: &mut BitImage, triangles: impl IntoIterator<Item = [Point2<f64>; 3]>) {
    let mut first = None;
    for tri in triangles {
        first.get_or_insert(tri[0]);
        rasterize_triangle(image, tri);
    }

    if image.is_empty() && image.width() > 0 && image.height() > 0 {
        let p = first.unwrap_or_else(Point2::origin);
        let clamp = |v: f64, max: u32| {
            if v.is_finite() {
                (v.floor().max(0.0) as u32).min(max - 1)
            } else {
                0
            }
        };
        image.set(clamp(p.x, image.width()), clamp(p.y, image.height()));
    }
}

fn triangle_overlaps_texel(tri: &[Point2<f64>; 3], x: f64, y: f64) -> bool {
    let box_min = Point2::new(x + TEXEL_INSET, y + TEXEL_INSET);
    let box_max = Point2::new(x + 1.0 - TEXEL_INSET, y + 1.0 - TEXEL_INSET);

    // Box axes.
    if tri.iter().all(|p| p.x < box_min.x)
        || tri.iter().all(|p| p.x > box_max.x)
        || tri.iter().all(|p| p.y < box_min.y)
        || tri.iter().all(|p| p.y > box_max.y)
    {
        return false;
    }

    // Edge normals.
    let corners = [
        box_min,
        Point2::new(box_max.x, box_min.y),
        box_max,
        Point2::new(box_min.x, box_max.y),
    ];
    for i in 0..3 {
        let a = tri[i];
        let b = tri[(i + 1) % 3];
        let c = tri[(i + 2) % 3];
        let edge = b - a;
        let normal = Vector2::new(-edge.y, edge.x);
        if normal.norm_squared() == 0.0 {
            continue;
        }

        let side = normal.dot(&(c - a));
        let project = |p: &Point2<f64>| normal.dot(&(p - a));
        if side > 0.0 {
            if corners.iter().all(|p| project(p) < 0.0) {
                return false;
            }
        } else if side < 0.0 {
            if corners.iter().all(|p| project(p) > 0.0) {
                return false;
            }
        } else {
            // Degenerate triangle: the segment's line must cross the box.
            let above = corners.iter().any(|p| project(p) >= 0.0);
            let below = corners.iter().any(|p| project(p) <= 0.0);
            if !(above && below) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> [Point2<f64>; 3] {
        [Point2::new(a.0, a.1), Point2::new(b.0, b.1), Point2::new(c.0, c.1)]
    }

    #[test]
    fn test_aligned_square_covers_exact_texels() {
        let mut img = BitImage::new(8, 8);
        rasterize_chart(
            &mut img,
            [tri((1.0, 1.0), (3.0, 1.0), (3.0, 3.0)), tri((1.0, 1.0), (3.0, 3.0), (1.0, 3.0))],
        );
        assert_eq!(img.count_ones(), 4);
        assert!(img.get(1, 1) && img.get(2, 2));
        assert!(!img.get(3, 3));
    }

    #[test]
    fn test_conservative_coverage() {
        // A thin sliver crossing texels it barely touches.
        let mut img = BitImage::new(4, 4);
        rasterize_triangle(&mut img, tri((0.5, 0.5), (3.5, 0.6), (3.5, 0.5)));
        for x in 0..4 {
            assert!(img.get(x, 0), "texel {} not covered", x);
        }
        assert!(!img.get(0, 1));
    }

    #[test]
    fn test_triangle_corner_excluded() {
        // The hypotenuse cuts (1,1)'s corner region off.
        let mut img = BitImage::new(2, 2);
        rasterize_triangle(&mut img, tri((0.0, 0.0), (1.5, 0.0), (0.0, 1.5)));
        assert!(img.get(0, 0) && img.get(1, 0) && img.get(0, 1));
        assert!(!img.get(1, 1));
    }

    #[test]
    fn test_degenerate_chart_marks_one_texel() {
        let mut img = BitImage::new(3, 3);
        rasterize_chart(&mut img, [tri((1.0, 1.0), (1.0, 1.0), (1.0, 1.0))]);
        assert_eq!(img.count_ones(), 1);
        assert!(img.get(1, 1));
    }
}
