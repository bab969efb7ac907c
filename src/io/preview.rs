//! Chart layout previews.
//!
//! Renders every chart of one page as a flat-colored silhouette, one color
//! per chart, so the packing can be inspected by eye.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::atlas::Atlas;
use crate::error::{AtlasError, Result};

const BACKGROUND: Rgb<u8> = Rgb([24, 24, 28]);

/// Render the charts of `page`, one pixel per texel, v pointing up.
pub fn render_page(atlas: &Atlas, page: u32) -> Result<RgbImage> {
    if !atlas.is_generated() {
        return Err(AtlasError::NotGenerated);
    }
    if page >= atlas.page_count() {
        return Err(AtlasError::invalid_param("page", page, "no such page"));
    }

    let (width, height) = (atlas.width(), atlas.height());
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    let mut chart_index = 0usize;
    for mesh in atlas.meshes() {
        for chart in &mesh.chart_array {
            let color = chart_color(chart_index);
            chart_index += 1;
            if chart.page != page {
                continue;
            }
            for tri in chart.index_array.chunks_exact(3) {
                let corners = [0, 1, 2].map(|k| mesh.vertex_array[tri[k] as usize].uv);
                fill_triangle(&mut image, corners, color);
            }
        }
    }
    Ok(image)
}

/// Render `page` and write it as PNG.
pub fn save_page<P: AsRef<Path>>(atlas: &Atlas, page: u32, path: P) -> Result<()> {
    let path = path.as_ref();
    let image = render_page(atlas, page)?;
    image.save(path).map_err(|e| AtlasError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Distinct, stable colors from a golden-ratio hue walk.
fn chart_color(index: usize) -> Rgb<u8> {
    let hue = (index as f32 * 0.618_034).fract() * 6.0;
    let x = 1.0 - (hue % 2.0 - 1.0).abs();
    let (r, g, b) = match hue as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let channel = |c: f32| (64.0 + c * 191.0) as u8;
    Rgb([channel(r), channel(g), channel(b)])
}

/// Fill pixels whose centers fall inside the triangle.
fn fill_triangle(image: &mut RgbImage, uv: [[f32; 2]; 3], color: Rgb<u8>) {
    let (w, h) = image.dimensions();
    let min_x = uv.iter().map(|p| p[0]).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let max_x = uv.iter().map(|p| p[0]).fold(f32::NEG_INFINITY, f32::max).ceil().min(w as f32) as u32;
    let min_y = uv.iter().map(|p| p[1]).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let max_y = uv.iter().map(|p| p[1]).fold(f32::NEG_INFINITY, f32::max).ceil().min(h as f32) as u32;

    let edge = |a: [f32; 2], b: [f32; 2], p: [f32; 2]| (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
    let area = edge(uv[0], uv[1], uv[2]);
    if area == 0.0 || !area.is_finite() {
        return;
    }

    for y in min_y..max_y {
        for x in min_x..max_x {
            let p = [x as f32 + 0.5, y as f32 + 0.5];
            let w0 = edge(uv[1], uv[2], p) / area;
            let w1 = edge(uv[2], uv[0], p) / area;
            let w2 = edge(uv[0], uv[1], p) / area;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                image.put_pixel(x, h - 1 - y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharterOptions, IndexData, InputMesh, PackerOptions};

    #[test]
    fn test_render_covers_charts() {
        let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let indices = [0u32, 1, 2, 0, 2, 3];
        let mut atlas = Atlas::new();
        atlas
            .add_mesh(&InputMesh::from_positions(&positions, IndexData::U32(&indices)))
            .unwrap();
        atlas.generate(&CharterOptions::default(), &PackerOptions::default()).unwrap();

        let image = render_page(&atlas, 0).unwrap();
        assert_eq!(image.dimensions(), (atlas.width(), atlas.height()));
        let filled = image.pixels().filter(|&&p| p != BACKGROUND).count();
        assert!(filled as f64 > 0.5 * (atlas.width() * atlas.height()) as f64);
    }

    #[test]
    fn test_render_requires_generate() {
        assert!(matches!(render_page(&Atlas::new(), 0), Err(AtlasError::NotGenerated)));
    }

    #[test]
    fn test_chart_colors_differ() {
        assert_ne!(chart_color(0), chart_color(1));
        assert_ne!(chart_color(1), chart_color(2));
    }
}
