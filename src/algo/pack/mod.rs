//! Atlas packing.
//!
//! Places flattened charts into one or more texel pages without overlap.
//! Each chart is rasterized conservatively into a [`BitImage`] at the current
//! texel density, dilated by the padding, and placed at the first free
//! position of a row-major scan over the pages. Larger charts go first.
//!
//! Three strategies choose the density ([`PackMethod`]):
//!
//! - **TexelArea**: fixed density from [`PackerOptions::texel_area`]; one page
//!   of fixed width that grows in height.
//! - **ApproximateResolution**: estimates a density that fills about 60% of a
//!   `resolution` x `resolution` page, lowering it for up to four passes while
//!   more than one page is needed.
//! - **ExactResolution**: bisects the density for the largest one that fits a
//!   single `resolution` x `resolution` page, within an attempt budget set by
//!   [`PackerOptions::quality`].

mod bitimage;
mod raster;

use std::cmp::Reverse;
use std::fmt;

use nalgebra::Point2;
use rayon::prelude::*;

use crate::error::{AtlasError, Result};

use super::parameterize::ChartParam;
use super::Progress;

pub use bitimage::BitImage;
pub use raster::{rasterize_chart, rasterize_triangle};

/// Packing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackMethod {
    /// Density from `texel_area`; page size follows.
    TexelArea,
    /// Page size close to `resolution`; a bounded number of passes.
    #[default]
    ApproximateResolution,
    /// Page size exactly `resolution`; bisection on density. Slow.
    ExactResolution,
}

impl PackMethod {
    /// Short name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PackMethod::TexelArea => "TexelArea",
            PackMethod::ApproximateResolution => "ApproximateResolution",
            PackMethod::ExactResolution => "ExactResolution",
        }
    }
}

impl fmt::Display for PackMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for atlas packing.
#[derive(Debug, Clone)]
pub struct PackerOptions {
    /// Packing strategy.
    pub method: PackMethod,

    /// Attempt budget for [`PackMethod::ExactResolution`]: 0 is unbounded,
    /// 1 allows 4096 attempts, halving per level down to 512 at 4; any other
    /// value allows 256.
    pub quality: u32,

    /// Texels per world unit of surface area.
    pub texel_area: f32,

    /// Target page size for the resolution methods.
    pub resolution: u32,

    /// Align chart offsets and padded sizes to 4x4 texel blocks.
    pub block_align: bool,

    /// Add one texel of padding beyond `padding` around every chart.
    pub conservative: bool,

    /// Minimum distance in texels between charts.
    pub padding: u32,

    /// Try charts rotated by 90 degrees.
    pub allow_rotation: bool,

    /// Whether to rasterize and search in parallel (default: true).
    pub parallel: bool,
}

impl Default for PackerOptions {
    fn default() -> Self {
        Self {
            method: PackMethod::ApproximateResolution,
            quality: 1,
            texel_area: 8.0,
            resolution: 512,
            block_align: false,
            conservative: false,
            padding: 0,
            allow_rotation: true,
            parallel: true,
        }
    }
}

impl PackerOptions {
    /// Set the packing method.
    pub fn with_method(mut self, method: PackMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the quality level.
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    /// Set the texel density.
    pub fn with_texel_area(mut self, texel_area: f32) -> Self {
        self.texel_area = texel_area;
        self
    }

    /// Set the target resolution.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set block alignment.
    pub fn with_block_align(mut self, block_align: bool) -> Self {
        self.block_align = block_align;
        self
    }

    /// Set conservative padding.
    pub fn with_conservative(mut self, conservative: bool) -> Self {
        self.conservative = conservative;
        self
    }

    /// Set the padding in texels.
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Set whether charts may be rotated.
    pub fn with_rotation(mut self, allow_rotation: bool) -> Self {
        self.allow_rotation = allow_rotation;
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

    /// Maximum number of packing attempts, `None` for unbounded.
    pub fn attempt_budget(&self) -> Option<usize> {
        match self.quality {
            0 => None,
            1 => Some(4096),
            2 => Some(2048),
            3 => Some(1024),
            4 => Some(512),
            _ => Some(256),
        }
    }

    /// Dilation radius applied to every chart bitmap.
    pub fn dilation(&self) -> u32 {
        self.padding + u32::from(self.conservative)
    }

    fn step(&self) -> u32 {
        if self.block_align {
            4
        } else {
            1
        }
    }

    /// Check that the options are usable for the selected method.
    pub fn validate(&self) -> Result<()> {
        match self.method {
            PackMethod::TexelArea => {
                if !(self.texel_area > 0.0) || !self.texel_area.is_finite() {
                    return Err(AtlasError::invalid_param(
                        "texel_area",
                        self.texel_area,
                        "must be positive and finite",
                    ));
                }
            }
            PackMethod::ApproximateResolution | PackMethod::ExactResolution => {
                if self.resolution == 0 {
                    return Err(AtlasError::invalid_param("resolution", self.resolution, "must be positive"));
                }
            }
        }
        Ok(())
    }
}

/// Where a chart ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Page index.
    pub page: u32,
    /// Left edge of the padded chart rectangle, in texels.
    pub x: u32,
    /// Bottom edge of the padded chart rectangle, in texels.
    pub y: u32,
    /// Padded width as placed (after rotation).
    pub width: u32,
    /// Padded height as placed (after rotation).
    pub height: u32,
    /// Whether the chart was rotated by 90 degrees.
    pub rotated: bool,
    margin: u32,
}

impl Placement {
    /// Map a chart UV (world units, anchored at the origin) to page texels.
    pub fn transform(&self, uv: Point2<f64>, scale: f64) -> Point2<f64> {
        let lx = uv.x * scale + self.margin as f64;
        let ly = uv.y * scale + self.margin as f64;
        if self.rotated {
            // Before rotation the bitmap was `height` wide and `width` tall.
            Point2::new(self.x as f64 + self.width as f64 - ly, self.y as f64 + lx)
        } else {
            Point2::new(self.x as f64 + lx, self.y as f64 + ly)
        }
    }
}

/// The outcome of packing.
#[derive(Debug, Clone, Default)]
pub struct PackResult {
    /// Reported page width in texels.
    pub width: u32,
    /// Reported page height in texels.
    pub height: u32,
    /// Number of pages used.
    pub page_count: u32,
    /// Texels per world unit.
    pub scale: f64,
    /// Placement of every chart, parallel to the input.
    pub placements: Vec<Placement>,
    /// Texels covered by charts, before padding.
    pub used_texels: u64,
    /// Number of packing passes run.
    pub attempts: usize,
}

impl PackResult {
    /// Fraction of the reported page area covered by charts.
    pub fn utilization(&self) -> f64 {
        let total = self.width as f64 * self.height as f64 * self.page_count as f64;
        if total > 0.0 {
            self.used_texels as f64 / total
        } else {
            0.0
        }
    }
}

/// Pack all charts according to `options`.
pub fn pack_charts(charts: &[ChartParam], options: &PackerOptions, progress: &Progress) -> Result<PackResult> {
    options.validate()?;
    if charts.is_empty() {
        return Ok(PackResult::default());
    }

    let result = match options.method {
        PackMethod::TexelArea => pack_texel_area(charts, options),
        PackMethod::ApproximateResolution => pack_approximate(charts, options, progress),
        PackMethod::ExactResolution => pack_exact(charts, options, progress),
    };

    log::debug!(
        "{}: {} charts on {} page(s) of {}x{} at {:.4} texels/unit after {} attempt(s)",
        options.method,
        charts.len(),
        result.page_count,
        result.width,
        result.height,
        result.scale,
        result.attempts
    );
    Ok(result)
}

fn pack_texel_area(charts: &[ChartParam], options: &PackerOptions) -> PackResult {
    let scale = (options.texel_area as f64).sqrt();
    let bitmaps = build_bitmaps(charts, scale, options);

    let total: u64 = bitmaps.iter().map(|b| b.dilated.width() as u64 * b.dilated.height() as u64).sum();
    let widest = bitmaps
        .iter()
        .map(|b| {
            let (w, h) = (b.dilated.width(), b.dilated.height());
            if options.allow_rotation {
                w.min(h)
            } else {
                w
            }
        })
        .max()
        .unwrap_or(1);
    let mut width = ((total as f64).sqrt().ceil() as u32).max(widest).max(1);
    if options.block_align {
        width = align4(width);
    }

    let layout = place_charts(&bitmaps, width, None, options);
    let (used_w, used_h) = layout.used_extent();
    PackResult {
        width: used_w,
        height: used_h,
        page_count: layout.page_count,
        scale,
        used_texels: layout.used_texels,
        placements: layout.placements,
        attempts: 1,
    }
}

fn pack_approximate(charts: &[ChartParam], options: &PackerOptions, progress: &Progress) -> PackResult {
    const PASSES: usize = 4;
    let resolution = options.resolution;
    let total_area: f64 = charts.iter().map(|c| c.area).sum();

    let max_scale = max_scale(charts, options);
    let estimate = if total_area > 0.0 {
        (0.6 * resolution as f64 * resolution as f64 / total_area).sqrt()
    } else {
        1.0
    };
    let mut scale = estimate.min(max_scale);

    let mut attempts = 0;
    loop {
        progress.report(attempts, PASSES, "Packing charts");
        let bitmaps = build_bitmaps(charts, scale, options);
        let layout = place_charts(&bitmaps, resolution, Some(resolution), options);
        attempts += 1;

        if layout.page_count <= 1 || attempts == PASSES {
            let (used_w, used_h) = layout.used_extent();
            return PackResult {
                width: used_w,
                height: used_h,
                page_count: layout.page_count,
                scale,
                used_texels: layout.used_texels,
                placements: layout.placements,
                attempts,
            };
        }
        scale *= 0.9;
    }
}

fn pack_exact(charts: &[ChartParam], options: &PackerOptions, progress: &Progress) -> PackResult {
    let resolution = options.resolution;
    let budget = options.attempt_budget();
    let max_extent = charts
        .iter()
        .map(|c| {
            let e = c.uvs.extent();
            e.x.max(e.y)
        })
        .fold(0.0, f64::max);

    let attempt = |scale: f64| {
        let bitmaps = build_bitmaps(charts, scale, options);
        place_charts(&bitmaps, resolution, Some(resolution), options)
    };
    let fits = |layout: &Layout| layout.page_count <= 1 && !layout.oversized;

    let mut hi = max_scale(charts, options);
    if !hi.is_finite() {
        hi = 1.0;
    }
    let mut lo = 0.0;
    let mut attempts = 1;
    let first = attempt(hi);

    let (scale, layout) = if fits(&first) || max_extent <= 0.0 {
        (hi, first)
    } else {
        let mut best: Option<(f64, Layout)> = None;
        let mut lowest = (hi, first);
        // Stop once the density interval moves chart sizes by less than a
        // thousandth of a texel.
        while (hi - lo) * max_extent > 1e-3 && budget.map_or(true, |b| attempts < b) {
            let mid = 0.5 * (lo + hi);
            let layout = attempt(mid);
            attempts += 1;
            if let Some(b) = budget {
                progress.report(attempts, b, "Packing charts");
            }
            if fits(&layout) {
                lo = mid;
                best = Some((mid, layout));
            } else {
                hi = mid;
                lowest = (mid, layout);
            }
        }
        best.unwrap_or(lowest)
    };

    PackResult {
        width: resolution,
        height: resolution,
        page_count: layout.page_count,
        scale,
        used_texels: layout.used_texels,
        placements: layout.placements,
        attempts,
    }
}

/// Largest density at which every chart fits a `resolution` page.
fn max_scale(charts: &[ChartParam], options: &PackerOptions) -> f64 {
    let max_extent = charts
        .iter()
        .map(|c| {
            let e = c.uvs.extent();
            e.x.max(e.y)
        })
        .fold(0.0, f64::max);
    if max_extent <= 0.0 {
        return f64::INFINITY;
    }
    // Rounding up, dilation and block alignment each take a few texels.
    let available = options.resolution as f64 - 2.0 * options.dilation() as f64 - 4.0;
    available.max(1.0) / max_extent
}

#[inline]
fn align4(v: u32) -> u32 {
    v.div_ceil(4) * 4
}

/// Bitmaps of one chart at one density: `raw` coverage is committed to the
/// page, `dilated` coverage is tested against it.
struct ChartBitmap {
    raw: BitImage,
    dilated: BitImage,
}

fn build_bitmaps(charts: &[ChartParam], scale: f64, options: &PackerOptions) -> Vec<ChartBitmap> {
    let build = |chart: &ChartParam| rasterize_param(chart, scale, options);
    if options.parallel {
        charts.par_iter().map(build).collect()
    } else {
        charts.iter().map(build).collect()
    }
}

fn rasterize_param(chart: &ChartParam, scale: f64, options: &PackerOptions) -> ChartBitmap {
    let margin = options.dilation();
    let extent = chart.uvs.extent() * scale;
    let size = |e: f64| {
        let inner = if e.is_finite() { (e.ceil() as u32).max(1) } else { 1 };
        let padded = inner + 2 * margin;
        if options.block_align {
            align4(padded)
        } else {
            padded
        }
    };
    let mut raw = BitImage::new(size(extent.x), size(extent.y));

    let offset = margin as f64;
    let to_texel = |i: usize| {
        let uv = chart.uvs.get(i);
        Point2::new(uv.x * scale + offset, uv.y * scale + offset)
    };
    rasterize_chart(
        &mut raw,
        chart
            .triangles
            .iter()
            .map(|t| [to_texel(t[0]), to_texel(t[1]), to_texel(t[2])]),
    );

    let dilated = raw.dilated(margin);
    ChartBitmap { raw, dilated }
}

/// A page being filled.
struct Page {
    image: BitImage,
    /// `None` for pages that grow downwards without bound.
    max_height: Option<u32>,
}

#[derive(Debug, Clone)]
struct Layout {
    placements: Vec<Placement>,
    page_count: u32,
    used_texels: u64,
    oversized: bool,
}

impl Layout {
    fn used_extent(&self) -> (u32, u32) {
        self.placements.iter().fold((0, 0), |(w, h), p| (w.max(p.x + p.width), h.max(p.y + p.height)))
    }
}

/// Place charts, largest first, into pages of `width` x `height` texels.
///
/// With `height` of `None` a single page grows as needed.
fn place_charts(bitmaps: &[ChartBitmap], width: u32, height: Option<u32>, options: &PackerOptions) -> Layout {
    let mut order: Vec<usize> = (0..bitmaps.len()).collect();
    order.sort_by_key(|&i| {
        let d = &bitmaps[i].dilated;
        (Reverse(d.width() as u64 * d.height() as u64), i)
    });

    let mut pages: Vec<Page> = Vec::new();
    let mut placements = vec![None; bitmaps.len()];
    let mut oversized = false;
    let mut used_texels = 0;

    for i in order {
        let bitmap = &bitmaps[i];
        let rotated = options.allow_rotation.then(|| (bitmap.raw.rotated(), bitmap.dilated.rotated()));
        let rotated_dilated = rotated.as_ref().map(|r| &r.1);

        let found = pages.iter().enumerate().find_map(|(p, page)| {
            find_position(page, &bitmap.dilated, rotated_dilated, options).map(|(x, y, rot)| (p, x, y, rot))
        });

        let (p, x, y, rot) = match found {
            Some(found) => found,
            None => {
                let page_height = height.unwrap_or(0);
                let image = BitImage::new(width, page_height);
                let page = Page {
                    image,
                    max_height: height,
                };
                match find_position(&page, &bitmap.dilated, rotated_dilated, options) {
                    Some((x, y, rot)) => {
                        pages.push(page);
                        (pages.len() - 1, x, y, rot)
                    }
                    None => {
                        // Larger than an empty page: give it a page of its own size.
                        oversized = true;
                        let w = width.max(bitmap.dilated.width());
                        let h = page_height.max(bitmap.dilated.height());
                        pages.push(Page {
                            image: BitImage::new(w, h),
                            max_height: height.map(|_| h),
                        });
                        (pages.len() - 1, 0, 0, false)
                    }
                }
            }
        };

        let (raw, dilated) = match (&rotated, rot) {
            (Some((raw, dilated)), true) => (raw, dilated),
            _ => (&bitmap.raw, &bitmap.dilated),
        };
        pages[p].image.blit(raw, x, y);
        used_texels += raw.count_ones();
        placements[i] = Some(Placement {
            page: p as u32,
            x,
            y,
            width: dilated.width(),
            height: dilated.height(),
            rotated: rot,
            margin: options.dilation(),
        });
    }

    Layout {
        placements: placements.into_iter().flatten().collect(),
        page_count: pages.len() as u32,
        used_texels,
        oversized,
    }
}

/// First free position in row-major order; unrotated before rotated.
fn find_position(
    page: &Page,
    chart: &BitImage,
    rotated: Option<&BitImage>,
    options: &PackerOptions,
) -> Option<(u32, u32, bool)> {
    let step = options.step();
    let page_width = page.image.width();
    // Growing pages are free below their current content.
    let max_y = match page.max_height {
        Some(h) => h,
        None => align_to(page.image.height(), step),
    };

    let fits = |img: &BitImage, x: u32, y: u32| {
        x + img.width() <= page_width
            && page.max_height.map_or(true, |h| y + img.height() <= h)
            && !page.image.overlaps(img, x, y)
    };
    let candidates = [Some(chart), rotated];
    let min_width = candidates.iter().flatten().map(|c| c.width()).min().unwrap_or(0);
    if min_width > page_width {
        return None;
    }
    let max_x = page_width - min_width;

    let scan_row = |iy: u32| {
        let y = iy * step;
        (0..=max_x / step).map(|ix| ix * step).find_map(|x| {
            candidates.into_iter().enumerate().find_map(|(r, c)| match c {
                Some(img) if fits(img, x, y) => Some((x, y, r == 1)),
                _ => None,
            })
        })
    };

    let rows = max_y / step + 1;
    if options.parallel {
        (0..rows).into_par_iter().find_map_first(scan_row)
    } else {
        (0..rows).find_map(scan_row)
    }
}

#[inline]
fn align_to(v: u32, step: u32) -> u32 {
    v.div_ceil(step) * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::parameterize::{ParamMethod, UVMap};
    use crate::mesh::{FaceId, VertexId};

    /// A rectangular chart of `w` x `h` world units made of two triangles.
    fn rect(w: f64, h: f64) -> ChartParam {
        ChartParam {
            faces: vec![FaceId::new(0), FaceId::new(1)],
            vertices: (0..4).map(VertexId::new).collect(),
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            uvs: UVMap::new(vec![
                Point2::new(0.0, 0.0),
                Point2::new(w, 0.0),
                Point2::new(w, h),
                Point2::new(0.0, h),
            ]),
            area: w * h,
            method: ParamMethod::Lscm,
        }
    }

    /// Checks that rectangular charts keep `padding` texels apart. Only valid
    /// for rectangles with whole-texel extents, which cover their padded
    /// bitmap minus the margin exactly.
    fn assert_no_overlap(result: &PackResult, padding: u32) {
        let inner = |p: &Placement| (p.x + p.margin, p.y + p.margin, p.x + p.width - p.margin, p.y + p.height - p.margin);
        let p = &result.placements;
        for i in 0..p.len() {
            for j in (i + 1)..p.len() {
                if p[i].page != p[j].page {
                    continue;
                }
                let (ax0, ay0, ax1, ay1) = inner(&p[i]);
                let (bx0, by0, bx1, by1) = inner(&p[j]);
                let disjoint = ax1 + padding <= bx0
                    || bx1 + padding <= ax0
                    || ay1 + padding <= by0
                    || by1 + padding <= ay0;
                assert!(disjoint, "{:?} too close to {:?}", p[i], p[j]);
            }
        }
    }

    #[test]
    fn test_texel_area_single_chart() {
        let charts = vec![rect(2.0, 1.0)];
        let options = PackerOptions::default()
            .with_method(PackMethod::TexelArea)
            .with_texel_area(16.0)
            .with_rotation(false);
        let result = pack_charts(&charts, &options, &Progress::none()).unwrap();
        assert_eq!(result.scale, 4.0);
        assert_eq!(result.page_count, 1);
        assert_eq!((result.width, result.height), (8, 4));
        assert_eq!(result.used_texels, 32);
        assert!((result.utilization() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_squares_do_not_overlap() {
        let charts: Vec<_> = (0..10).map(|_| rect(1.0, 1.0)).collect();
        let options = PackerOptions::default()
            .with_method(PackMethod::TexelArea)
            .with_texel_area(16.0)
            .with_padding(1);
        let result = pack_charts(&charts, &options, &Progress::none()).unwrap();
        assert_eq!(result.placements.len(), 10);
        assert_no_overlap(&result, 1);
    }

    #[test]
    fn test_block_align_multiples_of_four() {
        let charts: Vec<_> = (1..6).map(|i| rect(i as f64 * 0.7, 1.3)).collect();
        let options = PackerOptions::default().with_block_align(true).with_padding(1).with_resolution(64);
        let result = pack_charts(&charts, &options, &Progress::none()).unwrap();
        for p in &result.placements {
            assert_eq!(p.x % 4, 0);
            assert_eq!(p.y % 4, 0);
            assert_eq!(p.width % 4, 0);
            assert_eq!(p.height % 4, 0);
        }
        assert_eq!(result.width % 4, 0);
        assert_eq!(result.height % 4, 0);
    }

    #[test]
    fn test_approximate_stays_within_resolution() {
        let charts: Vec<_> = (0..20).map(|i| rect(1.0 + (i % 3) as f64, 1.0)).collect();
        let options = PackerOptions::default().with_resolution(128);
        let result = pack_charts(&charts, &options, &Progress::none()).unwrap();
        assert_eq!(result.page_count, 1);
        assert!(result.width <= 128 && result.height <= 128);
        assert!(result.attempts <= 4);
    }

    #[test]
    fn test_exact_reports_resolution() {
        let charts: Vec<_> = (0..6).map(|_| rect(1.0, 1.0)).collect();
        let options = PackerOptions::default()
            .with_method(PackMethod::ExactResolution)
            .with_resolution(32)
            .with_quality(4);
        let result = pack_charts(&charts, &options, &Progress::none()).unwrap();
        assert_eq!((result.width, result.height), (32, 32));
        assert_eq!(result.page_count, 1);
        assert!(result.attempts <= 512);
        // Six unit squares fit a 32x32 page at up to 10 texels per unit.
        assert!(result.scale > 9.9 && result.scale <= 10.0);
        for p in &result.placements {
            assert!(p.x + p.width <= 32 && p.y + p.height <= 32);
        }
    }

    #[test]
    fn test_rotation_used_for_tall_charts() {
        // A tall chart on a short growing page only fits rotated.
        let charts = vec![rect(4.0, 1.0), rect(1.0, 4.0)];
        let options = PackerOptions::default().with_method(PackMethod::TexelArea).with_texel_area(1.0);
        let result = pack_charts(&charts, &options, &Progress::none()).unwrap();
        assert!(result.placements.iter().any(|p| p.rotated));
        assert_no_overlap(&result, 0);
    }

    #[test]
    fn test_transform_rotated() {
        let p = Placement {
            page: 0,
            x: 10,
            y: 20,
            width: 3,
            height: 5,
            rotated: true,
            margin: 0,
        };
        // Unrotated bitmap is 5 wide and 3 tall; (0, 0) maps to the right edge.
        assert_eq!(p.transform(Point2::new(0.0, 0.0), 1.0), Point2::new(13.0, 20.0));
        assert_eq!(p.transform(Point2::new(5.0, 3.0), 1.0), Point2::new(10.0, 25.0));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let charts: Vec<_> = (0..12).map(|i| rect(0.5 + (i % 4) as f64 * 0.3, 0.8)).collect();
        let options = PackerOptions::default().with_resolution(64).with_padding(2);
        let a = pack_charts(&charts, &options, &Progress::none()).unwrap();
        let b = pack_charts(&charts, &options.clone().sequential(), &Progress::none()).unwrap();
        assert_eq!(a.placements, b.placements);
        assert_eq!((a.width, a.height), (b.width, b.height));
    }

    #[test]
    fn test_quality_budget() {
        let budget = |q| PackerOptions::default().with_quality(q).attempt_budget();
        assert_eq!(budget(0), None);
        assert_eq!(budget(1), Some(4096));
        assert_eq!(budget(4), Some(512));
        assert_eq!(budget(9), Some(256));
    }

    #[test]
    fn test_validate() {
        let bad = PackerOptions::default().with_resolution(0);
        assert!(pack_charts(&[rect(1.0, 1.0)], &bad, &Progress::none()).is_err());
        let bad = PackerOptions::default().with_method(PackMethod::TexelArea).with_texel_area(0.0);
        assert!(bad.validate().is_err());
    }
}
