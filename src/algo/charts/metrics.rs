//! Chart growth cost terms.
//!
//! Each term is a pure function of the chart's running state and the
//! candidate face. [`Metrics::weighted`] combines them with the weights from
//! [`CharterOptions`].

use std::f64::consts::PI;

use nalgebra::Vector3;

use super::CharterOptions;

/// Normal seam weights at or above this turn normal seams into hard cuts.
pub const HARD_NORMAL_SEAM_WEIGHT: f32 = 1000.0;

/// Deviation of a face normal from the chart proxy normal, in `[0, 2]`.
pub fn proxy_fit(face_normal: &Vector3<f64>, proxy_normal: &Vector3<f64>) -> f64 {
    (1.0 - face_normal.dot(proxy_normal)).clamp(0.0, 2.0)
}

/// Isoperimetric ratio `L^2 / (4 pi A)` after the candidate is added, or 0
/// if adding it keeps the chart at least as round as before.
pub fn roundness(old_boundary: f64, old_area: f64, new_boundary: f64, new_area: f64) -> f64 {
    if new_area <= 0.0 {
        return 0.0;
    }
    let new_ratio = new_boundary * new_boundary / new_area;
    if old_area > 0.0 && new_ratio <= old_boundary * old_boundary / old_area {
        return 0.0;
    }
    new_ratio / (4.0 * PI)
}

/// Reward for candidates that shorten the boundary: negative when the
/// candidate shares more edge length with the chart than it exposes.
pub fn straightness(l_in: f64, l_out: f64) -> f64 {
    let total = l_in + l_out;
    if total <= 0.0 {
        return 0.0;
    }
    ((l_out - l_in) / total).min(0.0)
}

/// Fraction of the shared edge length that lies on a seam.
pub fn seam_fraction(seam_length: f64, l_in: f64) -> f64 {
    if l_in <= 0.0 {
        return 0.0;
    }
    (seam_length / l_in).clamp(0.0, 1.0)
}

/// Material changes count this many times their length in the texture seam
/// term. At the default weights a candidate joined to its chart only across
/// material changes costs more than `max_cost`.
pub const MATERIAL_SEAM_SCALE: f64 = 8.0;

/// Texture seam term: the fraction of shared length on UV hint seams plus
/// the scaled fraction on material changes.
pub fn texture_seam(uv_seam_length: f64, material_seam_length: f64, l_in: f64) -> f64 {
    seam_fraction(uv_seam_length, l_in) + MATERIAL_SEAM_SCALE * seam_fraction(material_seam_length, l_in)
}

/// The five cost terms for one candidate face.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    /// Proxy plane deviation.
    pub proxy_fit: f64,
    /// Roundness penalty.
    pub roundness: f64,
    /// Straightness reward (non-positive).
    pub straightness: f64,
    /// Normal seam fraction.
    pub normal_seam: f64,
    /// Texture seam fraction.
    pub texture_seam: f64,
}

impl Metrics {
    /// Combine the terms into one cost.
    ///
    /// Returns infinity when a hard normal seam would be crossed.
    pub fn weighted(&self, options: &CharterOptions) -> f64 {
        if options.normal_seam_weight >= HARD_NORMAL_SEAM_WEIGHT && self.normal_seam > 0.0 {
            return f64::INFINITY;
        }
        options.proxy_fit_weight as f64 * self.proxy_fit
            + options.roundness_weight as f64 * self.roundness
            + options.straightness_weight as f64 * self.straightness
            + options.normal_seam_weight as f64 * self.normal_seam
            + options.texture_seam_weight as f64 * self.texture_seam
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_fit() {
        let z = Vector3::z();
        assert_eq!(proxy_fit(&z, &z), 0.0);
        assert!((proxy_fit(&Vector3::x(), &z) - 1.0).abs() < 1e-12);
        assert_eq!(proxy_fit(&-z, &z), 2.0);
    }

    #[test]
    fn test_roundness_only_penalizes_worsening() {
        // Unit square (L = 4, A = 1) growing into a 2x1 rectangle (L = 6, A = 2).
        let worse = roundness(4.0, 1.0, 6.0, 2.0);
        assert!((worse - 36.0 / 2.0 / (4.0 * PI)).abs() < 1e-12);
        // 2x1 rectangle completed into a 2x2 square.
        assert_eq!(roundness(6.0, 2.0, 8.0, 4.0), 0.0);
        assert_eq!(roundness(0.0, 0.0, 1.0, 0.0), 0.0);
    }

    #[test]
    fn test_straightness() {
        assert_eq!(straightness(1.0, 2.0), 0.0);
        assert!((straightness(2.0, 1.0) + 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(straightness(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_seam_fraction() {
        assert_eq!(seam_fraction(0.5, 2.0), 0.25);
        assert_eq!(seam_fraction(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_material_changes_outweigh_uv_seams() {
        assert_eq!(texture_seam(1.0, 0.0, 2.0), 0.5);
        assert_eq!(texture_seam(0.0, 1.0, 2.0), 0.5 * MATERIAL_SEAM_SCALE);
        let options = CharterOptions::default();
        let m = Metrics {
            texture_seam: texture_seam(0.0, 1.0, 1.0),
            ..Default::default()
        };
        assert!(m.weighted(&options) > options.max_cost as f64);
    }

    #[test]
    fn test_weighted_sum_and_hard_seams() {
        let m = Metrics {
            proxy_fit: 0.5,
            roundness: 1.0,
            straightness: -0.5,
            normal_seam: 0.25,
            texture_seam: 1.0,
        };
        let options = CharterOptions::default();
        let expected = 2.0 * 0.5 + 0.01 * 1.0 + 6.0 * -0.5 + 4.0 * 0.25 + 0.5 * 1.0;
        assert!((m.weighted(&options) - expected).abs() < 1e-6);

        let hard = options.with_normal_seam_weight(1000.0);
        assert_eq!(m.weighted(&hard), f64::INFINITY);
    }
}
