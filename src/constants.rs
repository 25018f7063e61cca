//! Numeric constants for chart detection and color correction
//!
//! Compile-time constants shared across the pipeline, grouped by the
//! stage they belong to. Detection values match the classical
//! Canny/contour parameters the reference chart heuristic was tuned
//! with; correction values define the lookup-table geometry.

/// D65 Standard Illuminant Reference
///
/// CIE Standard Illuminant D65 represents average daylight. All Lab
/// conversions in this crate are relative to D65; the white point here
/// is the one baked into the sRGB↔Lab chain.
pub mod d65 {
    /// D65 white point in CIE XYZ color space
    /// Source: CIE 15:2004 Colorimetry, 3rd edition
    pub const WHITE_POINT_XYZ: [f32; 3] = [0.95047, 1.00000, 1.08883];
}

/// Chart detection parameters
pub mod detection {
    /// Canny edge detection thresholds
    pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
    pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

    /// Contours below this area (in pixels) are discarded as noise
    pub const MIN_CONTOUR_AREA: f64 = 100.0;

    /// Polygon approximation epsilon as fraction of perimeter (2%)
    pub const POLY_APPROX_EPSILON: f64 = 0.02;

    /// Weight of the patch-count term in the confidence score
    pub const PATCH_COUNT_WEIGHT: f32 = 0.6;

    /// Weight of the patch-uniformity term in the confidence score
    pub const UNIFORMITY_WEIGHT: f32 = 0.4;

    /// Softness of the uniformity score: a patch whose mean channel
    /// standard deviation equals this value scores 0.5
    pub const UNIFORMITY_SOFTNESS: f32 = 50.0;
}

/// Correction model parameters
pub mod correction {
    /// Edge length of the 3-D lookup table cube
    pub const LUT_SIZE: usize = 16;

    /// Number of nearest training colors blended into each LUT cell
    pub const LUT_NEIGHBORS: usize = 4;

    /// Added to distances before inverting, so exact hits do not divide
    /// by zero
    pub const IDW_DISTANCE_EPSILON: f32 = 1e-6;

    /// Terms in the full degree-2 polynomial basis over Lab
    /// (1, L, a, b, L², a², b², La, Lb, ab)
    pub const POLY_BASIS_LEN: usize = 10;
}

/// Chart geometry defaults
pub mod chart {
    /// Default chart grid: 6 columns by 4 rows of patches
    pub const DEFAULT_COLS: u32 = 6;
    pub const DEFAULT_ROWS: u32 = 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d65_white_point() {
        assert!((d65::WHITE_POINT_XYZ[0] - 0.95047).abs() < 1e-5);
        assert!((d65::WHITE_POINT_XYZ[1] - 1.00000).abs() < 1e-5);
        assert!((d65::WHITE_POINT_XYZ[2] - 1.08883).abs() < 1e-5);
    }

    #[test]
    fn test_confidence_weights_sum_to_one() {
        let sum = detection::PATCH_COUNT_WEIGHT + detection::UNIFORMITY_WEIGHT;
        assert!((sum - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_chart_grid_matches_standard_chart() {
        assert_eq!(chart::DEFAULT_COLS * chart::DEFAULT_ROWS, 24);
    }
}
