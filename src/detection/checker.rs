//! Reference chart detection and patch sampling
//!
//! Implements a single-chart heuristic:
//! - Grayscale and Canny edge detection with fixed thresholds
//! - Border-following contour extraction
//! - Quadrilateral selection by polygon approximation and maximum area
//! - Perspective rectification of the chart region
//! - Per-cell mean color sampling on the patch grid
//! - Confidence scoring from patch count and patch uniformity
//!
//! The detector assumes one unoccluded chart; it is not resilient to
//! multiple charts, partial occlusion, or extreme perspective.

use std::cmp::Ordering;

use image::{imageops, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::debug;

use crate::constants::chart::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::constants::detection::{
    CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD, MIN_CONTOUR_AREA, PATCH_COUNT_WEIGHT,
    POLY_APPROX_EPSILON, UNIFORMITY_SOFTNESS, UNIFORMITY_WEIGHT,
};

/// Smallest image edge the detector will look at; anything below cannot
/// hold a chart and is reported as not detected
const MIN_IMAGE_EDGE: u32 = 8;

/// One sampled chart patch
#[derive(Debug, Clone)]
pub struct DetectedPatch {
    /// Grid coordinate as (column, row)
    pub grid: (u32, u32),
    /// Mean color of the cell
    pub color: Rgb<u8>,
    /// Source pixel region in rectified-image coordinates
    pub region: Rect,
}

/// Outcome of a detection attempt
///
/// Absence of a chart is a normal, reportable outcome: `detected` is
/// false and `confidence` is zero. The detector never fails on malformed
/// input.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Whether a chart quadrilateral was found and sampled
    pub detected: bool,
    /// Sampled patches in row-major grid order
    pub patches: Vec<DetectedPatch>,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
    /// Chart corners in source-image coordinates, ordered TL, TR, BR, BL
    pub corners: Option<[(f32, f32); 4]>,
    /// Perspective-rectified chart region
    pub rectified: Option<RgbImage>,
}

impl DetectionResult {
    fn not_detected() -> Self {
        Self {
            detected: false,
            patches: Vec::new(),
            confidence: 0.0,
            corners: None,
            rectified: None,
        }
    }
}

/// Chart detector for a cols×rows patch grid
#[derive(Debug, Clone)]
pub struct ChartDetector {
    cols: u32,
    rows: u32,
    canny_low: f32,
    canny_high: f32,
    min_contour_area: f64,
    poly_epsilon: f64,
}

impl Default for ChartDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartDetector {
    /// Create a detector for the standard 6×4 chart with default
    /// parameters
    pub fn new() -> Self {
        Self::with_grid(DEFAULT_COLS, DEFAULT_ROWS)
    }

    /// Create a detector for a custom patch grid
    pub fn with_grid(cols: u32, rows: u32) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            canny_low: CANNY_LOW_THRESHOLD,
            canny_high: CANNY_HIGH_THRESHOLD,
            min_contour_area: MIN_CONTOUR_AREA,
            poly_epsilon: POLY_APPROX_EPSILON,
        }
    }

    /// Create a detector with custom edge/contour parameters
    pub fn with_params(
        cols: u32,
        rows: u32,
        canny_low: f32,
        canny_high: f32,
        min_contour_area: f64,
        poly_epsilon: f64,
    ) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            canny_low,
            canny_high,
            min_contour_area,
            poly_epsilon,
        }
    }

    /// Grid dimensions as (columns, rows)
    pub fn grid(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Number of patches a full detection yields
    pub fn expected_patches(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    /// Detect a chart in `image` and sample its patch colors
    ///
    /// The chart boundary is the largest quadrilateral found among the
    /// edge contours; ties resolve to the first candidate in contour
    /// scan order. Corners are ordered by polar angle around their
    /// centroid, rotated so the corner with minimal x+y comes first
    /// (TL, TR, BR, BL for an upright chart).
    pub fn detect(&self, image: &RgbImage) -> DetectionResult {
        if image.width() < MIN_IMAGE_EDGE || image.height() < MIN_IMAGE_EDGE {
            return DetectionResult::not_detected();
        }

        let gray = imageops::grayscale(image);
        let edges = canny(&gray, self.canny_low, self.canny_high);
        let contours = find_contours::<i32>(&edges);
        debug!(contours = contours.len(), "edge contours extracted");
        if contours.is_empty() {
            return DetectionResult::not_detected();
        }

        let Some(quad) = self.find_chart_quad(contours.iter().map(|c| c.points.as_slice()))
        else {
            return DetectionResult::not_detected();
        };
        let corners = order_corners(&quad);

        let Some(rectified) = self.rectify(image, &corners) else {
            return DetectionResult::not_detected();
        };

        let (patches, stds) = self.sample_patches(&rectified);
        let confidence = self.confidence(&stds);
        debug!(
            patches = patches.len(),
            confidence, "chart rectified and sampled"
        );

        DetectionResult {
            detected: true,
            patches,
            confidence,
            corners: Some(corners),
            rectified: Some(rectified),
        }
    }

    /// Largest 4-vertex polygon approximation among the contours
    fn find_chart_quad<'a>(
        &self,
        contours: impl Iterator<Item = &'a [Point<i32>]>,
    ) -> Option<Vec<Point<i32>>> {
        let mut best: Option<(Vec<Point<i32>>, f64)> = None;

        for points in contours {
            if polygon_area(points) < self.min_contour_area {
                continue;
            }
            let epsilon = self.poly_epsilon * arc_length(points, true);
            let approx = approximate_polygon_dp(points, epsilon, true);
            if approx.len() != 4 {
                continue;
            }
            let area = polygon_area(&approx);
            // Strict comparison keeps the first candidate on ties
            if best.as_ref().map_or(true, |(_, best_area)| area > *best_area) {
                best = Some((approx, area));
            }
        }

        best.map(|(quad, _)| quad)
    }

    /// Warp the chart quadrilateral to an axis-aligned rectangle sized
    /// by the corner-to-corner edge lengths
    fn rectify(&self, image: &RgbImage, corners: &[(f32, f32); 4]) -> Option<RgbImage> {
        let width = distance(corners[0], corners[1]).round() as u32;
        let height = distance(corners[1], corners[2]).round() as u32;
        if width < self.cols || height < self.rows {
            return None;
        }

        let target = [
            (0.0, 0.0),
            (width as f32, 0.0),
            (width as f32, height as f32),
            (0.0, height as f32),
        ];
        let projection = Projection::from_control_points(*corners, target)?;

        let mut rectified = RgbImage::new(width, height);
        warp_into(
            image,
            &projection,
            Interpolation::Bilinear,
            Rgb([0, 0, 0]),
            &mut rectified,
        );
        Some(rectified)
    }

    /// Partition the rectified chart into grid cells and take per-cell
    /// means; returns the patches in row-major order together with each
    /// patch's mean channel standard deviation
    fn sample_patches(&self, rectified: &RgbImage) -> (Vec<DetectedPatch>, Vec<f32>) {
        let cell_w = rectified.width() / self.cols;
        let cell_h = rectified.height() / self.rows;

        let mut patches = Vec::with_capacity(self.expected_patches());
        let mut stds = Vec::with_capacity(self.expected_patches());

        for row in 0..self.rows {
            for col in 0..self.cols {
                let x0 = col * cell_w;
                let y0 = row * cell_h;

                let mut sum = [0.0f64; 3];
                let mut sum_sq = [0.0f64; 3];
                for y in y0..y0 + cell_h {
                    for x in x0..x0 + cell_w {
                        let p = rectified.get_pixel(x, y);
                        for c in 0..3 {
                            let v = p[c] as f64;
                            sum[c] += v;
                            sum_sq[c] += v * v;
                        }
                    }
                }

                let n = (cell_w * cell_h) as f64;
                let mut mean = [0u8; 3];
                let mut std_acc = 0.0f64;
                for c in 0..3 {
                    let m = sum[c] / n;
                    mean[c] = m.round().clamp(0.0, 255.0) as u8;
                    std_acc += (sum_sq[c] / n - m * m).max(0.0).sqrt();
                }

                patches.push(DetectedPatch {
                    grid: (col, row),
                    color: Rgb(mean),
                    region: Rect::at(x0 as i32, y0 as i32).of_size(cell_w, cell_h),
                });
                stds.push((std_acc / 3.0) as f32);
            }
        }

        (patches, stds)
    }

    /// Blend of patch coverage and patch uniformity, clamped to [0, 1]
    fn confidence(&self, stds: &[f32]) -> f32 {
        let count_score = stds.len() as f32 / self.expected_patches() as f32;
        let uniformity = if stds.is_empty() {
            0.0
        } else {
            stds.iter()
                .map(|s| 1.0 / (1.0 + s / UNIFORMITY_SOFTNESS))
                .sum::<f32>()
                / stds.len() as f32
        };
        (PATCH_COUNT_WEIGHT * count_score + UNIFORMITY_WEIGHT * uniformity).clamp(0.0, 1.0)
    }
}

/// Shoelace area of a closed polygon
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0f64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    twice_area.abs() / 2.0
}

/// Euclidean distance between two points
fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Order quad corners by polar angle around their centroid, then rotate
/// the cycle so the corner with minimal x+y comes first
fn order_corners(quad: &[Point<i32>]) -> [(f32, f32); 4] {
    let mut pts: Vec<(f32, f32)> = quad.iter().map(|p| (p.x as f32, p.y as f32)).collect();
    let cx = pts.iter().map(|p| p.0).sum::<f32>() / pts.len() as f32;
    let cy = pts.iter().map(|p| p.1).sum::<f32>() / pts.len() as f32;

    pts.sort_by(|a, b| {
        let angle_a = (a.1 - cy).atan2(a.0 - cx);
        let angle_b = (b.1 - cy).atan2(b.0 - cx);
        angle_a.partial_cmp(&angle_b).unwrap_or(Ordering::Equal)
    });

    let first = pts
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a.0 + a.1)
                .partial_cmp(&(b.0 + b.1))
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    pts.rotate_left(first);

    [pts[0], pts[1], pts[2], pts[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ReferenceChart;

    #[test]
    fn test_detects_rendered_chart() {
        let chart = ReferenceChart::color_checker();
        let image = chart.render(60, 40);

        let detector = ChartDetector::new();
        let result = detector.detect(&image);

        assert!(result.detected);
        assert!(result.confidence > 0.8, "confidence {}", result.confidence);
        assert_eq!(result.patches.len(), 24);
        assert!(result.corners.is_some());
        assert!(result.rectified.is_some());

        // Sampled colors must track the rendered reference values
        let mut total_diff = 0.0f64;
        for (patch, expected) in result.patches.iter().zip(chart.colors()) {
            for c in 0..3 {
                total_diff += (patch.color[c] as f64 - expected[c] as f64).abs();
            }
        }
        let mean_diff = total_diff / (24.0 * 3.0);
        assert!(mean_diff < 10.0, "mean channel difference {}", mean_diff);
    }

    #[test]
    fn test_patches_enumerate_row_major() {
        let image = ReferenceChart::color_checker().render(40, 30);
        let result = ChartDetector::new().detect(&image);

        let grids: Vec<(u32, u32)> = result.patches.iter().map(|p| p.grid).collect();
        assert_eq!(grids[0], (0, 0));
        assert_eq!(grids[5], (5, 0));
        assert_eq!(grids[6], (0, 1));
        assert_eq!(grids[23], (5, 3));
    }

    #[test]
    fn test_no_chart_is_a_normal_outcome() {
        let image = RgbImage::from_pixel(120, 90, Rgb([180, 180, 180]));
        let result = ChartDetector::new().detect(&image);

        assert!(!result.detected);
        assert_eq!(result.confidence, 0.0);
        assert!(result.patches.is_empty());
        assert!(result.corners.is_none());
    }

    #[test]
    fn test_degenerate_images_do_not_panic() {
        let detector = ChartDetector::new();
        assert!(!detector.detect(&RgbImage::new(0, 0)).detected);
        assert!(!detector.detect(&RgbImage::new(1, 500)).detected);
        assert!(!detector.detect(&RgbImage::new(7, 7)).detected);
    }

    #[test]
    fn test_order_corners_canonical_winding() {
        // Scrambled rectangle corners
        let quad = vec![
            Point::new(400, 300), // BR
            Point::new(100, 100), // TL
            Point::new(100, 300), // BL
            Point::new(400, 100), // TR
        ];
        let ordered = order_corners(&quad);
        assert_eq!(ordered[0], (100.0, 100.0));
        assert_eq!(ordered[1], (400.0, 100.0));
        assert_eq!(ordered[2], (400.0, 300.0));
        assert_eq!(ordered[3], (100.0, 300.0));
    }

    #[test]
    fn test_polygon_area() {
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }
}
