//! Calibrate → correct → compare orchestration
//!
//! [`Pipeline`] wires a [`ChartDetector`] and a [`CorrectionModel`]
//! together and owns the trained/untrained lifecycle. Calibration
//! failures (no chart, wrong patch count) are ordinary outcomes carried
//! in the returned reports; only programmer misuse and processing
//! failures surface as errors.

use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chart::ReferenceChart;
use crate::color::conversion::{delta_e, rgb_to_lab};
use crate::config::PipelineConfig;
use crate::correction::{CorrectionMethod, CorrectionModel};
use crate::detection::ChartDetector;
use crate::error::{CorrectionError, Result};

/// Outcome of a calibration attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Whether the model was trained from this chart image
    pub success: bool,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
    /// Number of patches the detector sampled
    pub patch_count: usize,
}

/// Aggregated status of a `process` run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Calibration and correction both completed
    Success,
    /// The chart image did not yield a usable calibration
    CalibrationFailed,
}

/// Result of a calibrate-then-correct run
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Aggregated status
    pub status: ProcessStatus,
    /// Corrected target image; present only on success
    pub corrected: Option<RgbImage>,
    /// Diagnostics from the calibration step
    pub calibration: CalibrationReport,
    /// Strategy the pipeline corrects with
    pub method: CorrectionMethod,
}

/// Per-pixel CIE76 ΔE statistics between two images
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaEStats {
    pub mean: f32,
    pub max: f32,
    pub min: f32,
    pub std: f32,
    /// Count of pixels with ΔE > 0. This measures pixels the correction
    /// touched, not pixels it improved.
    pub changed_pixels: usize,
}

/// Color correction pipeline
///
/// A self-contained value: it holds no session or request state beyond
/// its own calibration. For concurrent readers during recalibration,
/// clone the pipeline and swap the freshly calibrated instance in.
#[derive(Debug, Clone)]
pub struct Pipeline {
    detector: ChartDetector,
    model: CorrectionModel,
    chart: ReferenceChart,
    trained: bool,
}

impl Pipeline {
    /// Create a pipeline for the standard 24-patch chart
    pub fn new(method: CorrectionMethod) -> Self {
        Self::with_chart(method, ReferenceChart::color_checker())
    }

    /// Create a pipeline for a custom reference chart
    pub fn with_chart(method: CorrectionMethod, chart: ReferenceChart) -> Self {
        let (cols, rows) = chart.grid();
        Self {
            detector: ChartDetector::with_grid(cols, rows),
            model: CorrectionModel::new(method),
            chart,
            trained: false,
        }
    }

    /// Create a pipeline from a configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configured grid does not match the
    /// standard chart; custom grids need [`Pipeline::with_chart`].
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let chart = ReferenceChart::color_checker();
        if (config.chart.cols, config.chart.rows) != chart.grid() {
            return Err(CorrectionError::invalid_input(format!(
                "configured grid {}x{} does not match the standard chart; \
                 use Pipeline::with_chart for custom charts",
                config.chart.cols, config.chart.rows
            )));
        }
        let (cols, rows) = chart.grid();
        Ok(Self {
            detector: ChartDetector::with_params(
                cols,
                rows,
                config.detection.canny_low_threshold,
                config.detection.canny_high_threshold,
                config.detection.min_contour_area,
                config.detection.poly_approx_epsilon,
            ),
            model: CorrectionModel::new(config.method),
            chart,
            trained: false,
        })
    }

    /// Strategy the pipeline corrects with
    pub fn method(&self) -> CorrectionMethod {
        self.model.method()
    }

    /// Whether `calibrate` has succeeded at least once
    pub fn is_calibrated(&self) -> bool {
        self.trained
    }

    /// Derive the correction from a photographed chart
    ///
    /// Detects the chart, pairs the sampled patch colors with the
    /// reference values in row-major grid order, and trains the model.
    /// A missing chart or wrong patch count yields a report with
    /// `success == false`; a previously trained model stays in place in
    /// that case.
    pub fn calibrate(&mut self, chart_image: &RgbImage) -> Result<CalibrationReport> {
        let detection = self.detector.detect(chart_image);

        if !detection.detected {
            info!("calibration failed: no chart detected");
            return Ok(CalibrationReport {
                success: false,
                confidence: detection.confidence,
                patch_count: detection.patches.len(),
            });
        }

        if detection.patches.len() != self.chart.len() {
            info!(
                found = detection.patches.len(),
                expected = self.chart.len(),
                "calibration failed: patch count mismatch"
            );
            return Ok(CalibrationReport {
                success: false,
                confidence: detection.confidence,
                patch_count: detection.patches.len(),
            });
        }

        let captured: Vec<_> = detection.patches.iter().map(|p| p.color).collect();
        self.model.train(self.chart.colors(), &captured)?;
        self.trained = true;

        info!(
            confidence = detection.confidence,
            patches = captured.len(),
            "calibration succeeded"
        );
        Ok(CalibrationReport {
            success: true,
            confidence: detection.confidence,
            patch_count: captured.len(),
        })
    }

    /// Apply the calibrated correction to an image
    ///
    /// # Errors
    ///
    /// Returns `NotCalibrated` if no calibration has succeeded yet.
    pub fn correct(&self, image: &RgbImage) -> Result<RgbImage> {
        if !self.trained {
            return Err(CorrectionError::NotCalibrated);
        }
        self.model.apply(image)
    }

    /// Calibrate from `chart_image`, then correct `target`
    pub fn process(&mut self, chart_image: &RgbImage, target: &RgbImage) -> Result<ProcessOutcome> {
        let calibration = self.calibrate(chart_image)?;

        if !calibration.success {
            return Ok(ProcessOutcome {
                status: ProcessStatus::CalibrationFailed,
                corrected: None,
                calibration,
                method: self.method(),
            });
        }

        let corrected = self.correct(target)?;
        Ok(ProcessOutcome {
            status: ProcessStatus::Success,
            corrected: Some(corrected),
            calibration,
            method: self.method(),
        })
    }

    /// Per-pixel CIE76 ΔE statistics between two equally sized images
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if the images differ in shape
    /// - `InvalidInput` if the images have no pixels
    pub fn compare(&self, original: &RgbImage, corrected: &RgbImage) -> Result<DeltaEStats> {
        if original.dimensions() != corrected.dimensions() {
            return Err(CorrectionError::dimensions(
                original.dimensions(),
                corrected.dimensions(),
            ));
        }
        if original.width() == 0 || original.height() == 0 {
            return Err(CorrectionError::invalid_input(
                "cannot compare zero-pixel images",
            ));
        }

        let original_lab = rgb_to_lab(original);
        let corrected_lab = rgb_to_lab(corrected);

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut max = f32::MIN;
        let mut min = f32::MAX;
        let mut changed_pixels = 0usize;

        for (&a, &b) in original_lab.pixels().iter().zip(corrected_lab.pixels()) {
            let de = delta_e(a, b);
            sum += de as f64;
            sum_sq += (de as f64) * (de as f64);
            max = max.max(de);
            min = min.min(de);
            if de > 0.0 {
                changed_pixels += 1;
            }
        }

        let n = original_lab.pixels().len() as f64;
        let mean = sum / n;
        let variance = (sum_sq / n - mean * mean).max(0.0);

        debug!(mean = mean as f32, changed_pixels, "image comparison");
        Ok(DeltaEStats {
            mean: mean as f32,
            max,
            min,
            std: variance.sqrt() as f32,
            changed_pixels,
        })
    }

    /// Concatenate two equal-height images side by side
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the heights differ.
    pub fn create_comparison_image(
        &self,
        left: &RgbImage,
        right: &RgbImage,
    ) -> Result<RgbImage> {
        if left.height() != right.height() {
            return Err(CorrectionError::dimensions(
                left.dimensions(),
                right.dimensions(),
            ));
        }

        let mut out = RgbImage::new(left.width() + right.width(), left.height());
        imageops::replace(&mut out, left, 0, 0);
        imageops::replace(&mut out, right, left.width() as i64, 0);
        Ok(out)
    }
}
