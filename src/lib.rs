//! # chartcal
//!
//! Scene color correction from a photographed reference chart.
//!
//! This library derives a per-scene color correction by locating a
//! standard patch chart inside a photograph, pairing the sampled patch
//! colors with their known reference values, and learning a
//! captured→reference mapping that can then be applied to arbitrary
//! images from the same scene:
//! - Chart detection: edge contours → largest quadrilateral →
//!   perspective rectification → per-cell color sampling
//! - Color math: sRGB ↔ CIE Lab (D65) and RGB → HSV conversions,
//!   CIE76 ΔE
//! - Three correction strategies: polynomial regression in Lab, a dense
//!   3-D lookup table, and direct nearest-neighbor remapping
//!
//! Image decode/encode, CLI, and service layers are intentionally out
//! of scope; the boundary type in both directions is an in-memory
//! [`image::RgbImage`].
//!
//! ## Example
//!
//! ```rust
//! use chartcal::{CorrectionMethod, Pipeline, ReferenceChart};
//!
//! // A synthetic chart photo stands in for a real capture here
//! let chart_photo = ReferenceChart::color_checker().render(40, 30);
//! let target = ReferenceChart::color_checker().render(10, 0);
//!
//! let mut pipeline = Pipeline::new(CorrectionMethod::Polynomial);
//! let outcome = pipeline.process(&chart_photo, &target)?;
//! assert!(outcome.corrected.is_some());
//! # Ok::<(), chartcal::CorrectionError>(())
//! ```

pub mod chart;
pub mod color;
pub mod config;
pub mod constants;
pub mod correction;
pub mod detection;
pub mod error;
pub mod pipeline;

pub use chart::ReferenceChart;
pub use config::{ChartGridConfig, DetectionConfig, PipelineConfig};
pub use correction::{CorrectionMethod, CorrectionModel};
pub use detection::{ChartDetector, DetectedPatch, DetectionResult};
pub use error::{CorrectionError, Result};
pub use pipeline::{CalibrationReport, DeltaEStats, Pipeline, ProcessOutcome, ProcessStatus};
