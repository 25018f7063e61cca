//! Pipeline configuration
//!
//! Tunable parameters for detection and correction, loadable from JSON
//! for reproducible runs:
//!
//! ```no_run
//! use chartcal::PipelineConfig;
//! use std::path::Path;
//!
//! let config = PipelineConfig::from_json_file(Path::new("config.json"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{chart, detection};
use crate::correction::CorrectionMethod;

/// Complete pipeline configuration
///
/// Every field has a default, so a partial JSON document (or `{}`)
/// deserializes into a working configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Correction strategy: "polynomial", "lut_3d", or "direct_mapping"
    pub method: CorrectionMethod,

    /// Chart grid the detector samples
    pub chart: ChartGridConfig,

    /// Detection tunables
    pub detection: DetectionConfig,
}

/// Chart grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartGridConfig {
    /// Patch columns
    pub cols: u32,
    /// Patch rows
    pub rows: u32,
}

impl Default for ChartGridConfig {
    fn default() -> Self {
        Self {
            cols: chart::DEFAULT_COLS,
            rows: chart::DEFAULT_ROWS,
        }
    }
}

/// Edge and contour parameters for chart detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Canny edge detection low threshold
    pub canny_low_threshold: f32,

    /// Canny edge detection high threshold
    pub canny_high_threshold: f32,

    /// Minimum contour area in pixels
    pub min_contour_area: f64,

    /// Polygon approximation epsilon as fraction of perimeter
    pub poly_approx_epsilon: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            canny_low_threshold: detection::CANNY_LOW_THRESHOLD,
            canny_high_threshold: detection::CANNY_HIGH_THRESHOLD,
            min_contour_area: detection::MIN_CONTOUR_AREA,
            poly_approx_epsilon: detection::POLY_APPROX_EPSILON,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file(&self, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
