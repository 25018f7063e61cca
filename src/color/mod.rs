//! Color space conversion module
//!
//! Elementwise conversions between sRGB, CIE Lab, and HSV, plus the
//! CIE76 color difference used throughout the pipeline.

pub mod conversion;

pub use conversion::{
    delta_e, lab_to_rgb, lab_to_rgb8, rgb8_to_lab, rgb_to_hsv, rgb_to_lab, HsvImage, LabImage,
};
