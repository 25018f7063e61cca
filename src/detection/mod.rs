//! Chart detection module
//!
//! Locates a reference chart inside a photograph, rectifies it, and
//! samples its patch colors.

pub mod checker;

pub use checker::{ChartDetector, DetectedPatch, DetectionResult};
