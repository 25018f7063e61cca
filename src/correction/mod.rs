//! Color correction models
//!
//! A [`CorrectionModel`] learns a captured→reference color mapping from
//! matched patch pairs and applies it to whole images. The strategy is
//! chosen once at construction:
//!
//! - [`CorrectionMethod::Polynomial`]: per-channel degree-2 regression
//!   in Lab space
//! - [`CorrectionMethod::Lut3d`]: dense 3-D lookup table built by
//!   inverse-distance weighting, applied with trilinear interpolation
//! - [`CorrectionMethod::DirectMapping`]: hard nearest-neighbor
//!   remapping onto the reference colors

mod lut;
mod nearest;
mod polynomial;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{CorrectionError, Result};
use lut::Lut3d;
use nearest::NearestNeighborMap;
use polynomial::PolynomialModel;

/// Correction strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    /// Per-channel degree-2 polynomial regression in Lab
    Polynomial,
    /// 16×16×16 lookup table with trilinear interpolation
    #[serde(rename = "lut_3d")]
    Lut3d,
    /// Nearest-neighbor remapping onto the reference colors
    DirectMapping,
}

impl Default for CorrectionMethod {
    fn default() -> Self {
        Self::Polynomial
    }
}

/// Trained strategy state; built wholesale by `train` and swapped in as
/// a unit
#[derive(Debug, Clone)]
enum TrainedModel {
    Polynomial(PolynomialModel),
    Lut3d(Lut3d),
    Direct(NearestNeighborMap),
}

impl TrainedModel {
    fn apply(&self, image: &RgbImage) -> RgbImage {
        match self {
            TrainedModel::Polynomial(model) => model.apply(image),
            TrainedModel::Lut3d(model) => model.apply(image),
            TrainedModel::Direct(model) => model.apply(image),
        }
    }
}

/// Color correction model with a train/apply lifecycle
///
/// Starts untrained; [`train`](Self::train) replaces the trained state
/// atomically (the new state is fully built before the old one is
/// dropped), so a model is never observable half-trained. Between
/// training events the model is immutable and `apply` is a pure
/// function.
#[derive(Debug, Clone)]
pub struct CorrectionModel {
    method: CorrectionMethod,
    trained: Option<TrainedModel>,
}

impl CorrectionModel {
    /// Create an untrained model for the given strategy
    pub fn new(method: CorrectionMethod) -> Self {
        Self {
            method,
            trained: None,
        }
    }

    /// Strategy selected at construction
    pub fn method(&self) -> CorrectionMethod {
        self.method
    }

    /// Whether `train` has completed at least once
    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    /// Learn the captured→reference mapping from matched patch pairs
    ///
    /// Both slices must be enumerated in the same row-major chart order
    /// so that index i of `captured` photographs index i of `reference`.
    ///
    /// # Errors
    ///
    /// - `TrainingDataMismatch` if the sequences differ in length
    /// - `InvalidInput` if the sequences are empty
    /// - `Numerical` if the polynomial fit breaks down
    pub fn train(&mut self, reference: &[Rgb<u8>], captured: &[Rgb<u8>]) -> Result<()> {
        if reference.len() != captured.len() {
            return Err(CorrectionError::TrainingDataMismatch {
                reference: reference.len(),
                captured: captured.len(),
            });
        }
        if reference.is_empty() {
            return Err(CorrectionError::invalid_input(
                "training requires at least one color pair",
            ));
        }

        let trained = match self.method {
            CorrectionMethod::Polynomial => {
                TrainedModel::Polynomial(PolynomialModel::fit(reference, captured)?)
            }
            CorrectionMethod::Lut3d => TrainedModel::Lut3d(Lut3d::build(reference, captured)),
            CorrectionMethod::DirectMapping => {
                TrainedModel::Direct(NearestNeighborMap::new(reference, captured))
            }
        };
        self.trained = Some(trained);
        Ok(())
    }

    /// Apply the trained mapping to an image
    ///
    /// # Errors
    ///
    /// Returns `ModelNotTrained` if `train` has never completed.
    pub fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        match &self.trained {
            Some(model) => Ok(model.apply(image)),
            None => Err(CorrectionError::ModelNotTrained),
        }
    }
}
