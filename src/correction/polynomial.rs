//! Per-channel polynomial regression in Lab space
//!
//! Fits a degree-2 polynomial over the full quadratic basis
//! (1, L, a, b, L², a², b², La, Lb, ab) for each Lab output channel,
//! mapping captured Lab coordinates to reference Lab coordinates by
//! least squares. Working in Lab keeps the regression roughly
//! perceptually weighted.

use image::{Rgb, RgbImage};
use nalgebra::DMatrix;
use palette::Lab;
use rayon::prelude::*;

use crate::color::conversion::{lab_to_rgb8, rgb8_to_lab};
use crate::constants::correction::POLY_BASIS_LEN;
use crate::error::{CorrectionError, Result};

/// Rank tolerance for the least-squares solve
const SVD_EPSILON: f64 = 1e-12;

/// Trained polynomial mapping: one coefficient row per Lab output
/// channel
#[derive(Debug, Clone)]
pub(crate) struct PolynomialModel {
    coefficients: [[f64; POLY_BASIS_LEN]; 3],
}

/// Expand a Lab color into the full quadratic feature basis
fn quadratic_basis(lab: Lab) -> [f64; POLY_BASIS_LEN] {
    let (l, a, b) = (lab.l as f64, lab.a as f64, lab.b as f64);
    [
        1.0,
        l,
        a,
        b,
        l * l,
        a * a,
        b * b,
        l * a,
        l * b,
        a * b,
    ]
}

impl PolynomialModel {
    /// Fit the captured→reference mapping from matched color pairs
    pub fn fit(reference: &[Rgb<u8>], captured: &[Rgb<u8>]) -> Result<Self> {
        let reference_lab: Vec<Lab> = reference.iter().map(|&c| rgb8_to_lab(c)).collect();
        let captured_lab: Vec<Lab> = captured.iter().map(|&c| rgb8_to_lab(c)).collect();

        let n = captured_lab.len();
        let features: Vec<[f64; POLY_BASIS_LEN]> = captured_lab
            .iter()
            .map(|&lab| quadratic_basis(lab))
            .collect();

        let design = DMatrix::from_fn(n, POLY_BASIS_LEN, |i, j| features[i][j]);
        let targets = DMatrix::from_fn(n, 3, |i, channel| match channel {
            0 => reference_lab[i].l as f64,
            1 => reference_lab[i].a as f64,
            _ => reference_lab[i].b as f64,
        });

        let solution = design
            .svd(true, true)
            .solve(&targets, SVD_EPSILON)
            .map_err(CorrectionError::numerical)?;

        let mut coefficients = [[0.0f64; POLY_BASIS_LEN]; 3];
        for channel in 0..3 {
            for term in 0..POLY_BASIS_LEN {
                coefficients[channel][term] = solution[(term, channel)];
            }
        }

        Ok(Self { coefficients })
    }

    /// Evaluate the fitted polynomials for one Lab color
    fn map_lab(&self, lab: Lab) -> Lab {
        let basis = quadratic_basis(lab);
        let mut out = [0.0f64; 3];
        for (channel, coefficients) in self.coefficients.iter().enumerate() {
            out[channel] = coefficients
                .iter()
                .zip(basis.iter())
                .map(|(c, f)| c * f)
                .sum();
        }
        Lab::new(out[0] as f32, out[1] as f32, out[2] as f32)
    }

    /// Apply the mapping to every pixel of `image`
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        let row_len = (width * 3) as usize;
        let src = image.as_raw();

        let mut out = vec![0u8; src.len()];
        out.par_chunks_mut(row_len.max(1))
            .enumerate()
            .for_each(|(y, row)| {
                let src_row = &src[y * row_len..(y + 1) * row_len];
                for (dst, pixel) in row.chunks_exact_mut(3).zip(src_row.chunks_exact(3)) {
                    let lab = rgb8_to_lab(Rgb([pixel[0], pixel[1], pixel[2]]));
                    let corrected = lab_to_rgb8(self.map_lab(lab));
                    dst.copy_from_slice(&corrected.0);
                }
            });

        RgbImage::from_raw(width, height, out).expect("output sized to input dimensions")
    }
}
