//! Dense 3-D lookup table correction
//!
//! Builds a 16×16×16 cube over RGB space at training time: each cell
//! holds the inverse-distance-weighted average of the reference colors
//! paired with the captured colors nearest the cell centroid.
//! Application trilinearly interpolates the cube per pixel.

use image::{Rgb, RgbImage};
use rayon::prelude::*;

use crate::constants::correction::{IDW_DISTANCE_EPSILON, LUT_NEIGHBORS, LUT_SIZE};

/// Trained lookup table: `size³` RGB cells in r-major order
#[derive(Debug, Clone)]
pub(crate) struct Lut3d {
    size: usize,
    table: Vec<[f32; 3]>,
}

fn to_f32(c: Rgb<u8>) -> [f32; 3] {
    [c[0] as f32, c[1] as f32, c[2] as f32]
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    (dr * dr + dg * dg + db * db).sqrt()
}

impl Lut3d {
    /// Build the table from matched color pairs
    pub fn build(reference: &[Rgb<u8>], captured: &[Rgb<u8>]) -> Self {
        let reference: Vec<[f32; 3]> = reference.iter().map(|&c| to_f32(c)).collect();
        let captured: Vec<[f32; 3]> = captured.iter().map(|&c| to_f32(c)).collect();

        let size = LUT_SIZE;
        let scale = 255.0 / (size - 1) as f32;
        let neighbors = LUT_NEIGHBORS.min(captured.len());

        let mut table = vec![[0.0f32; 3]; size * size * size];
        for r in 0..size {
            for g in 0..size {
                for b in 0..size {
                    let centroid = [r as f32 * scale, g as f32 * scale, b as f32 * scale];

                    let mut ranked: Vec<(f32, usize)> = captured
                        .iter()
                        .enumerate()
                        .map(|(i, &c)| (distance(centroid, c), i))
                        .collect();
                    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
                    ranked.truncate(neighbors);

                    let weights: Vec<f32> = ranked
                        .iter()
                        .map(|(d, _)| 1.0 / (d + IDW_DISTANCE_EPSILON))
                        .collect();
                    let weight_sum: f32 = weights.iter().sum();

                    let mut cell = [0.0f32; 3];
                    for ((_, i), w) in ranked.iter().zip(weights.iter()) {
                        for c in 0..3 {
                            cell[c] += reference[*i][c] * w / weight_sum;
                        }
                    }

                    table[(r * size + g) * size + b] = cell;
                }
            }
        }

        Self { size, table }
    }

    fn cell(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.table[(r * self.size + g) * self.size + b]
    }

    /// Look up one color with trilinear interpolation
    fn interpolate(&self, color: Rgb<u8>) -> [f32; 3] {
        let max_index = (self.size - 1) as f32;

        let mut index = [0usize; 3];
        let mut frac = [0.0f32; 3];
        for c in 0..3 {
            let t = color[c] as f32 / 255.0 * max_index;
            // Clamp so the 8-cell neighborhood stays inside the cube
            let i = (t.floor() as usize).min(self.size - 2);
            index[c] = i;
            frac[c] = t - i as f32;
        }

        let (r, g, b) = (index[0], index[1], index[2]);
        let (fr, fg, fb) = (frac[0], frac[1], frac[2]);

        let mut out = [0.0f32; 3];
        for c in 0..3 {
            let c000 = self.cell(r, g, b)[c];
            let c001 = self.cell(r, g, b + 1)[c];
            let c010 = self.cell(r, g + 1, b)[c];
            let c011 = self.cell(r, g + 1, b + 1)[c];
            let c100 = self.cell(r + 1, g, b)[c];
            let c101 = self.cell(r + 1, g, b + 1)[c];
            let c110 = self.cell(r + 1, g + 1, b)[c];
            let c111 = self.cell(r + 1, g + 1, b + 1)[c];

            let c00 = c000 * (1.0 - fr) + c100 * fr;
            let c01 = c001 * (1.0 - fr) + c101 * fr;
            let c10 = c010 * (1.0 - fr) + c110 * fr;
            let c11 = c011 * (1.0 - fr) + c111 * fr;

            let c0 = c00 * (1.0 - fg) + c10 * fg;
            let c1 = c01 * (1.0 - fg) + c11 * fg;

            out[c] = c0 * (1.0 - fb) + c1 * fb;
        }
        out
    }

    /// Apply the table to every pixel of `image`
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
                    let mapped = self.interpolate(Rgb([pixel[0], pixel[1], pixel[2]]));
                    for c in 0..3 {
                        dst[c] = mapped[c].clamp(0.0, 255.0).round() as u8;
                    }
                }
            });

        RgbImage::from_raw(width, height, out).expect("output sized to input dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ReferenceChart;

    #[test]
    fn test_table_geometry() {
        let colors = ReferenceChart::color_checker().colors().to_vec();
        let lut = Lut3d::build(&colors, &colors);
        assert_eq!(lut.size, LUT_SIZE);
        assert_eq!(lut.table.len(), LUT_SIZE * LUT_SIZE * LUT_SIZE);
    }

    #[test]
    fn test_training_colors_map_near_their_references() {
        let reference = ReferenceChart::color_checker().colors().to_vec();
        let lut = Lut3d::build(&reference, &reference);

        // IDW smoothing blends in distant neighbors, so the mapping is
        // approximate; the training colors must still stay close to
        // their paired references on average
        let mut total = 0.0f64;
        for color in &reference {
            let mapped = lut.interpolate(*color);
            for c in 0..3 {
                total += (mapped[c] as f64 - color[c] as f64).abs();
            }
        }
        let mean = total / (reference.len() * 3) as f64;
        assert!(mean < 25.0, "mean training deviation {}", mean);
    }

    #[test]
    fn test_apply_preserves_shape_and_range() {
        let colors = ReferenceChart::color_checker().colors().to_vec();
        let lut = Lut3d::build(&colors, &colors);

        let mut image = RgbImage::new(9, 4);
        for (i, p) in image.pixels_mut().enumerate() {
            *p = Rgb([(i * 7) as u8, 255 - (i * 5) as u8, (i * 11) as u8]);
        }
        let corrected = lut.apply(&image);
        assert_eq!(corrected.dimensions(), (9, 4));
    }

    #[test]
    fn test_single_pair_fills_cube() {
        // With one training pair every cell collapses to the reference
        let lut = Lut3d::build(&[Rgb([10, 200, 30])], &[Rgb([120, 120, 120])]);
        let image = RgbImage::from_pixel(2, 2, Rgb([7, 99, 240]));
        let corrected = lut.apply(&image);
        assert_eq!(*corrected.get_pixel(0, 0), Rgb([10, 200, 30]));
    }
}
