//! Direct nearest-neighbor color remapping
//!
//! Stores the training pairs verbatim. Each pixel is replaced by the
//! reference color paired with its nearest captured color, a hard
//! assignment with no blending, so the output palette is exactly the
//! reference set. Cost is O(pixels · N) with no spatial index.

use image::{Rgb, RgbImage};
use rayon::prelude::*;

/// Verbatim (reference, captured) pair table
#[derive(Debug, Clone)]
pub(crate) struct NearestNeighborMap {
    reference: Vec<Rgb<u8>>,
    captured: Vec<[f32; 3]>,
}

impl NearestNeighborMap {
    pub fn new(reference: &[Rgb<u8>], captured: &[Rgb<u8>]) -> Self {
        Self {
            reference: reference.to_vec(),
            captured: captured
                .iter()
                .map(|&c| [c[0] as f32, c[1] as f32, c[2] as f32])
                .collect(),
        }
    }

    /// Index of the captured color nearest to `pixel`
    fn nearest(&self, pixel: Rgb<u8>) -> usize {
        let p = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, c) in self.captured.iter().enumerate() {
            let dr = p[0] - c[0];
            let dg = p[1] - c[1];
            let db = p[2] - c[2];
            let dist = dr * dr + dg * dg + db * db;
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best
    }

    /// Remap every pixel of `image` onto the reference palette
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
                    let index = self.nearest(Rgb([pixel[0], pixel[1], pixel[2]]));
                    dst.copy_from_slice(&self.reference[index].0);
                }
            });

        RgbImage::from_raw(width, height, out).expect("output sized to input dimensions")
    }
}
