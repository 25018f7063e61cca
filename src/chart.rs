//! Reference chart definition
//!
//! A [`ReferenceChart`] is an immutable, ordered set of patch colors laid
//! out row-major on a cols×rows grid. The patch order is the canonical
//! index space of the whole crate: detected patch sequences and training
//! color pairs are always enumerated in this order.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::constants::chart::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::error::{CorrectionError, Result};

/// Standard 24-patch reference values (sRGB), row-major on the 6×4 grid
const STANDARD_COLORS: [[u8; 3]; 24] = [
    [115, 82, 68],   // dark skin
    [194, 150, 130], // light skin
    [98, 122, 157],  // blue sky
    [87, 108, 67],   // foliage
    [133, 128, 177], // blue flower
    [103, 188, 167], // bluish green
    [214, 126, 44],  // orange
    [80, 91, 166],   // purplish blue
    [193, 90, 99],   // moderate red
    [94, 60, 108],   // purple
    [157, 188, 64],  // yellow green
    [224, 163, 46],  // orange yellow
    [56, 61, 150],   // blue
    [70, 148, 73],   // green
    [175, 54, 60],   // red
    [231, 199, 31],  // yellow
    [187, 86, 149],  // magenta
    [8, 133, 161],   // cyan
    [243, 243, 242], // white
    [200, 200, 200], // neutral 8
    [160, 160, 160], // neutral 6.5
    [122, 122, 121], // neutral 5
    [85, 85, 85],    // neutral 3.5
    [52, 52, 52],    // black
];

/// Immutable ordered set of reference patch colors on a grid
///
/// The default chart is the standard 24-patch card: 6 columns by 4 rows,
/// enumerated row-major (left to right, top to bottom).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceChart {
    cols: u32,
    rows: u32,
    colors: Vec<Rgb<u8>>,
}

impl Default for ReferenceChart {
    fn default() -> Self {
        Self::color_checker()
    }
}

impl ReferenceChart {
    /// The standard 24-patch reference chart (6×4)
    pub fn color_checker() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            colors: STANDARD_COLORS.iter().map(|&c| Rgb(c)).collect(),
        }
    }

    /// Create a custom chart from a row-major color sequence
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the color count does not equal
    /// `cols * rows`, or if either dimension is zero.
    pub fn new(cols: u32, rows: u32, colors: Vec<Rgb<u8>>) -> Result<Self> {
        if cols == 0 || rows == 0 {
            return Err(CorrectionError::invalid_input(
                "chart grid dimensions must be non-zero",
            ));
        }
        if colors.len() != (cols * rows) as usize {
            return Err(CorrectionError::invalid_input(format!(
                "chart color count {} does not match {}x{} grid",
                colors.len(),
                cols,
                rows
            )));
        }
        Ok(Self { cols, rows, colors })
    }

    /// Grid dimensions as (columns, rows)
    pub fn grid(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Number of patches
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// True if the chart has no patches (never the case for valid charts)
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Patch colors in row-major grid order
    pub fn colors(&self) -> &[Rgb<u8>] {
        &self.colors
    }

    /// Color at grid position (col, row)
    pub fn color_at(&self, col: u32, row: u32) -> Option<Rgb<u8>> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(self.colors[(row * self.cols + col) as usize])
    }

    /// Render the chart as a synthetic photograph
    ///
    /// Draws each patch as a `patch_size`-square on a black background
    /// with `margin` pixels of border. Every patch/background boundary
    /// carries enough contrast for edge detection, which makes the output
    /// a convenient detector input for tests and benchmarks.
    pub fn render(&self, patch_size: u32, margin: u32) -> RgbImage {
        let width = self.cols * patch_size + 2 * margin;
        let height = self.rows * patch_size + 2 * margin;
        let mut image = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));

        for row in 0..self.rows {
            for col in 0..self.cols {
                let color = self.colors[(row * self.cols + col) as usize];
                let rect = Rect::at(
                    (margin + col * patch_size) as i32,
                    (margin + row * patch_size) as i32,
                )
                .of_size(patch_size, patch_size);
                draw_filled_rect_mut(&mut image, rect, color);
            }
        }

        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_checker_layout() {
        let chart = ReferenceChart::color_checker();
        assert_eq!(chart.grid(), (6, 4));
        assert_eq!(chart.len(), 24);
    }

    #[test]
    fn test_row_major_indexing() {
        let chart = ReferenceChart::color_checker();
        // First patch of the second row is the 7th entry
        assert_eq!(chart.color_at(0, 1), Some(Rgb([214, 126, 44])));
        // Bottom-right patch is black
        assert_eq!(chart.color_at(5, 3), Some(Rgb([52, 52, 52])));
        assert_eq!(chart.color_at(6, 0), None);
    }

    #[test]
    fn test_custom_chart_validation() {
        let result = ReferenceChart::new(2, 2, vec![Rgb([0, 0, 0]); 3]);
        assert!(matches!(
            result,
            Err(CorrectionError::InvalidInput { .. })
        ));

        let result = ReferenceChart::new(0, 4, vec![]);
        assert!(result.is_err());

        let chart = ReferenceChart::new(2, 2, vec![Rgb([10, 20, 30]); 4]).unwrap();
        assert_eq!(chart.len(), 4);
    }

    #[test]
    fn test_render_geometry() {
        let chart = ReferenceChart::color_checker();
        let image = chart.render(20, 10);
        assert_eq!(image.dimensions(), (6 * 20 + 20, 4 * 20 + 20));

        // Center of the top-left patch carries the first reference color
        assert_eq!(*image.get_pixel(20, 20), Rgb([115, 82, 68]));
        // Background stays black
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
    }
}
