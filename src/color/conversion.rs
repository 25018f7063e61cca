//! Color space conversion utilities
//!
//! Image-level conversions between 8-bit sRGB and the floating-point
//! working spaces:
//! - sRGB ↔ CIE Lab through linear RGB and XYZ under D65
//! - sRGB → HSV
//! - CIE76 ΔE color difference
//!
//! All conversions are pure and shape-preserving; outputs are clipped to
//! the legal range of their target space. The sRGB↔Lab chain (gamma
//! linearization, the fixed sRGB→XYZ matrix, D65 normalization, the
//! piecewise cube-root transfer with breakpoint (6/29)³) comes from the
//! `palette` crate.

use image::{ImageBuffer, Rgb, RgbImage};
use palette::{FromColor, Hsv, IntoColor, Lab, Srgb};

/// Floating-point HSV image
///
/// Channel layout per pixel: hue in degrees `[0, 360)`, saturation and
/// value scaled to `[0, 255]`. The S/V scaling keeps compatibility with
/// the historical 8-bit layout; hue is deliberately kept in a full-range
/// field rather than truncated into the same 8-bit container.
pub type HsvImage = ImageBuffer<Rgb<f32>, Vec<f32>>;

/// H×W grid of CIE Lab colors, the working representation for
/// perceptual color math
#[derive(Debug, Clone, PartialEq)]
pub struct LabImage {
    width: u32,
    height: u32,
    pixels: Vec<Lab>,
}

impl LabImage {
    pub(crate) fn from_parts(width: u32, height: u32, pixels: Vec<Lab>) -> Self {
        debug_assert_eq!((width * height) as usize, pixels.len());
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Image dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixels in row-major order
    pub fn pixels(&self) -> &[Lab] {
        &self.pixels
    }

    /// Lab color at (x, y)
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the image.
    pub fn get(&self, x: u32, y: u32) -> Lab {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Convert a single 8-bit RGB color to Lab
pub fn rgb8_to_lab(rgb: Rgb<u8>) -> Lab {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    Lab::from_color(srgb)
}

/// Convert a single Lab color to 8-bit RGB, clipped to the sRGB gamut
pub fn lab_to_rgb8(lab: Lab) -> Rgb<u8> {
    let srgb: Srgb = lab.into_color();
    Rgb([
        (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

/// Convert an 8-bit RGB image to Lab
///
/// L lands in `[0, 100]`, a and b in roughly `[-128, 127]`.
pub fn rgb_to_lab(image: &RgbImage) -> LabImage {
    let pixels = image.pixels().map(|&p| rgb8_to_lab(p)).collect();
    LabImage::from_parts(image.width(), image.height(), pixels)
}

/// Convert a Lab image back to 8-bit RGB
///
/// Exact inverse of [`rgb_to_lab`] up to quantization; out-of-gamut
/// colors are clipped to `[0, 255]`.
pub fn lab_to_rgb(image: &LabImage) -> RgbImage {
    let mut out = RgbImage::new(image.width(), image.height());
    for (dst, &lab) in out.pixels_mut().zip(image.pixels()) {
        *dst = lab_to_rgb8(lab);
    }
    out
}

/// Convert an 8-bit RGB image to HSV
///
/// Standard max/min-channel formulas. See [`HsvImage`] for the channel
/// layout and scaling.
pub fn rgb_to_hsv(image: &RgbImage) -> HsvImage {
    let mut out: HsvImage = ImageBuffer::new(image.width(), image.height());
    for (dst, &p) in out.pixels_mut().zip(image.pixels()) {
        let srgb = Srgb::new(
            p[0] as f32 / 255.0,
            p[1] as f32 / 255.0,
            p[2] as f32 / 255.0,
        );
        let hsv = Hsv::from_color(srgb);
        *dst = Rgb([
            hsv.hue.into_positive_degrees(),
            hsv.saturation * 255.0,
            hsv.value * 255.0,
        ]);
    }
    out
}

/// CIE76 color difference: Euclidean distance in Lab space
pub fn delta_e(a: Lab, b: Lab) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    (dl * dl + da * da + db * db).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::d65;
    use approx::assert_relative_eq;
    use palette::Xyz;

    #[test]
    fn test_white_point_matches_d65() {
        let xyz = Xyz::from_color(Srgb::new(1.0f32, 1.0, 1.0));
        assert_relative_eq!(xyz.x, d65::WHITE_POINT_XYZ[0], epsilon = 1e-3);
        assert_relative_eq!(xyz.y, d65::WHITE_POINT_XYZ[1], epsilon = 1e-3);
        assert_relative_eq!(xyz.z, d65::WHITE_POINT_XYZ[2], epsilon = 1e-3);
    }

    #[test]
    fn test_lab_fixed_points() {
        let white = rgb8_to_lab(Rgb([255, 255, 255]));
        assert_relative_eq!(white.l, 100.0, epsilon = 0.5);
        assert!(white.a.abs() < 0.5 && white.b.abs() < 0.5);

        let black = rgb8_to_lab(Rgb([0, 0, 0]));
        assert!(black.l.abs() < 0.5);
        assert!(black.a.abs() < 0.5 && black.b.abs() < 0.5);

        let red = rgb8_to_lab(Rgb([255, 0, 0]));
        assert_relative_eq!(red.l, 53.2, epsilon = 0.5);
        assert_relative_eq!(red.a, 80.1, epsilon = 0.5);
        assert_relative_eq!(red.b, 67.2, epsilon = 0.5);
    }

    #[test]
    fn test_lab_round_trip() {
        // Sweep a coarse RGB lattice; every value must survive the
        // round trip within 1, or 2 near the gamma breakpoint
        for r in (0..=255).step_by(17) {
            for g in (0..=255).step_by(51) {
                for b in (0..=255).step_by(51) {
                    let rgb = Rgb([r as u8, g as u8, b as u8]);
                    let back = lab_to_rgb8(rgb8_to_lab(rgb));
                    for c in 0..3 {
                        let diff = (rgb[c] as i16 - back[c] as i16).abs();
                        let limit = if rgb[c] <= 12 { 2 } else { 1 };
                        assert!(
                            diff <= limit,
                            "round trip failed for {:?}: got {:?}",
                            rgb,
                            back
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_image_conversion_preserves_shape() {
        let mut image = RgbImage::new(5, 3);
        for (i, p) in image.pixels_mut().enumerate() {
            *p = Rgb([(i * 13) as u8, (i * 29) as u8, (i * 47) as u8]);
        }

        let lab = rgb_to_lab(&image);
        assert_eq!(lab.dimensions(), (5, 3));

        let back = lab_to_rgb(&lab);
        assert_eq!(back.dimensions(), (5, 3));

        let hsv = rgb_to_hsv(&image);
        assert_eq!(hsv.dimensions(), (5, 3));
    }

    #[test]
    fn test_hsv_primaries() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        let hsv = rgb_to_hsv(&image);
        let p = hsv.get_pixel(0, 0);
        assert_relative_eq!(p[0], 0.0, epsilon = 0.01);
        assert_relative_eq!(p[1], 255.0, epsilon = 0.01);
        assert_relative_eq!(p[2], 255.0, epsilon = 0.01);

        let image = RgbImage::from_pixel(1, 1, Rgb([0, 255, 0]));
        let p = rgb_to_hsv(&image)[(0, 0)];
        assert_relative_eq!(p[0], 120.0, epsilon = 0.01);

        let image = RgbImage::from_pixel(1, 1, Rgb([0, 0, 255]));
        let p = rgb_to_hsv(&image)[(0, 0)];
        assert_relative_eq!(p[0], 240.0, epsilon = 0.01);
    }

    #[test]
    fn test_hsv_neutrals_have_zero_saturation() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let p = rgb_to_hsv(&image)[(0, 0)];
        assert_relative_eq!(p[1], 0.0, epsilon = 0.01);
        assert_relative_eq!(p[2], 255.0, epsilon = 0.01);

        let image = RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]));
        let p = rgb_to_hsv(&image)[(0, 0)];
        assert_relative_eq!(p[1], 0.0, epsilon = 0.01);
        assert_relative_eq!(p[2], 0.0, epsilon = 0.01);
    }

    #[test]
    fn test_hue_range_is_degrees() {
        // A hue past the 8-bit range must survive unclamped
        let image = RgbImage::from_pixel(1, 1, Rgb([128, 0, 255]));
        let p = rgb_to_hsv(&image)[(0, 0)];
        assert!(p[0] > 255.0 && p[0] < 360.0, "hue was {}", p[0]);
    }

    #[test]
    fn test_delta_e() {
        let a = Lab::new(50.0, 10.0, -10.0);
        assert_relative_eq!(delta_e(a, a), 0.0);

        let b = Lab::new(53.0, 14.0, -10.0);
        assert_relative_eq!(delta_e(a, b), 5.0, epsilon = 1e-4);
    }
}
