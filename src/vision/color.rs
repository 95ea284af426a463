//! Pixel and region color-distance primitives.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::error::VisionError;

/// Common resize targets for pixel comparison.
pub const IMG_SIZE_VERY_SMALL: u32 = 8;
pub const IMG_SIZE_MED: u32 = 72;

/// Largest possible distance between two colors (black vs white).
pub fn max_distance() -> f64 {
    255.0 * 3.0_f64.sqrt()
}

/// A color averaged over a region. Channels are fractional and may leave
/// the [0,255] range after a shading offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeanColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl MeanColor {
    pub fn from_pixel(px: &Rgb<u8>) -> Self {
        Self {
            r: px.0[0] as f64,
            g: px.0[1] as f64,
            b: px.0[2] as f64,
        }
    }

    pub fn max_channel(&self) -> f64 {
        self.r.max(self.g).max(self.b)
    }

    pub fn offset(&self, amount: f64) -> Self {
        Self {
            r: self.r + amount,
            g: self.g + amount,
            b: self.b + amount,
        }
    }

    pub fn is_white(&self, cutoff: u8) -> bool {
        let cutoff = cutoff as f64;
        self.r >= cutoff && self.g >= cutoff && self.b >= cutoff
    }

    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }
}

/// Euclidean distance between two colors in RGB space, in
/// [0, 255·sqrt(3)]. Symmetric in its arguments.
pub fn distance(a: MeanColor, b: MeanColor) -> f64 {
    let dr = b.r - a.r;
    let dg = b.g - a.g;
    let db = b.b - a.b;
    (dr * dr + dg * dg + db * db).sqrt()
}

fn pixel_distance(a: &Rgb<u8>, b: &Rgb<u8>) -> f64 {
    distance(MeanColor::from_pixel(a), MeanColor::from_pixel(b))
}

/// Region color comparison with its tunable thresholds. The defaults are
/// the calibrated production values; tests override the fields directly.
#[derive(Debug, Clone, Copy)]
pub struct ColorMetric {
    /// Channel floor above which a pixel counts as (near-)white background.
    pub white_cutoff: u8,
    /// Multiplier applied when the channel ordering flips between the two
    /// averages. Same-brightness but opposite-hue pairs must land far
    /// apart even when the raw magnitude distance is small.
    pub hue_flip_factor: f64,
}

impl Default for ColorMetric {
    fn default() -> Self {
        Self {
            white_cutoff: 245,
            hue_flip_factor: 10.0,
        }
    }
}

impl ColorMetric {
    /// Mean color over all pixels, optionally excluding near-white pixels
    /// from both the sum and the count.
    pub fn average_color(&self, img: &RgbImage, ignore_white: bool) -> Result<MeanColor, VisionError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(VisionError::EmptyCrop);
        }
        let mut sum = MeanColor::default();
        let mut count: u64 = 0;
        for px in img.pixels() {
            let color = MeanColor::from_pixel(px);
            if ignore_white && color.is_white(self.white_cutoff) {
                continue;
            }
            sum.r += color.r;
            sum.g += color.g;
            sum.b += color.b;
            count += 1;
        }
        if count == 0 {
            return Err(VisionError::AllBackground);
        }
        let n = count as f64;
        Ok(MeanColor {
            r: sum.r / n,
            g: sum.g / n,
            b: sum.b / n,
        })
    }

    /// Compare two regions by average color. With `offset_shading`, the
    /// second average is shifted by the difference in per-image maximum
    /// channel value before measuring, a cheap illumination normalization.
    pub fn compare_color(
        &self,
        img1: &RgbImage,
        img2: &RgbImage,
        ignore_white: bool,
        offset_shading: bool,
    ) -> Result<f64, VisionError> {
        let c1 = self.average_color(img1, ignore_white)?;
        let mut c2 = self.average_color(img2, ignore_white)?;
        if offset_shading {
            c2 = c2.offset(c1.max_channel() - c2.max_channel());
        }
        let mut diff = distance(c1, c2);
        if hue_flipped(c1, c2) {
            diff *= self.hue_flip_factor;
        }
        Ok(diff)
    }

    /// Structural similarity proxy: resize both images to a common small
    /// resolution and sum the per-pixel color distances. Zero only for
    /// identical downsampled images. Degenerate (empty) inputs never match.
    pub fn compare_pixels(
        &self,
        img1: &RgbImage,
        img2: &RgbImage,
        resize_width: u32,
        resize_height: u32,
    ) -> f64 {
        if img1.width() == 0 || img1.height() == 0 || img2.width() == 0 || img2.height() == 0 {
            return f64::MAX;
        }
        let a = imageops::resize(img1, resize_width, resize_height, FilterType::Triangle);
        let b = imageops::resize(img2, resize_width, resize_height, FilterType::Triangle);
        a.pixels()
            .zip(b.pixels())
            .map(|(p, q)| pixel_distance(p, q))
            .sum()
    }

    /// True if the region averages to white. Empty crops count as blank.
    pub fn is_white(&self, img: &RgbImage) -> bool {
        self.average_color(img, false)
            .map(|c| c.is_white(self.white_cutoff))
            .unwrap_or(true)
    }
}

fn channel_sign(d: f64) -> i8 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

/// The channel ordering of the two averages disagrees: some pairwise
/// difference (r-g, g-b, b-r) changed sign between them.
fn hue_flipped(a: MeanColor, b: MeanColor) -> bool {
    channel_sign(a.r - a.g) != channel_sign(b.r - b.g)
        || channel_sign(a.g - a.b) != channel_sign(b.g - b.b)
        || channel_sign(a.b - a.r) != channel_sign(b.b - b.r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        ImageBuffer::from_pixel(w, h, Rgb(rgb))
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_identity() {
        let a = MeanColor {
            r: 12.0,
            g: 200.0,
            b: 77.0,
        };
        let b = MeanColor {
            r: 90.0,
            g: 13.0,
            b: 240.0,
        };
        assert_eq!(distance(a, a), 0.0);
        assert_eq!(distance(a, b), distance(b, a));
    }

    #[test]
    fn black_vs_white_is_the_maximum_distance() {
        let metric = ColorMetric::default();
        let black = solid(4, 4, [0, 0, 0]);
        let white = solid(4, 4, [255, 255, 255]);
        let diff = metric
            .compare_color(&black, &white, false, false)
            .unwrap();
        assert!((diff - max_distance()).abs() < 1e-9);
    }

    #[test]
    fn average_color_can_exclude_background() {
        let metric = ColorMetric::default();
        let mut img = solid(2, 2, [255, 255, 255]);
        img.put_pixel(0, 0, Rgb([100, 40, 40]));
        let with_white = metric.average_color(&img, false).unwrap();
        let without_white = metric.average_color(&img, true).unwrap();
        assert!(with_white.r > 100.0);
        assert_eq!(without_white.r, 100.0);
        assert_eq!(without_white.g, 40.0);
    }

    #[test]
    fn all_white_with_background_ignored_is_an_error() {
        let metric = ColorMetric::default();
        let img = solid(3, 3, [250, 250, 250]);
        assert!(matches!(
            metric.average_color(&img, true),
            Err(VisionError::AllBackground)
        ));
    }

    #[test]
    fn compare_pixels_identity_is_zero() {
        let metric = ColorMetric::default();
        let mut img = solid(16, 16, [10, 200, 30]);
        img.put_pixel(3, 7, Rgb([255, 0, 0]));
        assert_eq!(metric.compare_pixels(&img, &img, 8, 8), 0.0);
    }

    #[test]
    fn compare_pixels_never_matches_an_empty_crop() {
        let metric = ColorMetric::default();
        let img = solid(4, 4, [1, 2, 3]);
        let empty: RgbImage = ImageBuffer::new(0, 0);
        assert_eq!(metric.compare_pixels(&img, &empty, 8, 8), f64::MAX);
    }

    #[test]
    fn hue_inversion_amplifies_the_distance() {
        let metric = ColorMetric::default();
        // Same brightness, opposite red/green ordering.
        let reddish = solid(4, 4, [140, 120, 60]);
        let greenish = solid(4, 4, [120, 140, 60]);
        let flipped = metric
            .compare_color(&reddish, &greenish, false, false)
            .unwrap();
        let raw = distance(
            metric.average_color(&reddish, false).unwrap(),
            metric.average_color(&greenish, false).unwrap(),
        );
        assert!((flipped - raw * metric.hue_flip_factor).abs() < 1e-9);

        // Same ordering: no amplification.
        let darker = solid(4, 4, [150, 130, 70]);
        let plain = metric
            .compare_color(&reddish, &darker, false, false)
            .unwrap();
        let raw_plain = distance(
            metric.average_color(&reddish, false).unwrap(),
            metric.average_color(&darker, false).unwrap(),
        );
        assert!((plain - raw_plain).abs() < 1e-9);
    }

    #[test]
    fn shading_offset_cancels_uniform_brightness_shift() {
        let metric = ColorMetric {
            hue_flip_factor: 1.0,
            ..Default::default()
        };
        let base = solid(4, 4, [100, 80, 60]);
        let brighter = solid(4, 4, [140, 120, 100]);
        let diff = metric
            .compare_color(&base, &brighter, false, true)
            .unwrap();
        assert!(diff.abs() < 1e-9);
    }

    #[test]
    fn is_white_tolerates_slightly_off_white() {
        let metric = ColorMetric::default();
        assert!(metric.is_white(&solid(4, 4, [246, 250, 245])));
        assert!(!metric.is_white(&solid(4, 4, [246, 250, 200])));
        let empty: RgbImage = ImageBuffer::new(0, 0);
        assert!(metric.is_white(&empty));
    }
}
