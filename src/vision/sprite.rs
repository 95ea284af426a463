//! Normal-vs-shiny sprite classification.

use std::fmt;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use super::color::ColorMetric;
use crate::error::VisionError;
use crate::species::Species;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Normal,
    Shiny,
}

impl fmt::Display for SpriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteKind::Normal => write!(f, "normal"),
            SpriteKind::Shiny => write!(f, "shiny"),
        }
    }
}

/// Decides which of a species' two reference sprites a battle crop is
/// closer to, by region color distance.
pub struct SpriteClassifier {
    metric: ColorMetric,
    normal_ref: RgbImage,
    shiny_ref: RgbImage,
}

impl SpriteClassifier {
    /// Load both reference sprites for the species.
    pub fn load(species: &Species, metric: ColorMetric) -> Result<Self, VisionError> {
        let normal_ref = load_rgb(species.sprite_path(SpriteKind::Normal))?;
        let shiny_ref = load_rgb(species.sprite_path(SpriteKind::Shiny))?;
        Ok(Self::new(normal_ref, shiny_ref, metric))
    }

    pub fn new(normal_ref: RgbImage, shiny_ref: RgbImage, metric: ColorMetric) -> Self {
        Self {
            metric,
            normal_ref,
            shiny_ref,
        }
    }

    /// Resize the probe to the reference dimensions and return whichever
    /// reference is closer in color. A tie classifies as shiny: when the
    /// two palettes are indistinguishable the hunt must not silently
    /// discard the encounter.
    pub fn classify(&self, probe: &RgbImage) -> Result<SpriteKind, VisionError> {
        if probe.width() == 0 || probe.height() == 0 {
            return Err(VisionError::EmptyCrop);
        }
        let probe = imageops::resize(
            probe,
            self.normal_ref.width(),
            self.normal_ref.height(),
            FilterType::Triangle,
        );
        let diff_normal = self.metric.compare_color(&probe, &self.normal_ref, true, false)?;
        let diff_shiny = self.metric.compare_color(&probe, &self.shiny_ref, true, false)?;
        let kind = if diff_normal < diff_shiny {
            SpriteKind::Normal
        } else {
            SpriteKind::Shiny
        };
        debug!(diff_normal, diff_shiny, %kind, "classified sprite");
        Ok(kind)
    }
}

/// Capture succeeded iff the battle name read after the throw is
/// byte-identical to the name read before it. A broken-out opponent
/// changes the readable name region's content or presence.
pub fn is_captured(before: &str, after: &str) -> bool {
    before == after
}

fn load_rgb(path: &std::path::Path) -> Result<RgbImage, VisionError> {
    Ok(image::open(path)
        .map_err(|e| VisionError::Image(path.to_path_buf(), e))?
        .to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid(rgb: [u8; 3]) -> RgbImage {
        ImageBuffer::from_pixel(16, 16, Rgb(rgb))
    }

    fn classifier() -> SpriteClassifier {
        // Red normal palette, blue shiny palette.
        SpriteClassifier::new(
            solid([180, 60, 60]),
            solid([60, 60, 180]),
            ColorMetric::default(),
        )
    }

    #[test]
    fn probe_near_the_normal_palette_is_normal() {
        let kind = classifier().classify(&solid([170, 70, 65])).unwrap();
        assert_eq!(kind, SpriteKind::Normal);
    }

    #[test]
    fn probe_near_the_shiny_palette_is_shiny() {
        let kind = classifier().classify(&solid([65, 70, 170])).unwrap();
        assert_eq!(kind, SpriteKind::Shiny);
    }

    #[test]
    fn equidistant_probe_classifies_as_shiny() {
        // Gray is the same distance from both references.
        let kind = classifier().classify(&solid([100, 100, 100])).unwrap();
        assert_eq!(kind, SpriteKind::Shiny);
    }

    #[test]
    fn capture_requires_byte_identical_names() {
        assert!(is_captured("suicune", "suicune"));
        assert!(!is_captured("suicune", ""));
        assert!(!is_captured("suicune", "suicunf"));
    }
}
