//! Text recognition over fixed-width character slots.

use std::path::Path;

use image::RgbImage;
use tracing::debug;

use super::color::{ColorMetric, IMG_SIZE_VERY_SMALL};
use super::region::SlotGeometry;
use super::template::TemplateLibrary;
use crate::error::VisionError;

/// Classifies character slots against glyph and digit libraries.
pub struct NameRecognizer {
    letters: TemplateLibrary,
    numbers: TemplateLibrary,
    metric: ColorMetric,
}

impl NameRecognizer {
    pub fn new(letters: TemplateLibrary, numbers: TemplateLibrary, metric: ColorMetric) -> Self {
        Self {
            letters,
            numbers,
            metric,
        }
    }

    /// Load the glyph libraries from `<assets>/letters` and
    /// `<assets>/numbers`.
    pub fn load(assets_dir: &Path, metric: ColorMetric) -> Result<Self, VisionError> {
        let letters = TemplateLibrary::load(
            &assets_dir.join("letters"),
            IMG_SIZE_VERY_SMALL,
            IMG_SIZE_VERY_SMALL,
        )?;
        let numbers = TemplateLibrary::load(
            &assets_dir.join("numbers"),
            IMG_SIZE_VERY_SMALL,
            IMG_SIZE_VERY_SMALL,
        )?;
        Ok(Self::new(letters, numbers, metric))
    }

    /// Partition the region into character slots and classify each
    /// non-blank slot. Blank slots are absent letters, not terminators:
    /// iteration always covers every slot.
    pub fn recognize_name(
        &self,
        region: &RgbImage,
        geometry: &SlotGeometry,
    ) -> Result<String, VisionError> {
        let mut name = String::new();
        for slot in geometry.crop_slots(region) {
            if self.metric.is_white(&slot) {
                continue;
            }
            name.push_str(self.letters.classify(&slot, &self.metric)?);
        }
        debug!(%name, "recognized name");
        Ok(name)
    }

    /// Same segmentation against the digit library, parsed base-10. An
    /// all-blank region is a caller-visible error, never a silent zero.
    pub fn recognize_number(
        &self,
        region: &RgbImage,
        geometry: &SlotGeometry,
    ) -> Result<u32, VisionError> {
        let mut digits = String::new();
        for slot in geometry.crop_slots(region) {
            if self.metric.is_white(&slot) {
                continue;
            }
            digits.push_str(self.numbers.classify(&slot, &self.metric)?);
        }
        if digits.is_empty() {
            return Err(VisionError::EmptyNumber);
        }
        debug!(%digits, "recognized number");
        digits
            .parse()
            .map_err(|_| VisionError::BadNumber(digits))
    }
}
