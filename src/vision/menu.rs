//! Menu overlay classification and battle detection.

use std::fmt;
use std::path::Path;

use image::RgbImage;
use tracing::debug;

use super::color::{ColorMetric, IMG_SIZE_MED};
use super::region::{Region, HP_BAR_LOWER, HP_BAR_UPPER};
use crate::error::VisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    Start,
    Continue,
    Pause,
    Items,
    Battle,
}

impl MenuKind {
    pub const ALL: [MenuKind; 5] = [
        MenuKind::Start,
        MenuKind::Continue,
        MenuKind::Pause,
        MenuKind::Items,
        MenuKind::Battle,
    ];

    /// Calibrated overlay region for each menu kind.
    pub fn region(self) -> Region {
        match self {
            MenuKind::Start => Region::new(0.0, 0.0, 0.85, 0.45),
            MenuKind::Continue => Region::new(0.2, 0.45, 1.0, 1.0),
            MenuKind::Pause => Region::new(0.5, 0.0, 1.0, 1.0),
            MenuKind::Items => Region::new(0.0, 0.05, 0.25, 0.6),
            MenuKind::Battle => Region::new(0.4, 0.7, 1.0, 1.0),
        }
    }

    fn asset_name(self) -> String {
        format!("menu_{self}.png")
    }
}

impl fmt::Display for MenuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuKind::Start => write!(f, "start"),
            MenuKind::Continue => write!(f, "continue"),
            MenuKind::Pause => write!(f, "pause"),
            MenuKind::Items => write!(f, "items"),
            MenuKind::Battle => write!(f, "battle"),
        }
    }
}

/// Fraction of the reference dimensions used as the comparison resolution.
const MENU_RESIZE_FRACTION: f64 = 0.05;

/// Classifies which menu overlay is shown, assuming one is open.
pub struct MenuClassifier {
    refs: Vec<(MenuKind, RgbImage)>,
    metric: ColorMetric,
}

impl MenuClassifier {
    /// Load one reference image per menu kind from `<assets>/menus`.
    pub fn load(menu_dir: &Path, metric: ColorMetric) -> Result<Self, VisionError> {
        let mut refs = Vec::with_capacity(MenuKind::ALL.len());
        for kind in MenuKind::ALL {
            let path = menu_dir.join(kind.asset_name());
            let img = image::open(&path)
                .map_err(|e| VisionError::Image(path.clone(), e))?
                .to_rgb8();
            refs.push((kind, img));
        }
        Ok(Self::new(refs, metric))
    }

    pub fn new(refs: Vec<(MenuKind, RgbImage)>, metric: ColorMetric) -> Self {
        Self { refs, metric }
    }

    /// Crop each kind's calibrated region and return the kind whose
    /// reference is closest in pixel distance.
    pub fn classify(&self, screen: &RgbImage) -> Result<MenuKind, VisionError> {
        let mut best: Option<(MenuKind, f64)> = None;
        for (kind, reference) in &self.refs {
            let crop = kind.region().crop(screen);
            let rw = ((reference.width() as f64 * MENU_RESIZE_FRACTION) as u32).max(1);
            let rh = ((reference.height() as f64 * MENU_RESIZE_FRACTION) as u32).max(1);
            let diff = self.metric.compare_pixels(&crop, reference, rw, rh);
            if best.map_or(true, |(_, d)| diff < d) {
                best = Some((*kind, diff));
            }
        }
        let (kind, diff) = best.ok_or_else(|| VisionError::EmptyLibrary("menus".into()))?;
        debug!(%kind, diff, "classified menu");
        Ok(kind)
    }
}

/// Detects an active battle from the two HP-box strips.
pub struct BattleDetector {
    hp_box_ref: RgbImage,
    metric: ColorMetric,
}

impl BattleDetector {
    /// Load the HP-box reference from `<assets>/battle/hp.png`.
    pub fn load(assets_dir: &Path, metric: ColorMetric) -> Result<Self, VisionError> {
        let path = assets_dir.join("battle").join("hp.png");
        let hp_box_ref = image::open(&path)
            .map_err(|e| VisionError::Image(path.clone(), e))?
            .to_rgb8();
        Ok(Self::new(hp_box_ref, metric))
    }

    pub fn new(hp_box_ref: RgbImage, metric: ColorMetric) -> Self {
        Self { hp_box_ref, metric }
    }

    /// Both combatants' HP-box strips must be pixel-identical to each
    /// other AND to the reference graphic. The double equality guards
    /// against an arbitrary uniform region matching by accident.
    pub fn is_in_battle(&self, screen: &RgbImage) -> bool {
        let upper = HP_BAR_UPPER.crop(screen);
        let lower = HP_BAR_LOWER.crop(screen);
        let strips_match = self
            .metric
            .compare_pixels(&upper, &lower, IMG_SIZE_MED, IMG_SIZE_MED)
            == 0.0;
        let reference_match = self
            .metric
            .compare_pixels(&upper, &self.hp_box_ref, IMG_SIZE_MED, IMG_SIZE_MED)
            == 0.0;
        strips_match && reference_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        ImageBuffer::from_pixel(w, h, Rgb(rgb))
    }

    fn fill_region(img: &mut RgbImage, region: Region, rgb: [u8; 3]) {
        let (w, h) = (img.width() as f64, img.height() as f64);
        for x in (region.left * w) as u32..(region.right * w) as u32 {
            for y in (region.top * h) as u32..(region.bottom * h) as u32 {
                img.put_pixel(x, y, Rgb(rgb));
            }
        }
    }

    #[test]
    fn each_menu_kind_wins_its_own_fixture() {
        let metric = ColorMetric::default();
        for target in MenuKind::ALL {
            let mut screen = solid(160, 144, [255, 255, 255]);
            fill_region(&mut screen, target.region(), [40, 90, 160]);
            // The target's reference matches its crop; every other kind
            // gets a far-off reference.
            let refs = MenuKind::ALL
                .iter()
                .map(|&kind| {
                    let img = if kind == target {
                        target.region().crop(&screen)
                    } else {
                        solid(40, 40, [5, 5, 5])
                    };
                    (kind, img)
                })
                .collect();
            let classifier = MenuClassifier::new(refs, metric);
            assert_eq!(classifier.classify(&screen).unwrap(), target);
        }
    }

    #[test]
    fn battle_requires_both_strips_and_the_reference_to_agree() {
        let metric = ColorMetric::default();
        let hp_color = [20, 20, 20];

        let mut in_battle = solid(160, 144, [255, 255, 255]);
        fill_region(&mut in_battle, HP_BAR_UPPER, hp_color);
        fill_region(&mut in_battle, HP_BAR_LOWER, hp_color);

        let reference = HP_BAR_UPPER.crop(&in_battle);
        let detector = BattleDetector::new(reference, metric);
        assert!(detector.is_in_battle(&in_battle));

        // Strips agree with each other but not with the reference: a
        // uniform white scene must not read as a battle.
        let blank = solid(160, 144, [255, 255, 255]);
        assert!(!detector.is_in_battle(&blank));

        // Only one strip shows the HP box.
        let mut half = solid(160, 144, [255, 255, 255]);
        fill_region(&mut half, HP_BAR_UPPER, hp_color);
        assert!(!detector.is_in_battle(&half));
    }
}
