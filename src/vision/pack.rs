//! Reading pack (inventory) screenshots.

use image::RgbImage;
use tracing::debug;

use super::name::NameRecognizer;
use super::region::{crop_px, Region, ITEM_NAME_SLOTS, ITEM_QTY_SLOTS, PACK_ITEM_BOX, PACK_ITEM_ROWS};
use crate::error::VisionError;

/// One recognized pack row. Quantity is absent for key items and HMs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackItem {
    pub name: String,
    pub qty: Option<u32>,
}

/// Name strip height within a row, as a fraction of the row width.
const ITEM_NAME_HEIGHT: f64 = 0.0725;
/// Quantity strip geometry within a row.
const ITEM_QTY_TOP: f64 = 0.5575;
const ITEM_QTY_HEIGHT: f64 = 0.0625;
const ITEM_QTY_LEFT: f64 = 0.8325;
const ITEM_QTY_RIGHT: f64 = 0.9975;

/// Read the visible item rows from a pack screenshot. A blank name (or the
/// trailing `cancel` entry) means end of list: this is the one place where
/// blank text terminates the scan instead of being skipped.
pub fn read_pack_items(
    screen: &RgbImage,
    recognizer: &NameRecognizer,
    read_qty: bool,
) -> Result<Vec<PackItem>, VisionError> {
    let item_box = PACK_ITEM_BOX.crop(screen);
    let row_height = 1.0 / PACK_ITEM_ROWS as f64;
    let mut items = Vec::new();
    for i in 0..PACK_ITEM_ROWS {
        let row = Region::new(
            0.0,
            i as f64 * row_height,
            1.0,
            (i + 1) as f64 * row_height,
        )
        .crop(&item_box);
        let name = read_item_name(&row, recognizer)?;
        if name.is_empty() || name == "cancel" {
            break;
        }
        let qty = if read_qty {
            read_item_qty(&row, recognizer)?
        } else {
            None
        };
        debug!(%name, ?qty, "pack item");
        items.push(PackItem { name, qty });
    }
    Ok(items)
}

fn read_item_name(row: &RgbImage, recognizer: &NameRecognizer) -> Result<String, VisionError> {
    let strip_height = row.width() as f64 * ITEM_NAME_HEIGHT;
    let strip = crop_px(row, 0.0, 0.0, row.width() as f64, strip_height);
    recognizer.recognize_name(&strip, &ITEM_NAME_SLOTS)
}

fn read_item_qty(row: &RgbImage, recognizer: &NameRecognizer) -> Result<Option<u32>, VisionError> {
    let w = row.width() as f64;
    let h = row.height() as f64;
    let top = h * ITEM_QTY_TOP;
    let strip = crop_px(
        row,
        w * ITEM_QTY_LEFT,
        top,
        w * ITEM_QTY_RIGHT,
        top + w * ITEM_QTY_HEIGHT,
    );
    match recognizer.recognize_number(&strip, &ITEM_QTY_SLOTS) {
        Ok(qty) => Ok(Some(qty)),
        // HMs and key items render no quantity; that is data, not a fault.
        Err(VisionError::EmptyNumber) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Ball kinds in throw-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallKind {
    Master,
    Ultra,
    Great,
    Poke,
    Safari,
    Fast,
    Level,
    Lure,
    Heavy,
    Love,
    Friend,
    Moon,
    Sport,
}

impl BallKind {
    pub const PRIORITY: [BallKind; 13] = [
        BallKind::Master,
        BallKind::Ultra,
        BallKind::Great,
        BallKind::Poke,
        BallKind::Safari,
        BallKind::Fast,
        BallKind::Level,
        BallKind::Lure,
        BallKind::Heavy,
        BallKind::Love,
        BallKind::Friend,
        BallKind::Moon,
        BallKind::Sport,
    ];

    /// Label as it reads out of the pack item list.
    pub fn label(self) -> &'static str {
        match self {
            BallKind::Master => "masterball",
            BallKind::Ultra => "ultraball",
            BallKind::Great => "greatball",
            BallKind::Poke => "pokeball",
            BallKind::Safari => "safariball",
            BallKind::Fast => "fastball",
            BallKind::Level => "levelball",
            BallKind::Lure => "lureball",
            BallKind::Heavy => "heavyball",
            BallKind::Love => "loveball",
            BallKind::Friend => "friendball",
            BallKind::Moon => "moonball",
            BallKind::Sport => "sportball",
        }
    }
}

/// Highest-priority ball present in the inventory with stock remaining.
/// Returns the ball and its row index (the cursor offset needed to reach
/// it in the pocket list).
pub fn best_ball(items: &[PackItem]) -> Option<(BallKind, usize)> {
    for ball in BallKind::PRIORITY {
        if let Some(index) = items
            .iter()
            .position(|item| item.name == ball.label() && item.qty != Some(0))
        {
            return Some((ball, index));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    use crate::vision::color::ColorMetric;
    use crate::vision::template::TemplateLibrary;

    fn recognizer() -> NameRecognizer {
        let glyph = |rgb: [u8; 3]| -> RgbImage { ImageBuffer::from_pixel(8, 8, Rgb(rgb)) };
        NameRecognizer::new(
            TemplateLibrary::from_entries(vec![("x".to_string(), glyph([80, 10, 10]))], 8, 8),
            TemplateLibrary::from_entries(vec![("7".to_string(), glyph([10, 10, 80]))], 8, 8),
            ColorMetric::default(),
        )
    }

    #[test]
    fn all_blank_pack_reads_as_empty() {
        let screen: RgbImage = ImageBuffer::from_pixel(320, 288, Rgb([255, 255, 255]));
        let items = read_pack_items(&screen, &recognizer(), true).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn best_ball_follows_priority_and_skips_empty_stock() {
        let items = vec![
            PackItem {
                name: "pokeball".to_string(),
                qty: Some(10),
            },
            PackItem {
                name: "ultraball".to_string(),
                qty: Some(0),
            },
            PackItem {
                name: "greatball".to_string(),
                qty: Some(3),
            },
        ];
        assert_eq!(best_ball(&items), Some((BallKind::Great, 2)));
        assert_eq!(best_ball(&[]), None);
    }
}
