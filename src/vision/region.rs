//! Fixed-fraction crop geometry.
//!
//! Every constant in this module encodes an empirically measured screen
//! fraction, valid only for the generation II Game Boy layout the bot is
//! calibrated against. Recalibrate against your own fixture screenshots
//! before trusting the numbers on a different display pipeline.

use image::imageops;
use image::RgbImage;

/// A rectangle expressed as fractional offsets of a parent image.
/// Resolved to pixels only at crop time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Region {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Resolve against the image dimensions and return the sub-image.
    /// Degenerate bounds (right before left, bottom before top, edges past
    /// the image) clamp to an empty crop rather than panicking.
    pub fn crop(&self, img: &RgbImage) -> RgbImage {
        let w = img.width() as f64;
        let h = img.height() as f64;
        crop_px(
            img,
            self.left * w,
            self.top * h,
            self.right * w,
            self.bottom * h,
        )
    }
}

/// Pixel-space crop with the same clamping rules as [`Region::crop`].
pub(crate) fn crop_px(img: &RgbImage, left: f64, top: f64, right: f64, bottom: f64) -> RgbImage {
    let left = left.max(0.0).min(img.width() as f64) as u32;
    let top = top.max(0.0).min(img.height() as f64) as u32;
    let right = (right.max(0.0).min(img.width() as f64) as u32).max(left);
    let bottom = (bottom.max(0.0).min(img.height() as f64) as u32).max(top);
    imageops::crop_imm(img, left, top, right - left, bottom - top).to_image()
}

/// HP-box strips below each combatant's name. Both show the identical HP
/// frame graphic during battle; outside battle they show arbitrary scene.
pub const HP_BAR_UPPER: Region = Region::new(0.1, 0.125, 0.2, 0.15);
pub const HP_BAR_LOWER: Region = Region::new(0.5, 0.515, 0.6, 0.54);

/// Item portion of a pack screenshot: rows start one row-height down and
/// the name column begins at 40% of the width. Five rows are visible.
pub const PACK_ITEM_BOX: Region = Region::new(0.4, 1.0 / 9.0, 1.0, 6.0 / 9.0);
pub const PACK_ITEM_ROWS: u32 = 5;

/// The enemy sprite box in battle: a square of 35% of the screen width,
/// anchored at 60% from the left, flush with the top.
pub const BATTLE_SPRITE_LEFT: f64 = 0.6;
pub const BATTLE_SPRITE_SIZE: f64 = 0.35;

pub fn crop_battle_sprite(img: &RgbImage) -> RgbImage {
    let side = img.width() as f64 * BATTLE_SPRITE_SIZE;
    let left = img.width() as f64 * BATTLE_SPRITE_LEFT;
    crop_px(img, left, 0.0, left + side, side)
}

/// Evenly spaced fixed-width character slots inside a text region.
#[derive(Debug, Clone, Copy)]
pub struct SlotGeometry {
    /// Maximum number of character slots the region can hold.
    pub slots: u32,
    /// Slot width as a fraction of the region width.
    pub char_width: f64,
    /// Gap between slots as a fraction of the region width.
    pub gap: f64,
    /// Left margin of the first slot, fraction of the region width.
    pub left: f64,
    /// Top edge of the slot row, fraction of the region height.
    pub top: f64,
    /// Square slots are char-width pixels tall; otherwise slots extend to
    /// the bottom of the region.
    pub square: bool,
    /// Trim one gap width off the right edge of each slot.
    pub trim_gap: bool,
}

impl SlotGeometry {
    /// Partition the region into slot crops, in slot order. Blank-slot
    /// handling is the caller's concern.
    pub fn crop_slots(&self, img: &RgbImage) -> Vec<RgbImage> {
        let w = img.width() as f64;
        let h = img.height() as f64;
        let char_w = w * self.char_width;
        let gap = w * self.gap;
        let top = h * self.top;
        (0..self.slots)
            .map(|i| {
                let left = self.left * w + i as f64 * (char_w + gap);
                let right = left + char_w - if self.trim_gap { gap } else { 0.0 };
                let bottom = if self.square { top + char_w } else { h };
                crop_px(img, left, top, right, bottom)
            })
            .collect()
    }
}

/// Name of the enemy in battle: up to 10 characters along the top edge.
pub const BATTLE_NAME_SLOTS: SlotGeometry = SlotGeometry {
    slots: 10,
    char_width: 0.04375,
    gap: 0.04375 / 7.0,
    left: 0.05,
    top: 0.0,
    square: true,
    trim_gap: false,
};

/// The lower name shown while a thrown ball resolves; compared against the
/// pre-throw battle name to decide whether the capture held.
pub const CAPTURE_NAME_SLOTS: SlotGeometry = SlotGeometry {
    slots: 10,
    char_width: 0.04375,
    gap: 0.04375 / 7.0,
    left: 0.45,
    top: 0.775,
    square: true,
    trim_gap: false,
};

/// Item names inside one pack row strip: up to 12 characters.
pub const ITEM_NAME_SLOTS: SlotGeometry = SlotGeometry {
    slots: 12,
    char_width: 0.0725,
    gap: 0.0725 * 0.15,
    left: 0.0,
    top: 0.0,
    square: false,
    trim_gap: false,
};

/// Item quantity strip: at most 2 digits.
pub const ITEM_QTY_SLOTS: SlotGeometry = SlotGeometry {
    slots: 2,
    char_width: 0.475,
    gap: 0.05,
    left: 0.0,
    top: 0.0,
    square: false,
    trim_gap: true,
};
