//! Nearest-neighbor template classification against a labeled library.

use std::path::{Path, PathBuf};

use image::RgbImage;
use indexmap::IndexMap;
use tracing::debug;

use super::color::ColorMetric;
use crate::error::VisionError;

/// Ordered filename-to-label decode rules. Symbols that cannot appear in a
/// filename are escaped with underscores; each rule is only reached when
/// every earlier substring match fails, so the order is load-bearing.
///
/// - `a_._b`  -> `a. b`   (period)
/// - `ho_-oh` -> `ho-oh`  (dash)
/// - `farfetch_'d` -> `farfetch'd` (apostrophe)
/// - `pok_e`  -> `poke`   (the e-acute glyph family)
/// - `nidoran_f` -> `nidoran f` (gender symbols, space-separated)
pub fn decode_label(stem: &str) -> String {
    if !stem.contains('_') {
        return stem.to_string();
    }
    if stem.contains('.') {
        stem.replace("_._", ". ")
    } else if stem.contains('-') {
        stem.replace('_', "")
    } else if stem.contains('\'') {
        stem.replace('_', "")
    } else if stem.contains('e') {
        stem.replace('_', "")
    } else {
        stem.replace('_', " ")
    }
}

/// A label → reference-image mapping, immutable at runtime. Entries are
/// sorted by label at load time and always iterated in that order, so
/// classification ties resolve to the lexicographically smallest label on
/// every platform.
pub struct TemplateLibrary {
    entries: IndexMap<String, RgbImage>,
    resize_width: u32,
    resize_height: u32,
}

impl TemplateLibrary {
    /// Load every `*.png` in `dir`, decoding labels from file stems.
    pub fn load(dir: &Path, resize_width: u32, resize_height: u32) -> Result<Self, VisionError> {
        let mut entries = Vec::new();
        let read_dir =
            std::fs::read_dir(dir).map_err(|e| VisionError::Io(dir.to_path_buf(), e))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| VisionError::Io(dir.to_path_buf(), e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let img = image::open(&path)
                .map_err(|e| VisionError::Image(path.clone(), e))?
                .to_rgb8();
            entries.push((decode_label(&stem), img));
        }
        if entries.is_empty() {
            return Err(VisionError::EmptyLibrary(dir.to_path_buf()));
        }
        debug!(dir = %dir.display(), entries = entries.len(), "loaded template library");
        Ok(Self::from_entries(entries, resize_width, resize_height))
    }

    pub fn from_entries(
        mut entries: Vec<(String, RgbImage)>,
        resize_width: u32,
        resize_height: u32,
    ) -> Self {
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        Self {
            entries: entries.into_iter().collect(),
            resize_width,
            resize_height,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Label of the reference image with minimum aggregate pixel distance
    /// to the probe. Strict `<` keeps the first minimum, so ties go to the
    /// earliest (smallest) label.
    pub fn classify(&self, probe: &RgbImage, metric: &ColorMetric) -> Result<&str, VisionError> {
        if probe.width() == 0 || probe.height() == 0 {
            return Err(VisionError::EmptyCrop);
        }
        let mut best: Option<(&str, f64)> = None;
        for (label, reference) in &self.entries {
            let diff = metric.compare_pixels(probe, reference, self.resize_width, self.resize_height);
            if best.map_or(true, |(_, d)| diff < d) {
                best = Some((label, diff));
            }
        }
        best.map(|(label, _)| label)
            .ok_or_else(|| VisionError::EmptyLibrary(PathBuf::new()))
    }
}
