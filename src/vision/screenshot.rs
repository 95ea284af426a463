//! Polling the emulator's screenshot directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use image::RgbImage;
use tracing::warn;

use crate::error::VisionError;

/// A screenshot on disk, identified by path, with its filesystem creation
/// time. The emulator writes them; the perception pipeline consumes and
/// deletes them unless one is retained as an attachment.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub path: PathBuf,
    pub captured_at: DateTime<Utc>,
}

impl Screenshot {
    pub fn load(&self) -> Result<RgbImage, VisionError> {
        Ok(image::open(&self.path)
            .map_err(|e| VisionError::Image(self.path.clone(), e))?
            .to_rgb8())
    }

    /// Remove the file. Best-effort: a screenshot already gone is fine.
    pub fn delete(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "failed to delete screenshot: {e}");
        }
    }
}

/// Watches one directory for `*.png` screenshots. There is no file
/// locking; callers rely on the settle delay to ensure the emulator has
/// finished writing before a read.
pub struct ScreenshotStore {
    dir: PathBuf,
}

impl ScreenshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// All screenshots, oldest first. Files with equal timestamps sort by
    /// path so the order is stable.
    pub fn all_sorted(&self) -> Result<Vec<Screenshot>, VisionError> {
        let read_dir =
            fs::read_dir(&self.dir).map_err(|e| VisionError::Io(self.dir.clone(), e))?;
        let mut shots = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| VisionError::Io(self.dir.clone(), e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let captured_at = DateTime::<Utc>::from(file_time(&path));
            shots.push(Screenshot { path, captured_at });
        }
        shots.sort_by(|a, b| (a.captured_at, &a.path).cmp(&(b.captured_at, &b.path)));
        Ok(shots)
    }

    /// The most recent screenshot, by filesystem creation time.
    pub fn latest(&self) -> Result<Screenshot, VisionError> {
        self.all_sorted()?
            .pop()
            .ok_or_else(|| VisionError::NoScreenshot(self.dir.clone()))
    }
}

fn file_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
