//! Swapping calibration saves into the emulator's save directory.
//!
//! The manager owns the renamed originals from `swap` until `cleanup`
//! restores them. Originals are renamed in place (same directory), so a
//! crash mid-hunt leaves both the user's saves and the staged copies on
//! disk under distinct names.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::SaveError;

/// The two files one game profile keeps: battery-backed save and
/// real-time-clock state.
#[derive(Debug, Clone)]
pub struct SaveFilePair {
    pub battery: PathBuf,
    pub rtc: PathBuf,
}

impl SaveFilePair {
    /// The live save files the emulator reads, named by ROM identity.
    pub fn for_rom(dir: &Path, rom_name: &str) -> Self {
        Self {
            battery: dir.join(format!("{rom_name}.srm")),
            rtc: dir.join(format!("{rom_name}.rtc")),
        }
    }

    /// The calibration saves for a species, positioned at the start of its
    /// static encounter.
    pub fn for_species(dir: &Path, species_name: &str) -> Self {
        let slug = species_name.to_lowercase().replace(' ', "-");
        Self {
            battery: dir.join(format!("{slug}.srm")),
            rtc: dir.join(format!("{slug}.rtc")),
        }
    }
}

#[derive(Debug)]
struct RenamedOriginals {
    battery: Option<PathBuf>,
    rtc: Option<PathBuf>,
}

pub struct SaveStateManager {
    saves_dir: PathBuf,
    native_dir: PathBuf,
    rom_name: String,
    renamed: Option<RenamedOriginals>,
}

impl SaveStateManager {
    pub fn new(saves_dir: PathBuf, native_dir: PathBuf, rom_name: String) -> Self {
        Self {
            saves_dir,
            native_dir,
            rom_name,
            renamed: None,
        }
    }

    /// Rename the user's saves aside and copy the species' calibration
    /// saves in under the ROM's names. Any failure here is fatal to
    /// starting a hunt: no button may be pressed on a half-swapped save
    /// directory.
    pub fn swap(&mut self, species_name: &str) -> Result<(), SaveError> {
        let calibration = SaveFilePair::for_species(&self.native_dir, species_name);
        if !calibration.battery.is_file() {
            return Err(SaveError::MissingCalibration(calibration.battery));
        }
        if !calibration.rtc.is_file() {
            return Err(SaveError::MissingCalibration(calibration.rtc));
        }

        let live = SaveFilePair::for_rom(&self.saves_dir, &self.rom_name);
        // Record each rename as it happens: if the second one fails,
        // cleanup must still know how to put the first file back.
        let battery = rename_aside(&live.battery)?;
        self.renamed = Some(RenamedOriginals { battery, rtc: None });
        let rtc = rename_aside(&live.rtc)?;
        if let Some(renamed) = self.renamed.as_mut() {
            renamed.rtc = rtc;
        }

        fs::copy(&calibration.battery, &live.battery)
            .map_err(|e| SaveError::Stage(calibration.battery.clone(), e))?;
        fs::copy(&calibration.rtc, &live.rtc)
            .map_err(|e| SaveError::Stage(calibration.rtc.clone(), e))?;
        info!(species = species_name, "calibration saves staged");
        Ok(())
    }

    /// Delete the staged copies and restore the renamed originals.
    /// Idempotent, and safe to call from any exit path, including when
    /// `swap` never ran or failed partway.
    pub fn cleanup(&mut self) -> Result<(), SaveError> {
        let Some(renamed) = self.renamed.take() else {
            return Ok(());
        };
        let live = SaveFilePair::for_rom(&self.saves_dir, &self.rom_name);
        remove_staged(&live.battery);
        remove_staged(&live.rtc);
        restore(renamed.battery.as_deref(), &live.battery)?;
        restore(renamed.rtc.as_deref(), &live.rtc)?;
        info!("original saves restored");
        Ok(())
    }
}

/// Move an existing file to `<name>.bak`, returning the new path. A file
/// that does not exist (fresh profile) is simply not renamed.
fn rename_aside(path: &Path) -> Result<Option<PathBuf>, SaveError> {
    if !path.is_file() {
        return Ok(None);
    }
    let mut aside = path.as_os_str().to_owned();
    aside.push(".bak");
    let aside = PathBuf::from(aside);
    fs::rename(path, &aside).map_err(|e| SaveError::SetAside(path.to_path_buf(), e))?;
    Ok(Some(aside))
}

fn remove_staged(path: &Path) {
    if path.is_file() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), "failed to remove staged save: {e}");
        }
    }
}

fn restore(aside: Option<&Path>, original: &Path) -> Result<(), SaveError> {
    if let Some(aside) = aside {
        if aside.is_file() {
            fs::rename(aside, original)
                .map_err(|e| SaveError::Restore(aside.to_path_buf(), e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("shinybot-saves-{}", Uuid::new_v4()));
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn dir_contents(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let path = e.unwrap().path();
                (
                    path.file_name().unwrap().to_string_lossy().to_string(),
                    fs::read(&path).unwrap(),
                )
            })
            .collect()
    }

    fn setup() -> (TempDir, TempDir, SaveStateManager) {
        let saves = TempDir::new();
        let native = TempDir::new();
        fs::write(saves.0.join("rom.srm"), b"user battery").unwrap();
        fs::write(saves.0.join("rom.rtc"), b"user rtc").unwrap();
        fs::write(native.0.join("suicune.srm"), b"calib battery").unwrap();
        fs::write(native.0.join("suicune.rtc"), b"calib rtc").unwrap();
        let manager =
            SaveStateManager::new(saves.0.clone(), native.0.clone(), "rom".to_string());
        (saves, native, manager)
    }

    #[test]
    fn swap_then_cleanup_is_byte_identical() {
        let (saves, _native, mut manager) = setup();
        let before = dir_contents(&saves.0);

        manager.swap("SUICUNE").unwrap();
        assert_eq!(fs::read(saves.0.join("rom.srm")).unwrap(), b"calib battery");
        assert!(saves.0.join("rom.srm.bak").is_file());

        manager.cleanup().unwrap();
        assert_eq!(dir_contents(&saves.0), before);
    }

    #[test]
    fn cleanup_is_idempotent_and_safe_without_swap() {
        let (saves, _native, mut manager) = setup();
        let before = dir_contents(&saves.0);
        manager.cleanup().unwrap();
        manager.swap("SUICUNE").unwrap();
        manager.cleanup().unwrap();
        manager.cleanup().unwrap();
        assert_eq!(dir_contents(&saves.0), before);
    }

    #[test]
    fn missing_calibration_save_is_fatal() {
        let (saves, _native, mut manager) = setup();
        let before = dir_contents(&saves.0);
        assert!(matches!(
            manager.swap("LUGIA"),
            Err(SaveError::MissingCalibration(_))
        ));
        // Nothing was touched.
        assert_eq!(dir_contents(&saves.0), before);
    }

    #[test]
    fn fresh_profile_without_originals_swaps_cleanly() {
        let saves = TempDir::new();
        let native = TempDir::new();
        fs::write(native.0.join("lugia.srm"), b"cb").unwrap();
        fs::write(native.0.join("lugia.rtc"), b"cr").unwrap();
        let mut manager =
            SaveStateManager::new(saves.0.clone(), native.0.clone(), "rom".to_string());
        manager.swap("LUGIA").unwrap();
        assert!(saves.0.join("rom.srm").is_file());
        manager.cleanup().unwrap();
        assert!(dir_contents(&saves.0).is_empty());
    }
}
