use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// User-facing settings, merged from `shinybot.toml` (optional) and
/// `SHINYBOT_*` environment variables over built-in defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path or command used to launch the RetroArch executable.
    pub retroarch_app: String,
    /// The emulator's own `retroarch.cfg`, parsed for directories and hotkeys.
    pub retroarch_cfg: PathBuf,
    /// Directory holding calibration saves, one pair per species.
    pub native_saves_dir: PathBuf,
    /// Root of the template/sprite asset library.
    pub assets_dir: PathBuf,
    /// ROM name as it appears in the emulator's save directory.
    pub rom_name: String,
    /// Game title used to select the sprite set (e.g. "crystal").
    pub game: String,
    /// Species to hunt; must have an entry in the static encounter table.
    pub species: String,
    /// Attempt budget for one hunt.
    pub max_attempts: u32,
    /// Average fps the emulator core actually runs at. All delays are
    /// calibrated against a 300 fps basis and scaled by this value.
    pub emulator_avg_fps: f64,
    pub username: String,
    pub receiver_email: Option<String>,
    pub sender_email: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("retroarch_app", "retroarch")?
            .set_default("retroarch_cfg", "retroarch.cfg")?
            .set_default("native_saves_dir", "saves")?
            .set_default("assets_dir", "assets")?
            .set_default("rom_name", "Pokemon - Crystal Version (USA, Europe)")?
            .set_default("game", "crystal")?
            .set_default("species", "SUICUNE")?
            .set_default("max_attempts", 8000)?
            .set_default("emulator_avg_fps", 300.0)?
            .set_default("username", "User")?
            .add_source(File::with_name("shinybot").required(false))
            .add_source(Environment::with_prefix("SHINYBOT"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let settings = Settings::load().expect("defaults should deserialize");
        assert_eq!(settings.max_attempts, 8000);
        assert_eq!(settings.emulator_avg_fps, 300.0);
        assert_eq!(settings.species, "SUICUNE");
        assert!(settings.receiver_email.is_none());
    }
}
