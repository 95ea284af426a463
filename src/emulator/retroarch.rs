//! RetroArch configuration and process lifecycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::EmulatorError;

/// Player-1 button binds from retroarch.cfg.
#[derive(Debug, Clone)]
pub struct PlayerBindings {
    pub a: String,
    pub b: String,
    pub start: String,
    pub select: String,
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
}

/// Frontend hotkeys the bot drives.
#[derive(Debug, Clone)]
pub struct HotkeyBindings {
    pub fast_forward: String,
    pub pause: String,
    pub reset: String,
    pub screenshot: String,
}

/// The subset of retroarch.cfg the bot needs: where files land and which
/// keys drive the frontend.
#[derive(Debug, Clone)]
pub struct RetroArchConfig {
    pub savefile_dir: PathBuf,
    pub screenshot_dir: PathBuf,
    pub player1: PlayerBindings,
    pub hotkeys: HotkeyBindings,
}

impl RetroArchConfig {
    pub fn parse(path: &Path) -> Result<Self, EmulatorError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EmulatorError::ConfigRead(path.to_path_buf(), e))?;
        let map = parse_entries(&text);
        let config = Self {
            savefile_dir: PathBuf::from(require(&map, "savefile_directory")?),
            screenshot_dir: PathBuf::from(require(&map, "screenshot_directory")?),
            player1: PlayerBindings {
                a: require(&map, "input_player1_a")?,
                b: require(&map, "input_player1_b")?,
                start: require(&map, "input_player1_start")?,
                select: require(&map, "input_player1_select")?,
                up: require(&map, "input_player1_up")?,
                down: require(&map, "input_player1_down")?,
                left: require(&map, "input_player1_left")?,
                right: require(&map, "input_player1_right")?,
            },
            hotkeys: HotkeyBindings {
                fast_forward: require(&map, "input_toggle_fast_forward")?,
                pause: require(&map, "input_pause_toggle")?,
                reset: require(&map, "input_reset")?,
                screenshot: require(&map, "input_screenshot")?,
            },
        };
        debug!(savefile_dir = %config.savefile_dir.display(),
               screenshot_dir = %config.screenshot_dir.display(),
               "parsed retroarch config");
        Ok(config)
    }
}

/// retroarch.cfg lines look like `key = "value"`.
fn parse_entries(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        if let Some((key, value)) = line.split_once('=') {
            map.insert(
                key.trim().to_string(),
                value.trim().trim_matches('"').to_string(),
            );
        }
    }
    map
}

fn require(map: &HashMap<String, String>, key: &str) -> Result<String, EmulatorError> {
    map.get(key)
        .cloned()
        .ok_or_else(|| EmulatorError::MissingConfigKey(key.to_string()))
}

/// Owns the launched emulator process.
pub struct RetroArchProcess {
    app: String,
    child: Option<Child>,
}

impl RetroArchProcess {
    pub fn new(app: String) -> Self {
        Self { app, child: None }
    }

    pub async fn launch(&mut self) -> Result<(), EmulatorError> {
        info!(app = %self.app, "launching emulator");
        let child = Command::new(&self.app)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| EmulatorError::Launch(self.app.clone(), e))?;
        self.child = Some(child);
        Ok(())
    }

    /// Kill the emulator if it is still ours to kill. Safe to call twice.
    pub async fn kill(&mut self) -> Result<(), EmulatorError> {
        if let Some(mut child) = self.child.take() {
            match child.kill().await {
                Ok(()) => info!("killed emulator process"),
                Err(e) => {
                    warn!("emulator process did not die cleanly: {e}");
                    return Err(EmulatorError::Kill(e));
                }
            }
        }
        Ok(())
    }
}
