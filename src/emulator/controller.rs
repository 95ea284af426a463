//! Simulated controller input.
//!
//! Every interactive action goes through the same `(presses, delay_after)`
//! shape; the backend underneath only knows how to tap one named key.

use async_trait::async_trait;
use rdev::{simulate, EventType, Key};
use std::time::Duration;
use tracing::debug;

use super::retroarch::{HotkeyBindings, PlayerBindings};
use super::Timing;
use crate::error::EmulatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameButton {
    A,
    B,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
}

impl GameButton {
    /// Decode one character of a shorthand button sequence.
    pub fn from_sequence_char(c: char) -> Result<Self, EmulatorError> {
        match c {
            'a' => Ok(GameButton::A),
            'b' => Ok(GameButton::B),
            's' => Ok(GameButton::Start),
            'u' => Ok(GameButton::Up),
            'd' => Ok(GameButton::Down),
            'l' => Ok(GameButton::Left),
            'r' => Ok(GameButton::Right),
            _ => Err(EmulatorError::UnknownSequenceChar(c)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    FastForward,
    Pause,
    Reset,
    Screenshot,
}

/// One key tap on whatever input device the emulator listens to.
#[async_trait]
pub trait InputBackend: Send + Sync {
    async fn tap(&self, key: &str) -> Result<(), EmulatorError>;
}

/// Key injection at the OS level via `rdev`. The emulator window must be
/// focused; there is no way to target a process directly.
pub struct RdevBackend {
    /// Hold between press and release so the core's input poll sees it.
    pub hold: Duration,
}

impl Default for RdevBackend {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(40),
        }
    }
}

#[async_trait]
impl InputBackend for RdevBackend {
    async fn tap(&self, key: &str) -> Result<(), EmulatorError> {
        let key = lookup_key(key).ok_or_else(|| EmulatorError::UnboundKey(key.to_string()))?;
        simulate(&EventType::KeyPress(key))
            .map_err(|_| EmulatorError::Input(format!("key press failed: {key:?}")))?;
        tokio::time::sleep(self.hold).await;
        simulate(&EventType::KeyRelease(key))
            .map_err(|_| EmulatorError::Input(format!("key release failed: {key:?}")))?;
        Ok(())
    }
}

/// Translate a retroarch.cfg key name into an `rdev` key.
fn lookup_key(name: &str) -> Option<Key> {
    let name = name.to_lowercase();
    let key = match name.as_str() {
        "enter" | "return" => Key::Return,
        "space" => Key::Space,
        "escape" | "esc" => Key::Escape,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "shift" | "lshift" => Key::ShiftLeft,
        "rshift" => Key::ShiftRight,
        "ctrl" | "lctrl" => Key::ControlLeft,
        "rctrl" => Key::ControlRight,
        "alt" | "lalt" => Key::Alt,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => {
            let mut chars = name.chars();
            let (first, rest) = (chars.next()?, chars.next());
            if rest.is_some() {
                return None;
            }
            match first {
                'a' => Key::KeyA,
                'b' => Key::KeyB,
                'c' => Key::KeyC,
                'd' => Key::KeyD,
                'e' => Key::KeyE,
                'f' => Key::KeyF,
                'g' => Key::KeyG,
                'h' => Key::KeyH,
                'i' => Key::KeyI,
                'j' => Key::KeyJ,
                'k' => Key::KeyK,
                'l' => Key::KeyL,
                'm' => Key::KeyM,
                'n' => Key::KeyN,
                'o' => Key::KeyO,
                'p' => Key::KeyP,
                'q' => Key::KeyQ,
                'r' => Key::KeyR,
                's' => Key::KeyS,
                't' => Key::KeyT,
                'u' => Key::KeyU,
                'v' => Key::KeyV,
                'w' => Key::KeyW,
                'x' => Key::KeyX,
                'y' => Key::KeyY,
                'z' => Key::KeyZ,
                '0' => Key::Num0,
                '1' => Key::Num1,
                '2' => Key::Num2,
                '3' => Key::Num3,
                '4' => Key::Num4,
                '5' => Key::Num5,
                '6' => Key::Num6,
                '7' => Key::Num7,
                '8' => Key::Num8,
                '9' => Key::Num9,
                _ => return None,
            }
        }
    };
    Some(key)
}

/// Button- and hotkey-level controller over an input backend.
pub struct EmulatorController {
    backend: Box<dyn InputBackend>,
    player: PlayerBindings,
    hotkeys: HotkeyBindings,
    timing: Timing,
}

impl EmulatorController {
    pub fn new(
        backend: Box<dyn InputBackend>,
        player: PlayerBindings,
        hotkeys: HotkeyBindings,
        timing: Timing,
    ) -> Self {
        Self {
            backend,
            player,
            hotkeys,
            timing,
        }
    }

    fn key_for(&self, button: GameButton) -> &str {
        match button {
            GameButton::A => &self.player.a,
            GameButton::B => &self.player.b,
            GameButton::Start => &self.player.start,
            GameButton::Select => &self.player.select,
            GameButton::Up => &self.player.up,
            GameButton::Down => &self.player.down,
            GameButton::Left => &self.player.left,
            GameButton::Right => &self.player.right,
        }
    }

    fn key_for_hotkey(&self, hotkey: Hotkey) -> &str {
        match hotkey {
            Hotkey::FastForward => &self.hotkeys.fast_forward,
            Hotkey::Pause => &self.hotkeys.pause,
            Hotkey::Reset => &self.hotkeys.reset,
            Hotkey::Screenshot => &self.hotkeys.screenshot,
        }
    }

    /// Press a game button `presses` times, delaying after each press.
    pub async fn press(
        &self,
        button: GameButton,
        presses: u32,
        delay_after: Option<f64>,
    ) -> Result<(), EmulatorError> {
        let key = self.key_for(button).to_string();
        for _ in 0..presses {
            self.backend.tap(&key).await?;
            if let Some(seconds) = delay_after {
                self.timing.settle(seconds).await;
            }
        }
        debug!(?button, presses, "pressed button");
        Ok(())
    }

    pub async fn hotkey(&self, hotkey: Hotkey, delay_after: Option<f64>) -> Result<(), EmulatorError> {
        let key = self.key_for_hotkey(hotkey).to_string();
        self.backend.tap(&key).await?;
        if let Some(seconds) = delay_after {
            self.timing.settle(seconds).await;
        }
        debug!(?hotkey, "pressed hotkey");
        Ok(())
    }

    /// Tap a raw key by name; used for the emulator's own frontend menu,
    /// which listens to the keyboard directly rather than player binds.
    pub async fn press_raw(
        &self,
        key: &str,
        presses: u32,
        delay_after: Option<f64>,
    ) -> Result<(), EmulatorError> {
        for _ in 0..presses {
            self.backend.tap(key).await?;
            if let Some(seconds) = delay_after {
                self.timing.settle(seconds).await;
            }
        }
        debug!(key, presses, "pressed raw key");
        Ok(())
    }
}
