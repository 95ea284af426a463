//! High-level emulator facade and its toggle-state tracking.

pub mod controller;
pub mod retroarch;

use std::time::Duration;

use tracing::debug;

use crate::error::EmulatorError;
pub use controller::{EmulatorController, GameButton, Hotkey, InputBackend, RdevBackend};
pub use retroarch::{RetroArchConfig, RetroArchProcess};

/// All delays were calibrated against a core running at this speed; actual
/// delays scale by `basis / avg_fps`.
pub const DELAY_BASIS_FPS: f64 = 300.0;

/// Wall-clock delay scaling for the emulation speed in use.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    avg_fps: f64,
}

impl Timing {
    pub fn new(avg_fps: f64) -> Self {
        Self {
            avg_fps: avg_fps.max(1.0),
        }
    }

    pub fn scale(&self, seconds: f64) -> Duration {
        Duration::from_secs_f64(seconds * DELAY_BASIS_FPS / self.avg_fps)
    }

    /// Sleep long enough for the emulator to render through `seconds` of
    /// calibrated time.
    pub async fn settle(&self, seconds: f64) {
        let duration = self.scale(seconds);
        debug!(?duration, "settle");
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    On,
    #[default]
    Off,
}

impl ToggleState {
    pub fn is_on(self) -> bool {
        self == ToggleState::On
    }

    pub fn is_off(self) -> bool {
        self == ToggleState::Off
    }
}

/// Frontend toggles the bot has flipped. RetroArch gives no feedback, so
/// this is the bot's own bookkeeping and the reason every toggle goes
/// through the facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmulatorState {
    fast_fwd: ToggleState,
    pause: ToggleState,
}

impl EmulatorState {
    pub fn fast_fwd(&self) -> ToggleState {
        self.fast_fwd
    }

    pub fn pause(&self) -> ToggleState {
        self.pause
    }
}

/// Take actions inside the emulator.
pub struct Emulator {
    controller: EmulatorController,
    state: EmulatorState,
    timing: Timing,
}

impl Emulator {
    pub fn new(controller: EmulatorController, timing: Timing) -> Self {
        Self {
            controller,
            state: EmulatorState::default(),
            timing,
        }
    }

    pub fn state(&self) -> &EmulatorState {
        &self.state
    }

    /// Uniform interactive action: press a button `presses` times with an
    /// optional delay after each press.
    pub async fn press(
        &self,
        button: GameButton,
        presses: u32,
        delay_after: Option<f64>,
    ) -> Result<(), EmulatorError> {
        self.controller.press(button, presses, delay_after).await
    }

    /// Press with a guaranteed exact press count: fast-forward is
    /// suspended for the duration and restored afterwards.
    pub async fn press_precise(
        &mut self,
        button: GameButton,
        presses: u32,
        delay_after: Option<f64>,
    ) -> Result<(), EmulatorError> {
        let resume = self.suspend_fast_fwd().await?;
        self.press(button, presses, delay_after).await?;
        self.restore_fast_fwd(resume).await
    }

    async fn suspend_fast_fwd(&mut self) -> Result<ToggleState, EmulatorError> {
        let original = self.state.fast_fwd;
        self.fast_fwd_off().await?;
        self.timing.settle(0.5).await;
        Ok(original)
    }

    async fn restore_fast_fwd(&mut self, original: ToggleState) -> Result<(), EmulatorError> {
        if original.is_on() {
            self.fast_fwd_on().await?;
        }
        Ok(())
    }

    /// Navigate the frontend menu to the loaded game entry and start it.
    /// Assumes the default ozone menu driver layout.
    pub async fn navigate_to_game(&self) -> Result<(), EmulatorError> {
        debug!("navigating to game");
        self.controller.press_raw("left", 1, Some(0.1)).await?;
        self.controller.press_raw("down", 2, Some(0.1)).await?;
        self.controller.press_raw("right", 1, Some(0.1)).await?;
        self.controller.press_raw("enter", 1, Some(0.25)).await?;
        self.controller.press_raw("enter", 1, None).await
    }

    /// Continue the game from its last save: dismiss the title screens and
    /// accept the continue menu.
    pub async fn continue_game(&mut self) -> Result<(), EmulatorError> {
        debug!("continue game");
        self.timing.settle(1.0).await;
        self.fast_fwd_on().await?;
        self.timing.settle(1.0).await;
        self.press(GameButton::B, 1, Some(0.5)).await?;
        self.press(GameButton::A, 1, Some(0.25)).await?;
        self.press(GameButton::A, 2, Some(0.5)).await
    }

    pub async fn reset(&self, delay_after: Option<f64>) -> Result<(), EmulatorError> {
        self.controller.hotkey(Hotkey::Reset, delay_after).await?;
        debug!("emulator reset");
        Ok(())
    }

    pub async fn take_screenshot(&self, delay_after: Option<f64>) -> Result<(), EmulatorError> {
        self.controller
            .hotkey(Hotkey::Screenshot, delay_after)
            .await?;
        debug!("screenshot taken");
        Ok(())
    }

    pub async fn fast_fwd_on(&mut self) -> Result<(), EmulatorError> {
        if self.state.fast_fwd.is_off() {
            self.controller.hotkey(Hotkey::FastForward, None).await?;
            self.state.fast_fwd = ToggleState::On;
        }
        debug!("fast forward is ON");
        Ok(())
    }

    pub async fn fast_fwd_off(&mut self) -> Result<(), EmulatorError> {
        if self.state.fast_fwd.is_on() {
            self.controller.hotkey(Hotkey::FastForward, None).await?;
            self.state.fast_fwd = ToggleState::Off;
        }
        debug!("fast forward is OFF");
        Ok(())
    }

    pub async fn pause_on(&mut self) -> Result<(), EmulatorError> {
        if self.state.pause.is_off() {
            self.controller.hotkey(Hotkey::Pause, None).await?;
            self.state.pause = ToggleState::On;
        }
        debug!("pause is ON");
        Ok(())
    }

    pub async fn pause_off(&mut self) -> Result<(), EmulatorError> {
        if self.state.pause.is_on() {
            self.controller.hotkey(Hotkey::Pause, None).await?;
            self.state.pause = ToggleState::Off;
        }
        debug!("pause is OFF");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::controller::{EmulatorController, InputBackend};
    use super::retroarch::{HotkeyBindings, PlayerBindings};
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct RecordingBackend(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl InputBackend for RecordingBackend {
        async fn tap(&self, key: &str) -> Result<(), EmulatorError> {
            self.0.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    fn emulator(log: Arc<Mutex<Vec<String>>>) -> Emulator {
        let timing = Timing::new(300_000.0);
        let controller = EmulatorController::new(
            Box::new(RecordingBackend(log)),
            PlayerBindings {
                a: "x".to_string(),
                b: "z".to_string(),
                start: "enter".to_string(),
                select: "rshift".to_string(),
                up: "up".to_string(),
                down: "down".to_string(),
                left: "left".to_string(),
                right: "right".to_string(),
            },
            HotkeyBindings {
                fast_forward: "space".to_string(),
                pause: "p".to_string(),
                reset: "h".to_string(),
                screenshot: "f8".to_string(),
            },
            timing,
        );
        Emulator::new(controller, timing)
    }

    #[test]
    fn timing_scales_against_the_calibration_basis() {
        let timing = Timing::new(150.0);
        assert_eq!(timing.scale(1.0), Duration::from_secs_f64(2.0));
        let timing = Timing::new(600.0);
        assert_eq!(timing.scale(1.0), Duration::from_secs_f64(0.5));
    }

    #[tokio::test]
    async fn toggles_only_tap_on_state_change() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut emulator = emulator(log.clone());
        emulator.fast_fwd_on().await.unwrap();
        emulator.fast_fwd_on().await.unwrap();
        emulator.fast_fwd_off().await.unwrap();
        emulator.pause_on().await.unwrap();
        emulator.pause_off().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["space", "space", "p", "p"]);
    }

    #[tokio::test]
    async fn precise_press_suspends_and_restores_fast_forward() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut emulator = emulator(log.clone());
        emulator.fast_fwd_on().await.unwrap();
        emulator
            .press_precise(GameButton::Down, 2, None)
            .await
            .unwrap();
        assert!(emulator.state().fast_fwd().is_on());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["space", "space", "down", "down", "space"]
        );
    }

    #[tokio::test]
    async fn precise_press_leaves_fast_forward_off_when_it_was_off() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut emulator = emulator(log.clone());
        emulator
            .press_precise(GameButton::A, 1, None)
            .await
            .unwrap();
        assert!(emulator.state().fast_fwd().is_off());
        assert_eq!(*log.lock().unwrap(), vec!["x"]);
    }
}
