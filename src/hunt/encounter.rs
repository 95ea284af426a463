//! Driving one static encounter attempt through the emulator.

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, info, warn};

use super::runner::{AttemptOutcome, EncounterDriver};
use crate::emulator::{Emulator, GameButton, Timing};
use crate::error::{BotError, EmulatorError};
use crate::species::Species;
use crate::vision::region::{
    crop_battle_sprite, BATTLE_NAME_SLOTS, CAPTURE_NAME_SLOTS,
};
use crate::vision::sprite::is_captured;
use crate::vision::{
    BattleDetector, NameRecognizer, ScreenshotStore, SpriteClassifier, SpriteKind,
};

/// Calibration row for one species' static encounter: the dialogue-skip
/// button sequence and how long the battle intro takes to settle before a
/// screenshot is readable.
#[derive(Debug, Clone, Copy)]
pub struct EncounterSpec {
    pub species: &'static str,
    pub sequence: &'static str,
    pub settle_delay: f64,
}

pub const STATIC_ENCOUNTERS: &[EncounterSpec] = &[
    EncounterSpec { species: "ELECTRODE", sequence: "a",              settle_delay: 1.5 },
    EncounterSpec { species: "GYARADOS",  sequence: "a",              settle_delay: 2.0 },
    EncounterSpec { species: "LAPRAS",    sequence: "a",              settle_delay: 2.0 },
    EncounterSpec { species: "SNORLAX",   sequence: "sdddarrrbbaaaa", settle_delay: 1.5 },
    EncounterSpec { species: "SUDOWOODO", sequence: "aaaaaa",         settle_delay: 1.5 },
    EncounterSpec { species: "SUICUNE",   sequence: "u",              settle_delay: 3.75 },
    EncounterSpec { species: "HO-OH",     sequence: "a",              settle_delay: 2.0 },
    EncounterSpec { species: "CELEBI",    sequence: "a",              settle_delay: 2.0 },
    EncounterSpec { species: "LUGIA",     sequence: "a",              settle_delay: 2.0 },
    EncounterSpec { species: "ODD EGG",   sequence: "aaaaa",          settle_delay: 2.0 },
];

pub fn encounter_for(species_name: &str) -> Option<&'static EncounterSpec> {
    STATIC_ENCOUNTERS
        .iter()
        .find(|e| e.species.eq_ignore_ascii_case(species_name))
}

/// Perform a shorthand button sequence, half a second between presses.
pub async fn perform_button_sequence(
    emulator: &Emulator,
    sequence: &str,
) -> Result<(), EmulatorError> {
    for c in sequence.chars() {
        let button = GameButton::from_sequence_char(c)?;
        emulator.press(button, 1, Some(0.5)).await?;
    }
    Ok(())
}

/// Everything needed to run encounter attempts for one species.
pub struct StaticEncounter {
    emulator: Emulator,
    species: Species,
    spec: &'static EncounterSpec,
    sprites: SpriteClassifier,
    recognizer: NameRecognizer,
    battles: Option<BattleDetector>,
    screenshots: ScreenshotStore,
    timing: Timing,
}

impl StaticEncounter {
    pub fn new(
        emulator: Emulator,
        species: Species,
        sprites: SpriteClassifier,
        recognizer: NameRecognizer,
        battles: Option<BattleDetector>,
        screenshots: ScreenshotStore,
        timing: Timing,
    ) -> Result<Self, BotError> {
        let spec = encounter_for(&species.name)
            .ok_or_else(|| BotError::UnknownEncounter(species.name.clone()))?;
        // Fail on a malformed sequence now, not mid-hunt.
        for c in spec.sequence.chars() {
            GameButton::from_sequence_char(c)?;
        }
        Ok(Self {
            emulator,
            species,
            spec,
            sprites,
            recognizer,
            battles,
            screenshots,
            timing,
        })
    }

    pub fn species(&self) -> &Species {
        &self.species
    }

    async fn latest_screen(&self) -> Result<(crate::vision::Screenshot, RgbImage), BotError> {
        self.emulator.take_screenshot(Some(0.25)).await?;
        let shot = self.screenshots.latest()?;
        let screen = shot.load()?;
        Ok((shot, screen))
    }

    /// Both on-screen names from an after-throw frame: the opponent's name
    /// strip and the lower capture-dialog strip match only while the ball
    /// holds.
    fn capture_succeeded(&self, screen: &RgbImage) -> Result<bool, BotError> {
        let before = self.recognizer.recognize_name(screen, &BATTLE_NAME_SLOTS)?;
        let after = self.recognizer.recognize_name(screen, &CAPTURE_NAME_SLOTS)?;
        debug!(%before, %after, "capture name check");
        Ok(is_captured(&before, &after))
    }

    /// Select and use the ball at `row` in the balls pocket.
    async fn throw_ball(&mut self, row: usize) -> Result<(), EmulatorError> {
        if row > 0 {
            self.emulator
                .press_precise(GameButton::Down, row as u32, Some(0.25))
                .await?;
        }
        self.emulator.press(GameButton::A, 2, Some(0.5)).await
    }
}

#[async_trait]
impl EncounterDriver for StaticEncounter {
    /// Start the game from the frontend menu. Runs once per hunt.
    async fn prepare(&mut self) -> Result<(), BotError> {
        self.emulator.navigate_to_game().await?;
        Ok(())
    }

    async fn reset_game(&mut self) -> Result<(), BotError> {
        self.emulator.reset(None).await?;
        debug!("game reset for next attempt");
        Ok(())
    }

    async fn advance_dialogue(&mut self) -> Result<(), BotError> {
        self.emulator.continue_game().await?;
        Ok(())
    }

    async fn await_battle(&mut self) -> Result<(), BotError> {
        debug!(species = %self.species.name, "encountering static");
        perform_button_sequence(&self.emulator, self.spec.sequence).await?;
        self.timing.settle(self.spec.settle_delay).await;
        debug!(species = %self.species.name, "wild encounter should be on screen");
        Ok(())
    }

    async fn classify(&mut self) -> Result<AttemptOutcome, BotError> {
        let (shot, screen) = self.latest_screen().await?;
        if let Some(detector) = &self.battles {
            if !detector.is_in_battle(&screen) {
                warn!("no battle detected on screen, the settle delay may be miscalibrated");
            }
        }
        let crop = crop_battle_sprite(&screen);
        match self.sprites.classify(&crop)? {
            SpriteKind::Normal => {
                // Non-shiny frames are of no further use.
                shot.delete();
                Ok(AttemptOutcome::Normal)
            }
            SpriteKind::Shiny => Ok(AttemptOutcome::Shiny(shot.path)),
        }
    }

    async fn attempt_capture(&mut self, throw_index: u32) -> Result<bool, BotError> {
        if throw_index == 0 {
            // Open the balls pocket and pick the best ball in stock.
            self.emulator.press(GameButton::B, 1, Some(1.0)).await?;
            self.emulator.press(GameButton::Down, 1, Some(0.5)).await?;
            self.emulator.press(GameButton::A, 1, Some(0.5)).await?;
            self.emulator
                .press_precise(GameButton::Right, 1, Some(0.5))
                .await?;

            let (_, pocket) = self.latest_screen().await?;
            let items = crate::vision::pack::read_pack_items(&pocket, &self.recognizer, true)?;
            let Some((ball, row)) = crate::vision::pack::best_ball(&items) else {
                warn!("no balls in stock, leaving the battle to the operator");
                return Ok(false);
            };
            info!(?ball, "throwing");
            self.throw_ball(row).await?;
        } else {
            // Dismiss the break-out text and use the same ball again.
            self.emulator.press(GameButton::B, 8, Some(0.25)).await?;
            self.emulator.press(GameButton::A, 2, Some(0.5)).await?;
        }

        self.timing.settle(1.5).await;
        let (_, screen) = self.latest_screen().await?;
        self.capture_succeeded(&screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_is_case_insensitive() {
        let suicune = encounter_for("Suicune").unwrap();
        assert_eq!(suicune.sequence, "u");
        assert_eq!(suicune.settle_delay, 3.75);
        assert!(encounter_for("MEWTWO").is_none());
    }

    #[test]
    fn every_table_sequence_is_well_formed() {
        for spec in STATIC_ENCOUNTERS {
            for c in spec.sequence.chars() {
                GameButton::from_sequence_char(c).unwrap();
            }
        }
    }
}
