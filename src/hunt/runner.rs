//! The bounded-retry encounter state machine.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::session::{EncounterSession, HuntReport};
use crate::error::BotError;

/// States of one hunt. An attempt walks Resetting through Classifying;
/// classification lands in one of the three decision states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntState {
    Idle,
    Resetting,
    AdvancingDialogue,
    AwaitingBattle,
    Classifying,
    ShinyFound,
    Retry,
    BudgetExhausted,
}

/// Classification result of one attempt. Failed covers recognition
/// ambiguity and missing screenshots: counted, never retried in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Normal,
    Shiny(PathBuf),
    Failed,
}

/// The four phases of an attempt plus the post-shiny capture sequence.
/// The production driver presses real buttons; tests substitute fakes.
#[async_trait]
pub trait EncounterDriver: Send {
    /// One-time setup before the first attempt (e.g. starting the game
    /// from the emulator's own menu). No-op by default.
    async fn prepare(&mut self) -> Result<(), BotError> {
        Ok(())
    }

    async fn reset_game(&mut self) -> Result<(), BotError>;
    async fn advance_dialogue(&mut self) -> Result<(), BotError>;
    async fn await_battle(&mut self) -> Result<(), BotError>;
    async fn classify(&mut self) -> Result<AttemptOutcome, BotError>;
    /// One ball throw (0 opens the pocket first); true when the capture held.
    async fn attempt_capture(&mut self, throw_index: u32) -> Result<bool, BotError>;
}

/// How the hunt ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntOutcome {
    ShinyFound,
    BudgetExhausted,
    Cancelled,
}

/// Retry throws after the first ball, before control goes back to the
/// operator.
const CAPTURE_RETRY_THROWS: u32 = 3;

pub struct HuntRunner<D: EncounterDriver> {
    driver: D,
    session: EncounterSession,
    state: HuntState,
    cancel: CancellationToken,
}

impl<D: EncounterDriver> HuntRunner<D> {
    pub fn new(driver: D, budget: u32, cancel: CancellationToken) -> Self {
        Self {
            driver,
            session: EncounterSession::new(budget),
            state: HuntState::Idle,
            cancel,
        }
    }

    pub fn session(&self) -> &EncounterSession {
        &self.session
    }

    pub fn state(&self) -> HuntState {
        self.state
    }

    /// Run attempts until a shiny appears, the budget runs out, or the
    /// hunt is cancelled. Each attempt increments the session counter
    /// exactly once, whatever its outcome.
    pub async fn run(&mut self) -> Result<(HuntOutcome, HuntReport), BotError> {
        info!(
            session = %self.session.id,
            budget = self.session.budget,
            started_at = %self.session.started_at,
            "hunt starting"
        );
        self.driver.prepare().await?;
        let mut attachments: Vec<PathBuf> = Vec::new();

        while self.session.should_continue() {
            if self.cancel.is_cancelled() {
                info!("hunt cancelled");
                return Ok((HuntOutcome::Cancelled, self.report(Vec::new())));
            }

            self.state = HuntState::Resetting;
            self.driver.reset_game().await?;
            self.state = HuntState::AdvancingDialogue;
            self.driver.advance_dialogue().await?;
            self.state = HuntState::AwaitingBattle;
            self.driver.await_battle().await?;
            self.state = HuntState::Classifying;

            let outcome = match self.driver.classify().await {
                Ok(outcome) => outcome,
                // An unreadable frame is a failed attempt, not a dead hunt.
                Err(BotError::Vision(e)) => {
                    warn!("classification failed: {e}");
                    AttemptOutcome::Failed
                }
                Err(e) => return Err(e),
            };

            match outcome {
                AttemptOutcome::Shiny(screenshot) => {
                    self.session.record_attempt(true);
                    self.state = HuntState::ShinyFound;
                    info!(attempts = self.session.attempts, "shiny found!");
                    attachments.push(screenshot);
                }
                AttemptOutcome::Normal | AttemptOutcome::Failed => {
                    self.session.record_attempt(false);
                    self.state = HuntState::Retry;
                }
            }

            if let Some(interval) = self.session.progress_interval() {
                if self.session.attempts % interval == 0 {
                    info!(
                        "attempt number {}/{}",
                        self.session.attempts, self.session.budget
                    );
                }
            }
        }

        if self.session.shiny_found {
            self.capture().await?;
            return Ok((HuntOutcome::ShinyFound, self.report(attachments)));
        }

        self.state = HuntState::BudgetExhausted;
        info!(attempts = self.session.attempts, "budget exhausted, no shiny");
        Ok((HuntOutcome::BudgetExhausted, self.report(Vec::new())))
    }

    /// Bounded capture: the first throw plus a few retries, then the
    /// operator takes over with the battle still on screen.
    async fn capture(&mut self) -> Result<(), BotError> {
        for throw in 0..=CAPTURE_RETRY_THROWS {
            match self.driver.attempt_capture(throw).await {
                Ok(true) => {
                    info!("capture succeeded");
                    return Ok(());
                }
                Ok(false) => warn!(throw, "it broke out of the ball"),
                Err(BotError::Vision(e)) => warn!(throw, "capture check unreadable: {e}"),
                Err(e) => return Err(e),
            }
        }
        warn!("capture retries exhausted, handing over to the operator");
        Ok(())
    }

    fn report(&self, attachments: Vec<PathBuf>) -> HuntReport {
        HuntReport {
            shiny_found: self.session.shiny_found,
            attempts: self.session.attempts,
            attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;

    /// Scripted driver: a queue of per-attempt outcomes.
    struct FakeDriver {
        outcomes: Vec<Result<AttemptOutcome, BotError>>,
        phase_calls: (u32, u32, u32),
        capture_results: Vec<bool>,
        captures_tried: u32,
    }

    impl FakeDriver {
        fn new(outcomes: Vec<Result<AttemptOutcome, BotError>>) -> Self {
            Self {
                outcomes,
                phase_calls: (0, 0, 0),
                capture_results: vec![true],
                captures_tried: 0,
            }
        }
    }

    #[async_trait]
    impl EncounterDriver for FakeDriver {
        async fn reset_game(&mut self) -> Result<(), BotError> {
            self.phase_calls.0 += 1;
            Ok(())
        }

        async fn advance_dialogue(&mut self) -> Result<(), BotError> {
            self.phase_calls.1 += 1;
            Ok(())
        }

        async fn await_battle(&mut self) -> Result<(), BotError> {
            self.phase_calls.2 += 1;
            Ok(())
        }

        async fn classify(&mut self) -> Result<AttemptOutcome, BotError> {
            self.outcomes.remove(0)
        }

        async fn attempt_capture(&mut self, throw_index: u32) -> Result<bool, BotError> {
            let result = self
                .capture_results
                .get(throw_index as usize)
                .copied()
                .unwrap_or(false);
            self.captures_tried += 1;
            Ok(result)
        }
    }

    fn normal() -> Result<AttemptOutcome, BotError> {
        Ok(AttemptOutcome::Normal)
    }

    fn shiny() -> Result<AttemptOutcome, BotError> {
        Ok(AttemptOutcome::Shiny(PathBuf::from("shiny.png")))
    }

    #[tokio::test]
    async fn budget_of_three_runs_exactly_three_attempts() {
        let driver = FakeDriver::new(vec![normal(), normal(), normal()]);
        let mut runner = HuntRunner::new(driver, 3, CancellationToken::new());
        let (outcome, report) = runner.run().await.unwrap();
        assert_eq!(outcome, HuntOutcome::BudgetExhausted);
        assert_eq!(runner.state(), HuntState::BudgetExhausted);
        assert_eq!(runner.session().attempts, 3);
        assert!(!report.shiny_found);
        assert!(report.attachments.is_empty());
        assert_eq!(runner.driver.phase_calls, (3, 3, 3));
    }

    #[tokio::test]
    async fn shiny_on_attempt_two_stops_a_budget_five_hunt() {
        let driver = FakeDriver::new(vec![normal(), shiny()]);
        let mut runner = HuntRunner::new(driver, 5, CancellationToken::new());
        let (outcome, report) = runner.run().await.unwrap();
        assert_eq!(outcome, HuntOutcome::ShinyFound);
        assert_eq!(runner.session().attempts, 2);
        assert!(report.shiny_found);
        assert_eq!(report.attachments, vec![PathBuf::from("shiny.png")]);
    }

    #[tokio::test]
    async fn recognition_failure_counts_as_a_failed_attempt() {
        let driver = FakeDriver::new(vec![
            Err(BotError::Vision(VisionError::EmptyNumber)),
            normal(),
        ]);
        let mut runner = HuntRunner::new(driver, 2, CancellationToken::new());
        let (outcome, _) = runner.run().await.unwrap();
        assert_eq!(outcome, HuntOutcome::BudgetExhausted);
        assert_eq!(runner.session().attempts, 2);
    }

    #[tokio::test]
    async fn capture_retries_are_bounded() {
        let mut driver = FakeDriver::new(vec![shiny()]);
        driver.capture_results = vec![false, false, false, false, false];
        let mut runner = HuntRunner::new(driver, 5, CancellationToken::new());
        let (outcome, _) = runner.run().await.unwrap();
        assert_eq!(outcome, HuntOutcome::ShinyFound);
        assert_eq!(runner.driver.captures_tried, CAPTURE_RETRY_THROWS + 1);
    }

    #[tokio::test]
    async fn cancellation_short_circuits_the_loop() {
        let token = CancellationToken::new();
        token.cancel();
        let driver = FakeDriver::new(vec![normal(), normal(), normal()]);
        let mut runner = HuntRunner::new(driver, 3, token);
        let (outcome, report) = runner.run().await.unwrap();
        assert_eq!(outcome, HuntOutcome::Cancelled);
        assert_eq!(report.attempts, 0);
        assert_eq!(runner.driver.phase_calls, (0, 0, 0));
    }
}
