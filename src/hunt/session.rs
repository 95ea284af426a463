//! Mutable state for one hunt.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Owned exclusively by the hunt runner for the duration of one hunt.
#[derive(Debug, Clone)]
pub struct EncounterSession {
    pub id: Uuid,
    pub budget: u32,
    pub attempts: u32,
    pub shiny_found: bool,
    pub started_at: DateTime<Utc>,
}

impl EncounterSession {
    pub fn new(budget: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget: budget.max(1),
            attempts: 0,
            shiny_found: false,
            started_at: Utc::now(),
        }
    }

    /// Loop invariant of the hunt: keep going while attempts remain and no
    /// shiny has been seen.
    pub fn should_continue(&self) -> bool {
        self.attempts < self.budget && !self.shiny_found
    }

    /// Every attempt increments the counter exactly once, whatever its
    /// classification outcome.
    pub fn record_attempt(&mut self, shiny: bool) {
        self.attempts += 1;
        if shiny {
            self.shiny_found = true;
        }
    }

    /// Attempt interval for advisory progress reports (about every 5%).
    /// None for budgets too small to be worth reporting.
    pub fn progress_interval(&self) -> Option<u32> {
        if self.budget >= 20 {
            Some(self.budget / 20)
        } else {
            None
        }
    }
}

/// What the hunt hands to the notification layer.
#[derive(Debug, Clone)]
pub struct HuntReport {
    pub shiny_found: bool,
    pub attempts: u32,
    pub attachments: Vec<PathBuf>,
}
