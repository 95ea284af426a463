//! The encounter state machine and its on-disk collaborators.

pub mod encounter;
pub mod runner;
pub mod saves;
pub mod session;

pub use encounter::{encounter_for, StaticEncounter, STATIC_ENCOUNTERS};
pub use runner::{AttemptOutcome, EncounterDriver, HuntOutcome, HuntRunner, HuntState};
pub use saves::{SaveFilePair, SaveStateManager};
pub use session::{EncounterSession, HuntReport};
