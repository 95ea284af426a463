pub mod config;
pub mod emulator;
pub mod error;
pub mod hunt;
pub mod notify;
pub mod species;
pub mod vision;

pub use config::Settings;
pub use error::{BotError, EmulatorError, SaveError, VisionError};
pub use hunt::{HuntOutcome, HuntReport, HuntRunner, SaveStateManager, StaticEncounter};
pub use species::{Dex, Species};
