use std::path::PathBuf;

use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Vision Error: {0}")]
    Vision(#[from] VisionError),
    #[error("Emulator Error: {0}")]
    Emulator(#[from] EmulatorError),
    #[error("Save Error: {0}")]
    Save(#[from] SaveError),
    #[error("Config Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to read dex table {0}: {1}")]
    DexRead(PathBuf, std::io::Error),
    #[error("Failed to parse dex table {0}: {1}")]
    DexParse(PathBuf, serde_json::Error),
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),
    #[error("No static encounter calibrated for species: {0}")]
    UnknownEncounter(String),
}

// Perception pipeline error type
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("No screenshots exist in {0}")]
    NoScreenshot(PathBuf),
    #[error("Crop region resolved to zero pixels")]
    EmptyCrop,
    #[error("Every pixel was filtered out as background")]
    AllBackground,
    #[error("Template library {0} contains no reference images")]
    EmptyLibrary(PathBuf),
    #[error("No digits recognized in number region")]
    EmptyNumber,
    #[error("Recognized digits do not form a number: {0:?}")]
    BadNumber(String),
    #[error("Failed to load image {0}: {1}")]
    Image(PathBuf, image::ImageError),
    #[error("Failed to read {0}: {1}")]
    Io(PathBuf, std::io::Error),
}

#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Failed to launch emulator {0}: {1}")]
    Launch(String, std::io::Error),
    #[error("Failed to kill emulator process: {0}")]
    Kill(std::io::Error),
    #[error("Failed to read retroarch config {0}: {1}")]
    ConfigRead(PathBuf, std::io::Error),
    #[error("Missing retroarch config entry: {0}")]
    MissingConfigKey(String),
    #[error("No key bound for {0}")]
    UnboundKey(String),
    #[error("Unknown character in button sequence: {0:?}")]
    UnknownSequenceChar(char),
    #[error("Input backend failure: {0}")]
    Input(String),
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Missing calibration save: {0}")]
    MissingCalibration(PathBuf),
    #[error("Failed to set aside original save {0}: {1}")]
    SetAside(PathBuf, std::io::Error),
    #[error("Failed to stage calibration save {0}: {1}")]
    Stage(PathBuf, std::io::Error),
    #[error("Failed to restore original save {0}: {1}")]
    Restore(PathBuf, std::io::Error),
}
