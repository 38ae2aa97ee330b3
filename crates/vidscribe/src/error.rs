use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidscribeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Audio extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Row {0} is already pending or active")]
    DuplicateRow(u32),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("Extraction produced no output at '{0}'")]
    MissingOutput(PathBuf),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to initialize speech engine: {0}")]
    Init(String),

    #[error("Failed to read audio file '{path}': {reason}")]
    AudioRead { path: PathBuf, reason: String },

    #[error("Failed to process audio: {0}")]
    Processing(String),

    #[error("Transcription aborted")]
    Aborted,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VidscribeError>;
