pub mod config;
pub mod error;
pub mod queue;
pub mod transcribe;

pub use config::{load_config, load_config_from_str, Config, EngineParams};
pub use error::{
    ConfigError, EngineError, ExtractError, QueueError, ReportError, Result, VidscribeError,
};
pub use queue::{AbortFlag, JobOutcome, JobPhase, JobRequest, ProgressBook, QueueEvent, QueueManager};
pub use transcribe::{NullEngine, SpeechEngine, Transcriber};
#[cfg(feature = "whisper")]
pub use transcribe::WhisperEngine;
