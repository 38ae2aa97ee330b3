pub mod audio;
pub mod engine;
pub mod extract;
pub mod progress;
pub mod report;
pub mod runner;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use engine::{EngineHooks, EngineOutput, ModelInfo, NullEngine, Segment, SpeechEngine, TokenData};
pub use extract::AudioExtractor;
pub use progress::{EventSink, NoopSink, WorkerEvent};
pub use report::ReportWriter;
pub use runner::Transcriber;
#[cfg(feature = "whisper")]
pub use whisper::WhisperEngine;
