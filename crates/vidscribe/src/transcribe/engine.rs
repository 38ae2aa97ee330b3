//! Speech engine seam.
//!
//! The engine is an opaque synchronous call with three injected capability
//! hooks: a progress reporter, a partial-result sink, and a cancellation
//! predicate. The engine polls the predicate at its own cadence; when it
//! returns true the engine stops its internal loop and the call resolves to
//! [`EngineError::Aborted`].

use crate::config::EngineParams;
use crate::error::EngineError;

/// A decoded segment with engine-native centisecond boundaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    pub start_cs: i64,
    pub end_cs: i64,
    pub text: String,
    pub tokens: Vec<TokenData>,
}

/// Per-token detail, present when token timestamps were requested.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    pub id: i32,
    pub text: String,
    pub p: f32,
    pub t_dtw: i64,
    /// Token boundaries in centiseconds; -1 when unavailable.
    pub start_cs: i64,
    pub end_cs: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ModelInfo {
    pub kind: String,
    pub multilingual: bool,
    pub vocab: i64,
}

/// Everything a completed engine run produces.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub system_info: String,
    pub model: ModelInfo,
    /// Detected (or forced) language of the result.
    pub language: String,
    pub segments: Vec<Segment>,
}

/// Capability hooks the engine invokes from inside its blocking run.
/// Boxed so implementations that hand callbacks to native code can move
/// each hook independently.
pub struct EngineHooks {
    /// Monotonically non-decreasing percentage, 0-100.
    pub on_progress: Box<dyn FnMut(i32) + Send>,
    /// Invoked once per newly decoded segment.
    pub on_segment: Box<dyn FnMut(&Segment) + Send>,
    /// Polled by the engine; true stops the run.
    pub should_abort: Box<dyn Fn() -> bool + Send + Sync>,
}

impl EngineHooks {
    /// Hooks that ignore progress and segments and never abort.
    pub fn inert() -> Self {
        Self {
            on_progress: Box::new(|_| {}),
            on_segment: Box::new(|_| {}),
            should_abort: Box::new(|| false),
        }
    }
}

pub trait SpeechEngine: Send + Sync {
    fn run(
        &self,
        samples: &[f32],
        params: &EngineParams,
        hooks: &mut EngineHooks,
    ) -> Result<EngineOutput, EngineError>;
}

/// Engine that recognizes nothing: checks the abort predicate, reports full
/// progress, and returns an empty transcript. Default when the `whisper`
/// feature is disabled; also useful for dry runs.
pub struct NullEngine;

impl SpeechEngine for NullEngine {
    fn run(
        &self,
        _samples: &[f32],
        params: &EngineParams,
        hooks: &mut EngineHooks,
    ) -> Result<EngineOutput, EngineError> {
        if (hooks.should_abort)() {
            return Err(EngineError::Aborted);
        }
        (hooks.on_progress)(100);
        Ok(EngineOutput {
            system_info: "null engine".to_string(),
            model: ModelInfo {
                kind: "null".to_string(),
                multilingual: false,
                vocab: 0,
            },
            language: params.language.clone(),
            segments: Vec::new(),
        })
    }
}
