use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the ffmpeg binary used for audio track extraction.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// Path to the GGML model file loaded by the speech engine.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Minimum advance (in percentage points) between relayed progress events.
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,
    /// Emit per-token detail in the transcript report.
    #[serde(default)]
    pub full_token_output: bool,
    #[serde(default)]
    pub engine: EngineParams,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/ggml-base.en.bin")
}

fn default_progress_step() -> u8 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            model_path: default_model_path(),
            progress_step: default_progress_step(),
            full_token_output: false,
            engine: EngineParams::default(),
        }
    }
}

/// Decoding parameters handed to the speech engine for every job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub translate: bool,
    #[serde(default = "default_n_threads")]
    pub n_threads: usize,
    /// Maximum text context tokens kept between decoder windows.
    /// `None` keeps the engine's own default.
    #[serde(default)]
    pub max_text_ctx: Option<i32>,
    #[serde(default)]
    pub offset_ms: i32,
    #[serde(default)]
    pub duration_ms: i32,
    #[serde(default)]
    pub token_timestamps: bool,
    #[serde(default = "default_word_threshold")]
    pub word_threshold: f32,
    /// Maximum characters per segment; 0 disables splitting.
    #[serde(default)]
    pub max_segment_len: i32,
    /// Audio context size override; 0 keeps the engine default.
    #[serde(default)]
    pub audio_ctx: i32,
    #[serde(default)]
    pub tinydiarize: bool,
    #[serde(default)]
    pub initial_prompt: String,
    #[serde(default = "default_best_of")]
    pub best_of: i32,
    #[serde(default = "default_beam_size")]
    pub beam_size: i32,
    #[serde(default = "default_entropy_threshold")]
    pub entropy_threshold: f32,
    #[serde(default = "default_logprob_threshold")]
    pub logprob_threshold: f32,
    #[serde(default)]
    pub use_gpu: bool,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_n_threads() -> usize {
    std::cmp::min(4, num_cpus::get())
}

fn default_word_threshold() -> f32 {
    0.01
}

fn default_best_of() -> i32 {
    5
}

fn default_beam_size() -> i32 {
    5
}

fn default_entropy_threshold() -> f32 {
    2.4
}

fn default_logprob_threshold() -> f32 {
    -1.0
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            language: default_language(),
            translate: false,
            n_threads: default_n_threads(),
            max_text_ctx: None,
            offset_ms: 0,
            duration_ms: 0,
            token_timestamps: false,
            word_threshold: default_word_threshold(),
            max_segment_len: 0,
            audio_ctx: 0,
            tinydiarize: false,
            initial_prompt: String::new(),
            best_of: default_best_of(),
            beam_size: default_beam_size(),
            entropy_threshold: default_entropy_threshold(),
            logprob_threshold: default_logprob_threshold(),
            use_gpu: false,
        }
    }
}
