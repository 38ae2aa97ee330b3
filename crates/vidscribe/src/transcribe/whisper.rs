//! whisper.cpp-backed speech engine, enabled by the `whisper` feature.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use whisper_rs::{
    FullParams, SamplingStrategy, SegmentCallbackData, WhisperContext, WhisperContextParameters,
};

use crate::config::EngineParams;
use crate::error::EngineError;
use crate::transcribe::engine::{
    EngineHooks, EngineOutput, ModelInfo, Segment, SpeechEngine, TokenData,
};

pub struct WhisperEngine {
    model_path: PathBuf,
}

impl WhisperEngine {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
        }
    }
}

impl SpeechEngine for WhisperEngine {
    fn run(
        &self,
        samples: &[f32],
        params: &EngineParams,
        hooks: &mut EngineHooks,
    ) -> Result<EngineOutput, EngineError> {
        info!("Loading model from {}", self.model_path.display());

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(params.use_gpu);

        let ctx = WhisperContext::new_with_params(
            &self.model_path.to_string_lossy(),
            ctx_params,
        )
        .map_err(|e| EngineError::Init(e.to_string()))?;

        let mut state = ctx
            .create_state()
            .map_err(|e| EngineError::Init(e.to_string()))?;

        let mut full_params = build_full_params(params);

        // Hand each hook to the native callback layer. The boxes are moved
        // out and replaced with no-ops; the caller does not reuse them after
        // the run.
        let on_progress = std::mem::replace(&mut hooks.on_progress, Box::new(|_| {}));
        full_params.set_progress_callback_safe(on_progress);

        let mut on_segment = std::mem::replace(&mut hooks.on_segment, Box::new(|_| {}));
        full_params.set_segment_callback_safe(move |data: SegmentCallbackData| {
            let segment = Segment {
                start_cs: data.start_timestamp,
                end_cs: data.end_timestamp,
                text: data.text,
                tokens: Vec::new(),
            };
            on_segment(&segment);
        });

        let should_abort =
            std::mem::replace(&mut hooks.should_abort, Box::new(|| false));
        let abort_observed = Arc::new(AtomicBool::new(false));
        let abort_marker = Arc::clone(&abort_observed);
        full_params.set_abort_callback_safe(move || {
            let stop = should_abort();
            if stop {
                abort_marker.store(true, Ordering::Release);
            }
            stop
        });

        debug!("Starting decode of {} samples", samples.len());
        let run_result = state.full(full_params, samples);

        if abort_observed.load(Ordering::Acquire) {
            return Err(EngineError::Aborted);
        }
        run_result.map_err(|e| EngineError::Processing(e.to_string()))?;

        let language = state
            .full_lang_id()
            .ok()
            .and_then(whisper_rs::get_lang_str)
            .unwrap_or(&params.language)
            .to_string();

        let segments = collect_segments(&ctx, &state, params)?;

        Ok(EngineOutput {
            system_info: whisper_rs::print_system_info(),
            model: ModelInfo {
                kind: "whisper".to_string(),
                multilingual: ctx.is_multilingual(),
                vocab: ctx.model_n_vocab() as i64,
            },
            language,
            segments,
        })
    }
}

fn build_full_params(params: &EngineParams) -> FullParams<'_, '_> {
    let strategy = if params.beam_size > 1 {
        SamplingStrategy::BeamSearch {
            beam_size: params.beam_size,
            patience: -1.0,
        }
    } else {
        SamplingStrategy::Greedy {
            best_of: params.best_of,
        }
    };

    let mut full_params = FullParams::new(strategy);
    full_params.set_print_realtime(false);
    full_params.set_print_progress(false);
    full_params.set_print_special(false);
    full_params.set_print_timestamps(false);
    full_params.set_translate(params.translate);
    full_params.set_language(Some(&params.language));
    full_params.set_n_threads(params.n_threads as i32);
    if let Some(max_text_ctx) = params.max_text_ctx {
        full_params.set_n_max_text_ctx(max_text_ctx);
    }
    full_params.set_offset_ms(params.offset_ms);
    full_params.set_duration_ms(params.duration_ms);
    full_params.set_token_timestamps(params.token_timestamps);
    full_params.set_thold_pt(params.word_threshold);
    full_params.set_max_len(params.max_segment_len);
    full_params.set_audio_ctx(params.audio_ctx);
    full_params.set_tdrz_enable(params.tinydiarize);
    if !params.initial_prompt.is_empty() {
        full_params.set_initial_prompt(&params.initial_prompt);
    }
    full_params.set_entropy_thold(params.entropy_threshold);
    full_params.set_logprob_thold(params.logprob_threshold);

    full_params
}

fn collect_segments(
    ctx: &WhisperContext,
    state: &whisper_rs::WhisperState,
    params: &EngineParams,
) -> Result<Vec<Segment>, EngineError> {
    let n_segments = state
        .full_n_segments()
        .map_err(|e| EngineError::Processing(e.to_string()))?;

    let mut segments = Vec::with_capacity(n_segments as usize);
    for i in 0..n_segments {
        let text = state
            .full_get_segment_text(i)
            .map_err(|e| EngineError::Processing(e.to_string()))?;
        let start_cs = state
            .full_get_segment_t0(i)
            .map_err(|e| EngineError::Processing(e.to_string()))?;
        let end_cs = state
            .full_get_segment_t1(i)
            .map_err(|e| EngineError::Processing(e.to_string()))?;

        let tokens = if params.token_timestamps {
            let n_tokens = state
                .full_n_tokens(i)
                .map_err(|e| EngineError::Processing(e.to_string()))?;
            let mut tokens = Vec::with_capacity(n_tokens as usize);
            for j in 0..n_tokens {
                let data = state
                    .full_get_token_data(i, j)
                    .map_err(|e| EngineError::Processing(e.to_string()))?;
                let token_text = ctx
                    .token_to_str(data.id)
                    .map_err(|e| EngineError::Processing(e.to_string()))?;
                tokens.push(TokenData {
                    id: data.id,
                    text: token_text.to_string(),
                    p: data.p,
                    t_dtw: data.t_dtw,
                    start_cs: data.t0,
                    end_cs: data.t1,
                });
            }
            tokens
        } else {
            Vec::new()
        };

        segments.push(Segment {
            start_cs,
            end_cs,
            text,
            tokens,
        });
    }

    Ok(segments)
}
