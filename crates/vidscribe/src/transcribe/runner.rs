use std::sync::Arc;

use log::{debug, info};
use tracing::info_span;

use crate::config::Config;
use crate::error::EngineError;
use crate::queue::events::{JobOutcome, JobPhase};
use crate::queue::job::{AbortFlag, JobRequest};
use crate::transcribe::audio;
use crate::transcribe::engine::{EngineHooks, SpeechEngine};
use crate::transcribe::extract::AudioExtractor;
use crate::transcribe::progress::{EventSink, WorkerEvent};
use crate::transcribe::report::ReportWriter;

/// Drives one job: conditional audio extraction, the engine invocation, and
/// the report write. Owns no queue or thread management; everything here
/// blocks on the job's dedicated thread.
pub struct Transcriber {
    config: Arc<Config>,
    engine: Arc<dyn SpeechEngine>,
    extractor: AudioExtractor,
    abort: Arc<AbortFlag>,
}

impl Transcriber {
    pub fn new(config: Arc<Config>, engine: Arc<dyn SpeechEngine>, abort: Arc<AbortFlag>) -> Self {
        let extractor = AudioExtractor::new(&config.ffmpeg_path);
        Self {
            config,
            engine,
            extractor,
            abort,
        }
    }

    /// Runs the job to a terminal outcome. Emits progress and status events
    /// through `sink`; the outcome itself is the return value so it is
    /// produced exactly once per job.
    pub fn run(&self, request: &JobRequest, sink: Arc<dyn EventSink>) -> JobOutcome {
        if self.abort.is_set() {
            debug!("Job for {} aborted before start", request.input.display());
            return JobOutcome::Aborted;
        }

        let _run_span = info_span!("transcribe", input = %request.input.display()).entered();

        let stem = request
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let report_path = request.output_dir.join(format!("{}.json", stem));

        // Step 1: extract the audio track when the input is a video container
        let wav_path = if AudioExtractor::needs_extraction(&request.input) {
            let _step = info_span!("extract_audio").entered();
            sink.report(WorkerEvent::status(JobPhase::ExtractingAudio));

            let wav_path = request.output_dir.join(format!("{}.wav", stem));
            if let Err(e) = self.extractor.extract(&request.input, &wav_path) {
                return self.fail(&sink, e.to_string());
            }
            if self.abort.is_set() {
                return JobOutcome::Aborted;
            }
            wav_path
        } else {
            request.input.clone()
        };

        // Step 2: read the PCM input
        let samples = {
            let _step = info_span!("read_audio").entered();
            match audio::read_wav(&wav_path) {
                Ok(samples) => samples,
                Err(e) => return self.fail(&sink, e.to_string()),
            }
        };

        // Step 3: run the engine
        sink.report(WorkerEvent::status(JobPhase::Transcribing));
        let output = {
            let _step = info_span!("run_engine").entered();
            let mut hooks = self.hooks(Arc::clone(&sink));
            match self.engine.run(&samples, &self.config.engine, &mut hooks) {
                Ok(output) => output,
                Err(EngineError::Aborted) => {
                    info!("Engine run aborted for {}", request.input.display());
                    return JobOutcome::Aborted;
                }
                Err(e) => return self.fail(&sink, e.to_string()),
            }
        };

        // Step 4: persist the transcript report
        {
            let _step = info_span!("write_report").entered();
            let writer = ReportWriter::new(self.config.full_token_output);
            if let Err(e) = writer.write(
                &output,
                &self.config.engine,
                &self.config.model_path,
                &request.title,
                &request.link,
                &report_path,
            ) {
                return self.fail(&sink, e.to_string());
            }
        }

        sink.report(WorkerEvent::Progress(100));
        sink.report(WorkerEvent::status(JobPhase::Completed));
        JobOutcome::Completed
    }

    /// Engine hooks: throttled progress relay, segment logging, and the
    /// cooperative abort predicate.
    fn hooks(&self, sink: Arc<dyn EventSink>) -> EngineHooks {
        let step = self.config.progress_step as i32;
        let mut last_reported = 0i32;
        let abort = Arc::clone(&self.abort);

        EngineHooks {
            on_progress: Box::new(move |progress| {
                let pct = progress.clamp(0, 100);
                if pct >= last_reported + step {
                    last_reported = pct;
                    sink.report(WorkerEvent::Progress(pct as u8));
                }
            }),
            on_segment: Box::new(|segment| {
                debug!(
                    "segment [{} -> {}]: {}",
                    segment.start_cs,
                    segment.end_cs,
                    segment.text.trim()
                );
            }),
            should_abort: Box::new(move || abort.is_set()),
        }
    }

    fn fail(&self, sink: &Arc<dyn EventSink>, reason: String) -> JobOutcome {
        sink.report(WorkerEvent::failure(reason.clone()));
        JobOutcome::Failed { reason }
    }
}
