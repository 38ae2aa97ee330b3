//! Shared test harness: an isolated queue wired to a controllable fake
//! engine, plus helpers for generating WAV inputs and collecting events.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use vidscribe::transcribe::engine::{EngineHooks, EngineOutput, Segment, SpeechEngine};
use vidscribe::{Config, EngineError, EngineParams, JobRequest, QueueEvent, QueueManager};

/// What the fake engine does for every job it is handed.
#[derive(Debug, Clone)]
pub enum EngineScript {
    /// Replay the given progress ticks, then succeed with one segment.
    Complete { ticks: Vec<i32> },
    /// Poll the abort predicate until it fires.
    RunUntilAborted,
}

/// Deterministic stand-in for the speech engine. Tracks how many jobs run
/// concurrently so tests can assert the single-active invariant.
pub struct FakeEngine {
    script: EngineScript,
    concurrent: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl FakeEngine {
    pub fn new(script: EngineScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

impl SpeechEngine for FakeEngine {
    fn run(
        &self,
        _samples: &[f32],
        params: &EngineParams,
        hooks: &mut EngineHooks,
    ) -> Result<EngineOutput, EngineError> {
        let running = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(running, Ordering::SeqCst);

        let result = match &self.script {
            EngineScript::Complete { ticks } => {
                let mut outcome = Ok(());
                for &tick in ticks {
                    if (hooks.should_abort)() {
                        outcome = Err(EngineError::Aborted);
                        break;
                    }
                    (hooks.on_progress)(tick);
                    std::thread::sleep(Duration::from_millis(2));
                }
                outcome.map(|_| {
                    let segment = Segment {
                        start_cs: 0,
                        end_cs: 150,
                        text: " fake transcript".to_string(),
                        tokens: Vec::new(),
                    };
                    (hooks.on_segment)(&segment);
                    EngineOutput {
                        system_info: "fake".to_string(),
                        language: params.language.clone(),
                        segments: vec![segment],
                        ..EngineOutput::default()
                    }
                })
            }
            EngineScript::RunUntilAborted => loop {
                if (hooks.should_abort)() {
                    break Err(EngineError::Aborted);
                }
                std::thread::sleep(Duration::from_millis(5));
            },
        };

        self.concurrent.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Isolated queue environment: temp directories, fake engine, manager.
pub struct TestQueue {
    pub dir: TempDir,
    pub engine: Arc<FakeEngine>,
    pub manager: QueueManager,
}

impl TestQueue {
    pub fn new(script: EngineScript) -> Self {
        let dir = TempDir::new().expect("failed to create temp directory");
        let engine = FakeEngine::new(script);
        let manager = QueueManager::new(Arc::new(Config::default()), engine.clone());
        Self {
            dir,
            engine,
            manager,
        }
    }

    /// Writes a small 16 kHz mono WAV and submits it under the given row.
    pub fn submit_wav(&self, row: u32) -> PathBuf {
        let input = self.write_wav(&format!("job{}.wav", row));
        self.manager
            .submit(
                row,
                JobRequest {
                    input: input.clone(),
                    output_dir: self.dir.path().to_path_buf(),
                    title: format!("Job {}", row),
                    link: format!("https://example.com/{}", row),
                },
            )
            .expect("submit failed");
        input
    }

    pub fn write_wav(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..16 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    /// Collects events until `pred` matches one (that event included) or
    /// the timeout elapses, in which case the test fails.
    pub fn collect_until<F>(&self, timeout: Duration, pred: F) -> Vec<QueueEvent>
    where
        F: Fn(&QueueEvent) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or_else(|| {
                    panic!("timed out waiting for event; got {:?}", events);
                });
            match self.manager.recv_event_timeout(remaining) {
                Some(event) => {
                    let done = pred(&event);
                    events.push(event);
                    if done {
                        return events;
                    }
                }
                None => panic!("timed out waiting for event; got {:?}", events),
            }
        }
    }

    /// Joins all worker threads and drains whatever events are left.
    pub fn shutdown(&self) -> Vec<QueueEvent> {
        self.manager.wait();
        std::iter::from_fn(|| self.manager.try_recv_event()).collect()
    }
}

pub fn finished_rows(events: &[QueueEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            QueueEvent::JobFinished { row, .. } => Some(*row),
            _ => None,
        })
        .collect()
}
