use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use log::debug;

use crate::queue::events::{JobPhase, QueueEvent};
use crate::transcribe::progress::{EventSink, WorkerEvent};

/// One-shot cooperative cancellation flag shared between a job's owner and
/// its worker thread. Set at most once, never reset.
#[derive(Debug, Default)]
pub struct AbortFlag(AtomicBool);

impl AbortFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Sets the flag. Returns `true` only for the transition from unset to
    /// set, so callers can make first-trigger actions idempotent.
    pub fn trigger(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One submitted unit of transcription work.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Input media file (video container or 16 kHz mono WAV).
    pub input: PathBuf,
    /// Directory receiving the intermediate WAV and the transcript report.
    pub output_dir: PathBuf,
    /// Display title embedded in the report.
    pub title: String,
    /// Display link embedded in the report.
    pub link: String,
}

/// A job tracked by the queue: the request plus its row identity and abort
/// flag. The thread handle lives with the active entry in the manager.
#[derive(Debug)]
pub(crate) struct Job {
    pub row: u32,
    pub request: JobRequest,
    pub abort: Arc<AbortFlag>,
}

impl Job {
    pub fn new(row: u32, request: JobRequest) -> Self {
        Self {
            row,
            request,
            abort: Arc::new(AbortFlag::new()),
        }
    }

    /// Fire-and-forget abort: sets the flag and emits an advisory
    /// `Cancelling` status for this row. Actual stoppage waits on the
    /// worker's next cooperative check. Safe to call more than once.
    pub fn request_abort(&self, events: &Sender<QueueEvent>) {
        if self.abort.trigger() {
            debug!("Abort requested for row {}", self.row);
            let _ = events.send(QueueEvent::status(self.row, JobPhase::Cancelling));
        }
    }
}

/// Translates un-scoped worker events into row-scoped queue events.
pub(crate) struct RowSink {
    row: u32,
    events: Sender<QueueEvent>,
}

impl RowSink {
    pub fn new(row: u32, events: Sender<QueueEvent>) -> Self {
        Self { row, events }
    }
}

impl EventSink for RowSink {
    fn report(&self, event: WorkerEvent) {
        let scoped = match event {
            WorkerEvent::Progress(pct) => QueueEvent::Progress { row: self.row, pct },
            WorkerEvent::Status { phase, message } => QueueEvent::Status {
                row: self.row,
                phase,
                message,
            },
        };
        let _ = self.events.send(scoped);
    }
}
