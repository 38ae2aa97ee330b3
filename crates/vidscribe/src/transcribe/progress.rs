use crate::queue::events::JobPhase;

/// Events emitted by a worker while driving one job. Un-scoped: the job
/// wrapper owns the translation to row-scoped events. The terminal outcome
/// is the return value of [`Transcriber::run`](crate::transcribe::Transcriber::run),
/// not an event, so it is emitted exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress(u8),
    Status { phase: JobPhase, message: String },
}

impl WorkerEvent {
    pub fn status(phase: JobPhase) -> Self {
        WorkerEvent::Status {
            phase,
            message: phase.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        WorkerEvent::Status {
            phase: JobPhase::Failed,
            message: message.into(),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn report(&self, event: WorkerEvent);
}

/// No-op sink for unit tests.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn report(&self, _event: WorkerEvent) {}
}
