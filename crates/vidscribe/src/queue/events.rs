//! Row-scoped events relayed from worker threads to the queue's caller.

use serde::Serialize;

/// Phase of a transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Queued,
    ExtractingAudio,
    Transcribing,
    Cancelling,
    Completed,
    Failed,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPhase::Queued => write!(f, "Queued"),
            JobPhase::ExtractingAudio => write!(f, "Extracting audio"),
            JobPhase::Transcribing => write!(f, "Transcribing"),
            JobPhase::Cancelling => write!(f, "Cancelling"),
            JobPhase::Completed => write!(f, "Completed"),
            JobPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Terminal state of a job. Cancellation and failure are distinct cases:
/// the queue only needs the row-level distinction, the caller gets the
/// failure reason as display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    Aborted,
    Failed { reason: String },
}

impl JobOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, JobOutcome::Aborted)
    }
}

/// Event delivered to the queue's caller, tagged with the submitting row id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QueueEvent {
    Progress { row: u32, pct: u8 },
    Status { row: u32, phase: JobPhase, message: String },
    JobFinished { row: u32, outcome: JobOutcome },
    AllFinished,
}

impl QueueEvent {
    pub fn status(row: u32, phase: JobPhase) -> Self {
        QueueEvent::Status {
            row,
            phase,
            message: phase.to_string(),
        }
    }
}
