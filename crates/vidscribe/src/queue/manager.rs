use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::error::QueueError;
use crate::queue::events::QueueEvent;
use crate::queue::job::{Job, JobRequest, RowSink};
use crate::transcribe::engine::SpeechEngine;
use crate::transcribe::progress::EventSink;
use crate::transcribe::runner::Transcriber;

/// Owns the FIFO of pending jobs and the (at most one) active job. All
/// mutations are serialized behind one mutex, so submission, cancellation,
/// and worker-thread completion callbacks can arrive from any thread.
pub struct QueueManager {
    shared: Arc<Shared>,
    events_rx: Receiver<QueueEvent>,
}

struct Shared {
    state: Mutex<QueueState>,
    events_tx: Sender<QueueEvent>,
    engine: Arc<dyn SpeechEngine>,
    config: Arc<Config>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Job>,
    active: HashMap<u32, ActiveJob>,
    /// Threads of retired jobs, still winding down. Joined by `wait()`.
    draining: Vec<JoinHandle<()>>,
}

struct ActiveJob {
    job: Job,
    /// Set right after spawn; a worker that finishes before the handle is
    /// recorded parks it in `draining` itself.
    handle: Option<JoinHandle<()>>,
}

impl QueueManager {
    pub fn new(config: Arc<Config>, engine: Arc<dyn SpeechEngine>) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                events_tx,
                engine,
                config,
            }),
            events_rx,
        }
    }

    /// Appends a job to the pending queue. Row ids are caller-issued and
    /// must be unique among jobs still tracked.
    pub fn submit(&self, row: u32, request: JobRequest) -> Result<(), QueueError> {
        let mut state = self.shared.state.lock().unwrap();

        let in_use =
            state.active.contains_key(&row) || state.pending.iter().any(|j| j.row == row);
        if in_use {
            return Err(QueueError::DuplicateRow(row));
        }

        debug!("Submitted row {}: {}", row, request.input.display());
        state.pending.push_back(Job::new(row, request));
        Ok(())
    }

    /// Starts the head of the queue if nothing is active. No-op when a job
    /// is already running or nothing is pending.
    pub fn start(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if state.active.is_empty() {
            Shared::start_next(&self.shared, &mut state);
        }
    }

    /// Requests abort on every active job and purges the pending queue;
    /// pending jobs never execute. Aborted threads keep winding down in the
    /// background. Emits `AllFinished` immediately when anything was
    /// dropped: both sets are empty as a postcondition and the session is
    /// deterministically over.
    pub fn cancel_all(&self) {
        let mut state = self.shared.state.lock().unwrap();

        let had_work = !state.active.is_empty() || !state.pending.is_empty();
        for (row, mut active) in state.active.drain().collect::<Vec<_>>() {
            info!("Cancelling active row {}", row);
            active.job.request_abort(&self.shared.events_tx);
            if let Some(handle) = active.handle.take() {
                state.draining.push(handle);
            }
        }

        let purged = state.pending.len();
        state.pending.clear();
        if purged > 0 {
            info!("Purged {} pending job(s)", purged);
        }

        if had_work {
            let _ = self.shared.events_tx.send(QueueEvent::AllFinished);
        }
    }

    /// Requests abort on the active job and hands off to the next pending
    /// one before returning. Fire-and-forget: the old worker thread may
    /// keep running until its next cooperative abort check.
    pub fn cancel_current(&self) {
        let mut state = self.shared.state.lock().unwrap();

        let row = match state.active.keys().next().copied() {
            Some(row) => row,
            None => return,
        };
        let mut active = state.active.remove(&row).expect("row key just observed");

        info!("Cancelling current row {}", row);
        active.job.request_abort(&self.shared.events_tx);
        if let Some(handle) = active.handle.take() {
            state.draining.push(handle);
        }

        Shared::start_next(&self.shared, &mut state);
    }

    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().unwrap().pending.len()
    }

    pub fn active_rows(&self) -> Vec<u32> {
        self.shared.state.lock().unwrap().active.keys().copied().collect()
    }

    pub fn is_idle(&self) -> bool {
        let state = self.shared.state.lock().unwrap();
        state.pending.is_empty() && state.active.is_empty()
    }

    pub fn try_recv_event(&self) -> Option<QueueEvent> {
        self.events_rx.try_recv().ok()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<QueueEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Blocks until no job is running or queued, then joins all worker
    /// threads that are still winding down. Panicking workers are logged,
    /// not propagated.
    pub fn wait(&self) {
        loop {
            let (handles, done) = {
                let mut state = self.shared.state.lock().unwrap();
                let handles = std::mem::take(&mut state.draining);
                let done = state.pending.is_empty() && state.active.is_empty();
                (handles, done)
            };

            for handle in handles {
                if let Err(e) = handle.join() {
                    error!("Worker thread panicked: {:?}", e);
                }
            }

            if done {
                let state = self.shared.state.lock().unwrap();
                if state.draining.is_empty() {
                    break;
                }
            } else {
                thread::sleep(Duration::from_millis(50));
            }
        }
        debug!("All worker threads have stopped");
    }
}

impl Shared {
    /// Dequeues the head job and launches its dedicated thread. Caller
    /// holds the state lock.
    fn start_next(shared: &Arc<Shared>, state: &mut QueueState) {
        let job = match state.pending.pop_front() {
            Some(job) => job,
            None => return,
        };
        let row = job.row;
        info!("Starting row {}: {}", row, job.request.input.display());

        let request = job.request.clone();
        let abort = Arc::clone(&job.abort);
        state.active.insert(row, ActiveJob { job, handle: None });

        let worker_shared = Arc::clone(shared);
        let handle = thread::spawn(move || {
            let sink: Arc<dyn EventSink> =
                Arc::new(RowSink::new(row, worker_shared.events_tx.clone()));
            let transcriber = Transcriber::new(
                Arc::clone(&worker_shared.config),
                Arc::clone(&worker_shared.engine),
                abort,
            );

            let outcome = transcriber.run(&request, sink);
            debug!("Row {} finished: {:?}", row, outcome);

            let _ = worker_shared
                .events_tx
                .send(QueueEvent::JobFinished { row, outcome });
            Shared::on_job_finished(&worker_shared, row);
        });

        match state.active.get_mut(&row) {
            Some(active) => active.handle = Some(handle),
            // The worker already finished and retired itself
            None => state.draining.push(handle),
        }
    }

    /// Worker-thread completion callback: retires the row, then either
    /// signals overall completion or starts the next job. A row already
    /// retired by a cancel path only had its terminal event relayed; the
    /// cancel path owns the hand-off, so nothing more happens here.
    fn on_job_finished(shared: &Arc<Shared>, row: u32) {
        let mut state = shared.state.lock().unwrap();

        match state.active.remove(&row) {
            Some(mut active) => {
                if let Some(handle) = active.handle.take() {
                    state.draining.push(handle);
                }
            }
            None => {
                debug!("Row {} finished after being retired", row);
                return;
            }
        }

        if state.active.is_empty() {
            if state.pending.is_empty() {
                let _ = shared.events_tx.send(QueueEvent::AllFinished);
            } else {
                Shared::start_next(shared, &mut state);
            }
        } else {
            warn!("Row {} finished while another job is active", row);
        }
    }
}
