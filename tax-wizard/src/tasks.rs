//! Simulated background work: document processing, identity checks and
//! e-file submission.
//!
//! Tasks never touch session state. Each one sleeps for its delay and then
//! sends a single [`TaskReport`]; the session owner applies the event. Every
//! task can be cancelled through its [`TaskHandle`].
//!
//! Reports carry the scheduler generation current when the task was spawned.
//! Aborting a task cannot recall a report already queued on the channel, so
//! the session bumps the generation on reset and drops reports from older
//! generations.

use std::time::Duration;

use rand::Rng;
use tax_core::{DocumentId, VerificationMethod};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    DocumentProcessed(DocumentId),
    IdentityCheckCompleted(VerificationMethod),
    SubmissionAccepted { confirmation: String },
}

/// A completed task, tagged with the generation it was scheduled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub generation: u64,
    pub event: TaskEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDelays {
    pub document: Duration,
    pub verification: Duration,
    pub submission: Duration,
}

impl Default for TaskDelays {
    fn default() -> Self {
        Self {
            document: Duration::from_millis(2000),
            verification: Duration::from_millis(1500),
            submission: Duration::from_millis(3000),
        }
    }
}

/// A running one-shot task.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Aborts the task; its event will never be sent.
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!(task = self.name, "cancelling task");
            self.handle.abort();
        }
    }
}

/// Spawns simulated tasks on the current tokio runtime.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    tx: mpsc::UnboundedSender<TaskReport>,
    delays: TaskDelays,
    generation: u64,
}

impl TaskScheduler {
    /// Creates a scheduler and the receiver its events arrive on.
    pub fn new(delays: TaskDelays) -> (Self, mpsc::UnboundedReceiver<TaskReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            delays,
            generation: 0,
        };
        (scheduler, rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new generation; reports from tasks spawned earlier become stale.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        debug!(generation = self.generation, "task generation advanced");
        self.generation
    }

    pub fn delays(&self) -> TaskDelays {
        self.delays
    }

    /// Sends `event` after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(
        &self,
        name: &'static str,
        delay: Duration,
        event: TaskEvent,
    ) -> TaskHandle {
        let tx = self.tx.clone();
        let generation = self.generation;
        debug!(task = name, ?delay, generation, "scheduling task");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(TaskReport { generation, event }).is_err() {
                debug!(task = name, "session closed before task completed");
            }
        });
        TaskHandle { name, handle }
    }

    pub fn process_document(
        &self,
        id: DocumentId,
    ) -> TaskHandle {
        self.schedule(
            "document-processing",
            self.delays.document,
            TaskEvent::DocumentProcessed(id),
        )
    }

    pub fn check_identity(
        &self,
        method: VerificationMethod,
    ) -> TaskHandle {
        self.schedule(
            "identity-check",
            self.delays.verification,
            TaskEvent::IdentityCheckCompleted(method),
        )
    }

    pub fn submit_return(&self) -> TaskHandle {
        let confirmation = confirmation_number();
        info!(%confirmation, "submitting return");
        self.schedule(
            "e-file-submission",
            self.delays.submission,
            TaskEvent::SubmissionAccepted { confirmation },
        )
    }
}

const CONFIRMATION_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ0123456789";

/// Random e-file confirmation number, e.g. `TX-7K2M9QH4B`.
pub fn confirmation_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| CONFIRMATION_CHARSET[rng.random_range(0..CONFIRMATION_CHARSET.len())] as char)
        .collect();
    format!("TX-{suffix}")
}
