// src/program/execution.rs

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

/// Capacity of the live-tail channel, per execution.
///
/// A subscriber that falls more than this many messages behind is lagged
/// (it receives `RecvError::Lagged` and resumes from the oldest retained
/// message) rather than stalling the forwarders. The full record kept on the
/// execution itself is never dropped.
pub const LOG_BUFFER_SIZE: usize = 1000;

/// Tag carried by every message in an execution's log.
///
/// `Out` and `Err` are captured process output lines; `Ok` and `Fail` are the
/// single status annotation the supervisor appends when the process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Out,
    Err,
    Ok,
    Fail,
}

impl MessageKind {
    /// Wire tag as shown to observers ("out", "err", "ok", "fail").
    pub fn tag(self) -> &'static str {
        match self {
            MessageKind::Out => "out",
            MessageKind::Err => "err",
            MessageKind::Ok => "ok",
            MessageKind::Fail => "fail",
        }
    }
}

/// One tagged line in an execution's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

/// Lifecycle status of an execution.
///
/// Transitions exactly once from `Running` to one of the terminal values and
/// is immutable afterwards. `InternalError` is treated as `Failed` for
/// scheduling purposes but is recorded distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Success,
    Retry,
    Failed,
    InternalError,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Running)
    }
}

#[derive(Debug)]
struct LogState {
    messages: Vec<Message>,
    status: Status,
}

/// One timed run of a program.
///
/// Owns an ordered, append-only log of tagged messages and a write-once
/// terminal status. Output lines from the two streams are appended in arrival
/// order; ordering is guaranteed within each stream, not across them.
///
/// Observers attach to the live tail with [`Execution::subscribe`] and see
/// messages appended after they attach; the full record is available as a
/// snapshot via [`Execution::messages`].
#[derive(Debug)]
pub struct Execution {
    id: Uuid,
    program: String,
    started_at: DateTime<Utc>,
    state: Mutex<LogState>,
    live: broadcast::Sender<Message>,
}

impl Execution {
    /// Create a new execution in `Running` state for the named program.
    pub fn new(program: impl Into<String>) -> Self {
        let (live, _) = broadcast::channel(LOG_BUFFER_SIZE);
        Self {
            id: Uuid::new_v4(),
            program: program.into(),
            started_at: Utc::now(),
            state: Mutex::new(LogState {
                messages: Vec::new(),
                status: Status::Running,
            }),
            live,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the owning program.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Append a tagged message to the log and publish it to live subscribers.
    ///
    /// The log is frozen once the status is terminal; late appends are
    /// silently dropped.
    pub async fn append(&self, kind: MessageKind, text: impl Into<String>) {
        let message = Message {
            kind,
            text: text.into(),
        };

        let mut state = self.state.lock().await;
        if state.status.is_terminal() {
            return;
        }
        state.messages.push(message.clone());

        // No live subscribers is fine; the full record was already kept.
        let _ = self.live.send(message);
    }

    /// Pin the terminal status. The first terminal value wins; later calls
    /// are ignored.
    pub async fn finish(&self, status: Status) {
        let mut state = self.state.lock().await;
        if state.status == Status::Running && status.is_terminal() {
            state.status = status;
        }
    }

    pub async fn status(&self) -> Status {
        self.state.lock().await.status
    }

    /// Snapshot of the full message log so far.
    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    /// Attach a live-tail observer.
    ///
    /// The receiver sees messages appended after this call; messages emitted
    /// earlier are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.live.subscribe()
    }
}
