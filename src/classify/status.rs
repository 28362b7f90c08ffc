//! Rotating "AI analysis in progress" text.
//!
//! Purely cosmetic: the ticker never influences a classification result. A
//! [`StatusBoard`] is the stable channel a view subscribes to; each in-flight
//! preview starts its own [`StatusTicker`] on it and holds the only handle
//! that can cancel it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub const STATUS_MESSAGES: [&str; 5] = [
    "Analyzing...",
    "Powered by AI",
    "Green Energy",
    "Processing Image...",
    "Detecting Waste Type...",
];

/// What the status area shows. `generation` identifies the ticker that last
/// owned the line so a superseded ticker can never overwrite a newer one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub generation: u64,
    pub text: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct StatusBoard {
    tx: Arc<watch::Sender<StatusLine>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusLine::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusLine> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<&'static str> {
        self.tx.borrow().text
    }

    /// Show the first message now and advance every `period`.
    pub fn start_ticker(&self, period: Duration) -> StatusTicker {
        let period = period.max(Duration::from_millis(1));
        let mut generation = 0;
        self.tx.send_modify(|line| {
            line.generation += 1;
            line.text = Some(STATUS_MESSAGES[0]);
            generation = line.generation;
        });

        let token = CancellationToken::new();
        let task_token = token.clone();
        let board = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut index = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticks.tick() => {
                        index = (index + 1) % STATUS_MESSAGES.len();
                        board.send_if_modified(|line| {
                            if task_token.is_cancelled() || line.generation != generation {
                                return false;
                            }
                            line.text = Some(STATUS_MESSAGES[index]);
                            true
                        });
                        trace!(generation, text = STATUS_MESSAGES[index], "status rotated");
                    }
                }
            }
        });

        StatusTicker {
            generation,
            token,
            board: self.tx.clone(),
            handle,
        }
    }
}

/// Cancellation handle for one rotation task. Dropping it cancels.
pub struct StatusTicker {
    generation: u64,
    token: CancellationToken,
    board: Arc<watch::Sender<StatusLine>>,
    handle: JoinHandle<()>,
}

impl StatusTicker {
    pub fn cancel(&self) {
        self.token.cancel();
        let generation = self.generation;
        self.board.send_if_modified(|line| {
            if line.generation == generation && line.text.is_some() {
                line.text = None;
                true
            } else {
                false
            }
        });
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
