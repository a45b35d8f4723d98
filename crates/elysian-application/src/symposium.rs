//! The symposium scheduler.
//!
//! Autonomous-continuation mode for the Innovators Assembly: while
//! running, a single-shot timer fires the next "continue" turn through
//! the retry-wrapped chat call. Any turn error forces a transition to
//! paused; pausing clears the pending timer, and a generation counter
//! guarantees no queued tick ever executes after a pause.

use elysian_core::chat::{ChatSession, OutgoingMessage, format_api_error, is_rate_limited};
use elysian_core::retry::{RetryPolicy, with_retry};
use elysian_core::session::ChatMessage;
use elysian_interaction::personas::{CONTINUE_PROMPT, KICKOFF_PROMPT, KICKOFF_PROMPT_DISPLAY};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Delay between autonomous turns. Sized generously to stay clear of
/// API rate limiting.
pub const DEFAULT_TURN_INTERVAL: Duration = Duration::from_secs(30);

/// Scheduler mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymposiumState {
    Idle,
    Running,
    Paused,
}

struct SchedulerCore {
    state: SymposiumState,
    /// Bumped on every pause/detach; stale turns compare against it and
    /// bail out.
    generation: u64,
    pending: Option<JoinHandle<()>>,
    session: Option<Arc<dyn ChatSession>>,
}

impl SchedulerCore {
    fn cancel_pending(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

struct Inner {
    core: Mutex<SchedulerCore>,
    sink: mpsc::UnboundedSender<ChatMessage>,
    interval: Duration,
    retry: RetryPolicy,
}

/// Drives autonomous continuation turns against the active chat session.
pub struct SymposiumScheduler {
    inner: Arc<Inner>,
}

impl SymposiumScheduler {
    /// Creates an idle scheduler emitting produced messages into `sink`.
    pub fn new(sink: mpsc::UnboundedSender<ChatMessage>) -> Self {
        Self::with_timing(sink, DEFAULT_TURN_INTERVAL, RetryPolicy::default())
    }

    pub fn with_timing(
        sink: mpsc::UnboundedSender<ChatMessage>,
        interval: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(SchedulerCore {
                    state: SymposiumState::Idle,
                    generation: 0,
                    pending: None,
                    session: None,
                }),
                sink,
                interval,
                retry,
            }),
        }
    }

    pub async fn state(&self) -> SymposiumState {
        self.inner.core.lock().await.state
    }

    /// Attaches the session autonomous turns are sent through. Any prior
    /// schedule is cancelled and the scheduler returns to idle.
    pub async fn attach_session(&self, session: Arc<dyn ChatSession>) {
        let mut core = self.inner.core.lock().await;
        core.cancel_pending();
        core.state = SymposiumState::Idle;
        core.session = Some(session);
    }

    /// Detaches the session and returns to idle.
    pub async fn detach_session(&self) {
        let mut core = self.inner.core.lock().await;
        core.cancel_pending();
        core.state = SymposiumState::Idle;
        core.session = None;
    }

    /// Toggles the scheduler.
    ///
    /// Idle -> Running performs the kickoff turn; Paused -> Running sends
    /// a continuation immediately; Running -> Paused cancels the pending
    /// timer.
    pub async fn toggle(&self) -> SymposiumState {
        let mut core = self.inner.core.lock().await;
        match core.state {
            SymposiumState::Running => {
                core.cancel_pending();
                core.state = SymposiumState::Paused;
                tracing::info!("symposium paused");
            }
            SymposiumState::Idle => {
                if core.session.is_none() {
                    tracing::warn!("symposium toggle ignored: no session attached");
                    return core.state;
                }
                core.state = SymposiumState::Running;
                tracing::info!("symposium initiated");
                let _ = self
                    .inner
                    .sink
                    .send(ChatMessage::system(KICKOFF_PROMPT_DISPLAY));
                self.spawn_turn(&mut core, KICKOFF_PROMPT, None);
            }
            SymposiumState::Paused => {
                core.state = SymposiumState::Running;
                tracing::info!("symposium resumed");
                self.spawn_turn(&mut core, CONTINUE_PROMPT, None);
            }
        }
        core.state
    }

    /// Forces a pause, cancelling any pending turn.
    pub async fn pause(&self) {
        let mut core = self.inner.core.lock().await;
        if core.state == SymposiumState::Running {
            core.cancel_pending();
            core.state = SymposiumState::Paused;
            tracing::info!("symposium paused");
        }
    }

    fn spawn_turn(&self, core: &mut SchedulerCore, prompt: &'static str, delay: Option<Duration>) {
        let generation = core.generation;
        let handle = tokio::spawn(run_turn(self.inner.clone(), generation, prompt, delay));
        core.pending = Some(handle);
    }
}

/// One scheduled turn: optional timer wait, staleness check, retry-wrapped
/// send, then either re-arm or force a pause.
fn run_turn(
    inner: Arc<Inner>,
    generation: u64,
    prompt: &'static str,
    delay: Option<Duration>,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // A pause between scheduling and execution makes this turn stale.
        let session = {
            let core = inner.core.lock().await;
            if core.generation != generation || core.state != SymposiumState::Running {
                return;
            }
            core.session.clone()
        };
        let Some(session) = session else {
            return;
        };

        let result = with_retry(inner.retry, || {
            session.send_message(OutgoingMessage::text(prompt))
        })
        .await;

        match result {
            Ok(text) => {
                let _ = inner.sink.send(ChatMessage::avatar(text));

                let mut core = inner.core.lock().await;
                if core.generation == generation && core.state == SymposiumState::Running {
                    let next = tokio::spawn(run_turn(
                        inner.clone(),
                        generation,
                        CONTINUE_PROMPT,
                        Some(inner.interval),
                    ));
                    core.pending = Some(next);
                }
            }
            Err(err) => {
                let notice = if is_rate_limited(&err) {
                    tracing::error!("symposium rate limited; pausing");
                    "API rate limit exceeded. Symposium has been automatically paused.".to_string()
                } else {
                    tracing::error!(error = %err, "symposium turn failed; pausing");
                    format!(
                        "Symposium encountered a communication fault: {}",
                        format_api_error(&err)
                    )
                };
                let _ = inner.sink.send(ChatMessage::system(notice));

                let mut core = inner.core.lock().await;
                if core.generation == generation {
                    // This turn owns the pending slot; dropping it (rather
                    // than aborting) avoids cancelling ourselves.
                    core.generation += 1;
                    core.pending = None;
                    core.state = SymposiumState::Paused;
                }
            }
        }
    })
}
