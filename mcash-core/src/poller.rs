//! Generic poll loop.
//!
//! A [`Poller`] drives one [`PollPolicy`] at a time:
//!
//! ```text
//! Idle ──start──▶ Armed ──check──▶ Continue ──sleep(interval)──▶ check …
//!                   │                 Terminal(event) ──deliver──▶ Idle
//!                   │                 Abort(error) ──log──▶ Aborted
//!                   └──start/cancel/close──▶ previous task aborted
//! ```
//!
//! The first check runs as soon as the task is spawned. Each `start`
//! increments the poller's generation; a task only delivers its terminal
//! event if its generation is still current when delivery begins, which is
//! checked under the registry lock. `close` bumps the generation and clears
//! the registry under that same lock, then waits for the task to finish, so
//! nothing is delivered and no request is issued once it returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mcash_sdk::client::ClientError;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::events::EventKind;
use crate::listeners::{self, Listener, ListenerId, ListenerRegistry, Subscription};

/// Outcome of one check.
#[derive(Debug)]
pub enum Check<E> {
    /// Not there yet; check again after the interval.
    Continue,
    /// Done; deliver the event and stop.
    Terminal(E),
    /// Give up on this poll. Nothing is delivered and the target stays
    /// recorded in [`PollState::Aborted`] so the caller can restart it.
    Abort(ClientError),
}

/// What a poll checks and how often.
#[async_trait]
pub trait PollPolicy: Send + 'static {
    type Event: Clone + Send + Sync + 'static;

    /// Key of the polled resource (ticket id, shortlink id, report URI).
    fn target(&self) -> &str;

    /// Delay between the end of one check and the start of the next.
    fn interval(&self) -> Duration;

    async fn check(&mut self) -> Check<Self::Event>;
}

/// Observable state of a poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Armed { target: String },
    Aborted { target: String },
}

impl PollState {
    /// Target of the last poll that has not reached a terminal state.
    pub fn target(&self) -> Option<&str> {
        match self {
            PollState::Idle => None,
            PollState::Armed { target } | PollState::Aborted { target } => Some(target),
        }
    }
}

/// Handle on the running task of a poll.
struct PollTask {
    target: String,
    generation: u64,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Set the cancellation flag and abort at the next suspension point.
    fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
        self.handle.abort();
    }
}

struct Shared<E> {
    kind: EventKind,
    generation: AtomicU64,
    listeners: Mutex<ListenerRegistry<E>>,
    state: Mutex<PollState>,
}

impl<E> Shared<E> {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Deliver a terminal event of `generation` to every listener.
    ///
    /// Returns `false` without calling anything when the generation is
    /// stale. Listeners run after the registry lock is released so they may
    /// register listeners or start a new poll themselves.
    fn deliver(&self, generation: u64, event: &E) -> bool {
        let snapshot: Vec<Listener<E>> = {
            let registry = self.listeners.lock();
            if !self.is_current(generation) {
                return false;
            }
            *self.state.lock() = PollState::Idle;
            registry.snapshot()
        };
        let delivered = listeners::dispatch(&snapshot, event);
        debug!(kind = %self.kind, listeners = delivered, "Delivered event");
        true
    }

    fn set_state(&self, generation: u64, state: PollState) {
        let _registry = self.listeners.lock();
        if self.is_current(generation) {
            *self.state.lock() = state;
        }
    }

    /// Invalidate the running generation. With `clear`, also drop every
    /// listener.
    fn invalidate(&self, clear: bool) -> u64 {
        let mut registry = self.listeners.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.lock() = PollState::Idle;
        if clear {
            registry.clear();
        }
        generation
    }
}

/// Fixed-interval poller for one event kind.
///
/// At most one poll is active at a time. Must be used from within a Tokio
/// runtime.
pub struct Poller<E> {
    shared: Arc<Shared<E>>,
    task: Mutex<Option<PollTask>>,
}

impl<E: Clone + Send + Sync + 'static> Poller<E> {
    pub fn new(kind: EventKind) -> Self {
        Self {
            shared: Arc::new(Shared {
                kind,
                generation: AtomicU64::new(0),
                listeners: Mutex::new(ListenerRegistry::new()),
                state: Mutex::new(PollState::Idle),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.shared.kind
    }

    pub fn state(&self) -> PollState {
        self.shared.state.lock().clone()
    }

    /// Register a callback for terminal events.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.shared.listeners.lock().register(Arc::new(listener))
    }

    /// Remove a registration made with [`add_listener`](Self::add_listener)
    /// or [`subscribe`](Self::subscribe).
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.lock().unregister(id)
    }

    /// Receive terminal events through a channel.
    pub fn subscribe(&self) -> Subscription<E> {
        let (listener, rx) = listeners::channel_listener();
        let id = self.shared.listeners.lock().register(listener);
        Subscription::new(id, rx)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }

    /// Start polling with `policy`, replacing any poll already running.
    ///
    /// Returns immediately; the first check runs on the spawned task without
    /// an initial delay.
    pub fn start<P>(&self, policy: P)
    where
        P: PollPolicy<Event = E>,
    {
        let mut slot = self.task.lock();
        if let Some(previous) = slot.take() {
            debug!(
                kind = %self.shared.kind,
                target = %previous.target,
                generation = previous.generation,
                "Replacing active poll"
            );
            previous.cancel();
        }

        let generation = self.shared.invalidate(false);
        let target = policy.target().to_owned();
        *self.shared.state.lock() = PollState::Armed {
            target: target.clone(),
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(run(policy, shared, generation, cancel_rx));

        info!(
            kind = %self.shared.kind,
            target = %target,
            generation,
            "Poll started"
        );
        *slot = Some(PollTask {
            target,
            generation,
            cancel_tx,
            handle,
        });
    }

    /// Stop the active poll, if any. Listeners stay registered.
    pub fn cancel(&self) {
        let Some(task) = self.task.lock().take() else {
            return;
        };
        self.shared.invalidate(false);
        task.cancel();
        info!(kind = %self.shared.kind, target = %task.target, "Poll cancelled");
    }

    /// Stop the active poll, drop every listener and wait for the task to
    /// wind down.
    pub async fn close(&self) {
        self.shared.invalidate(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.cancel();
            // The task either finished, or got aborted; both are fine here.
            let _ = task.handle.await;
        }
        debug!(kind = %self.shared.kind, "Poller closed");
    }
}

impl<E> Drop for Poller<E> {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel();
        }
    }
}

async fn run<P: PollPolicy>(
    mut policy: P,
    shared: Arc<Shared<P::Event>>,
    generation: u64,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let kind = shared.kind;
    let interval = policy.interval();
    let mut checks: u64 = 0;

    loop {
        if *cancel_rx.borrow() || !shared.is_current(generation) {
            debug!(%kind, target = policy.target(), "Poll cancelled before check");
            return;
        }

        checks += 1;
        match policy.check().await {
            Check::Continue => {
                debug!(%kind, target = policy.target(), checks, "Not terminal yet");
            }
            Check::Terminal(event) => {
                if shared.deliver(generation, &event) {
                    info!(%kind, target = policy.target(), checks, "Poll finished");
                } else {
                    debug!(%kind, target = policy.target(), "Discarding stale terminal event");
                }
                return;
            }
            Check::Abort(e) => {
                error!(
                    %kind,
                    target = policy.target(),
                    checks,
                    transient = e.is_transient(),
                    error = %e,
                    "Poll aborted"
                );
                shared.set_state(
                    generation,
                    PollState::Aborted {
                        target: policy.target().to_owned(),
                    },
                );
                return;
            }
        }

        tokio::select! {
            biased;

            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    debug!(%kind, target = policy.target(), "Poll cancelled while waiting");
                    return;
                }
            }

            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_millis(1000);

    /// Replays scripted checks; the last one repeats.
    struct Scripted {
        target: String,
        script: VecDeque<fn() -> Check<u32>>,
        checks: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(target: &str, script: Vec<fn() -> Check<u32>>) -> (Self, Arc<AtomicUsize>) {
            let checks = Arc::new(AtomicUsize::new(0));
            let policy = Self {
                target: target.to_string(),
                script: script.into(),
                checks: Arc::clone(&checks),
            };
            (policy, checks)
        }
    }

    #[async_trait]
    impl PollPolicy for Scripted {
        type Event = u32;

        fn target(&self) -> &str {
            &self.target
        }

        fn interval(&self) -> Duration {
            INTERVAL
        }

        async fn check(&mut self) -> Check<u32> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            let next = if self.script.len() > 1 {
                self.script.pop_front()
            } else {
                self.script.front().copied()
            };
            next.map_or(Check::Continue, |f| f())
        }
    }

    fn cont() -> Check<u32> {
        Check::Continue
    }

    fn done() -> Check<u32> {
        Check::Terminal(7)
    }

    fn abort() -> Check<u32> {
        Check::Abort(ClientError::Network("connection reset".into()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_is_immediate() {
        let poller = Poller::new(EventKind::PaymentFinished);
        let (policy, checks) = Scripted::new("t", vec![cont]);
        poller.start(policy);
        assert_eq!(poller.state(), PollState::Armed { target: "t".into() });

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_rearms_until_terminal() {
        let poller = Poller::new(EventKind::PaymentFinished);
        let mut events = poller.subscribe();
        let (policy, checks) = Scripted::new("t", vec![cont, cont, done]);

        let started = Instant::now();
        poller.start(policy);
        assert_eq!(events.recv().await, Some(7));
        assert_eq!(started.elapsed(), INTERVAL * 2);
        assert_eq!(checks.load(Ordering::SeqCst), 3);

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(checks.load(Ordering::SeqCst), 3);
        assert_eq!(events.try_recv(), None);
        assert_eq!(poller.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_stops_without_event() {
        let poller = Poller::new(EventKind::ShortlinkScanned);
        let mut events = poller.subscribe();
        let (policy, checks) = Scripted::new("sl", vec![cont, abort]);
        poller.start(policy);

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(checks.load(Ordering::SeqCst), 2);
        assert_eq!(events.try_recv(), None);
        assert_eq!(poller.state(), PollState::Aborted { target: "sl".into() });
        assert_eq!(poller.state().target(), Some("sl"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_rechecks() {
        let poller = Poller::new(EventKind::ReportClosed);
        let (policy, checks) = Scripted::new("r", vec![cont]);
        poller.start(policy);

        tokio::time::sleep(INTERVAL * 2 + INTERVAL / 2).await;
        assert_eq!(checks.load(Ordering::SeqCst), 3);

        poller.cancel();
        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(checks.load(Ordering::SeqCst), 3);
        assert_eq!(poller.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_poll() {
        let poller = Poller::new(EventKind::PaymentFinished);
        let mut events = poller.subscribe();
        let (first, first_checks) = Scripted::new("a", vec![cont, cont, done]);
        let (second, _) = Scripted::new("b", vec![cont, cont, cont, done]);

        poller.start(first);
        tokio::time::sleep(INTERVAL + INTERVAL / 2).await;
        poller.start(second);

        assert_eq!(events.recv().await, Some(7));
        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(events.try_recv(), None);
        assert_eq!(first_checks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_generation_is_not_delivered() {
        let poller: Poller<u32> = Poller::new(EventKind::PaymentFinished);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        poller.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let stale = poller.shared.invalidate(false);
        let current = poller.shared.invalidate(false);
        assert!(!poller.shared.deliver(stale, &1));
        assert!(poller.shared.deliver(current, &1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_clears_listeners_and_stops() {
        let poller = Poller::new(EventKind::PaymentFinished);
        let mut events = poller.subscribe();
        poller.add_listener(|_| {});
        let (policy, checks) = Scripted::new("t", vec![cont, cont, done]);
        poller.start(policy);

        tokio::time::sleep(INTERVAL / 2).await;
        poller.close().await;
        assert_eq!(poller.listener_count(), 0);

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(checks.load(Ordering::SeqCst), 1);
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_can_start_next_poll() {
        let poller = Arc::new(Poller::new(EventKind::PaymentFinished));
        let mut events = poller.subscribe();
        let restarted = Arc::new(AtomicUsize::new(0));

        let handle = Arc::downgrade(&poller);
        let counter = Arc::clone(&restarted);
        poller.add_listener(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                if let Some(poller) = handle.upgrade() {
                    let (next, _) = Scripted::new("next", vec![done]);
                    poller.start(next);
                }
            }
        });

        let (first, _) = Scripted::new("first", vec![done]);
        poller.start(first);
        assert_eq!(events.recv().await, Some(7));
        assert_eq!(events.recv().await, Some(7));
        assert_eq!(restarted.load(Ordering::SeqCst), 2);
    }
}
