//! Listener registry.
//!
//! An insertion-ordered list of callbacks for one event kind. Registering
//! the same callback twice makes it fire twice. Every registration gets a
//! [`ListenerId`] that removes exactly that registration.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Callback invoked with a terminal event.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle returned by a registration, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub struct ListenerRegistry<E> {
    next_id: u64,
    entries: Vec<(ListenerId, Listener<E>)>,
}

impl<E> ListenerRegistry<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Callbacks in registration order, detached from the registry so they
    /// can be invoked without holding its lock.
    pub fn snapshot(&self) -> Vec<Listener<E>> {
        self.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

impl<E> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Invoke every listener in order. Returns how many were called.
pub fn dispatch<E>(listeners: &[Listener<E>], event: &E) -> usize {
    for listener in listeners {
        listener(event);
    }
    listeners.len()
}

/// Channel-backed registration.
///
/// Created by [`Poller::subscribe`](crate::Poller::subscribe). Events are
/// cloned into an unbounded channel; pass [`id`](Subscription::id) to
/// [`Poller::remove_listener`](crate::Poller::remove_listener) to stop
/// receiving them.
#[derive(Debug)]
pub struct Subscription<E> {
    id: ListenerId,
    rx: mpsc::UnboundedReceiver<E>,
}

/// Listener forwarding clones of every event into a fresh channel.
pub(crate) fn channel_listener<E: Clone + Send + 'static>()
-> (Listener<E>, mpsc::UnboundedReceiver<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: Listener<E> = Arc::new(move |event: &E| {
        // The receiver may be gone; the registration is then inert until
        // removed.
        let _ = tx.send(event.clone());
    });
    (listener, rx)
}

impl<E> Subscription<E> {
    pub(crate) fn new(id: ListenerId, rx: mpsc::UnboundedReceiver<E>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next event. Returns `None` once the registration was
    /// removed or the registry cleared.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Take an already delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }
}
