use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use flume::{Receiver, Sender, TrySendError};
use htmldisplay_core::{ActionId, ConnectionEvent, ServerMessage};

pub type SubscriberId = u64;

/// Events a subscriber may leave unread before it is dropped.
pub const SUBSCRIBER_BUFFER_SIZE: usize = 100;

/// Tracks the live channel of every open preview window and notifies
/// subscribers when a window connects or disconnects.
///
/// Notifications are sent while the state lock is held, so every subscriber
/// observes the transitions of a given action in the order they happened.
#[derive(Clone, Default)]
pub struct ConnectionTracker(Arc<TrackerInner>);

#[derive(Default)]
struct TrackerInner {
    state: Mutex<TrackerState>,
    counter: AtomicU64,
}

#[derive(Default)]
struct TrackerState {
    connections: HashMap<ActionId, LiveConnection>,
    subscribers: HashMap<SubscriberId, Sender<ConnectionEvent>>,
}

impl TrackerState {
    fn notify(&mut self, event: ConnectionEvent) {
        tracing::debug!(
            "action {} connection changed: connected={}",
            event.action_id,
            event.connected
        );
        self.subscribers
            .retain(|id, subscriber| match subscriber.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("dropping subscriber {id}: {SUBSCRIBER_BUFFER_SIZE} events unread");
                    false
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}

struct LiveConnection {
    id: u64,
    outbox: Sender<ServerMessage>,
    open: Arc<AtomicBool>,
}

impl LiveConnection {
    fn shut(&self, message: ServerMessage) {
        self.open.store(false, Ordering::SeqCst);
        if let Err(error) = self.outbox.send(message) {
            tracing::debug!("channel already gone: {error}");
        }
    }
}

/// The server side of one accepted channel.
pub struct Channel {
    action_id: ActionId,
    id: u64,
    outbox: Receiver<ServerMessage>,
    open: Arc<AtomicBool>,
}

impl Channel {
    pub fn action_id(&self) -> &ActionId {
        &self.action_id
    }

    /// Messages the server wants written to this channel.
    pub fn outbox(&self) -> Receiver<ServerMessage> {
        self.outbox.clone()
    }
}

impl ConnectionTracker {
    fn next_id(&self) -> u64 {
        self.0.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record a new live channel for `action_id`.
    ///
    /// A channel that was already live for the same action is replaced: it is
    /// disconnected without closing its window and subscribers see it go
    /// away before the new one arrives.
    pub fn connect(&self, action_id: ActionId) -> Channel {
        let (outbox_tx, outbox) = flume::unbounded();
        let open = Arc::new(AtomicBool::new(true));
        let id = self.next_id();

        let mut state = self.0.state.lock().unwrap();

        let previous = state.connections.insert(
            action_id.clone(),
            LiveConnection {
                id,
                outbox: outbox_tx,
                open: open.clone(),
            },
        );

        if let Some(previous) = previous {
            tracing::info!("replacing existing channel for action {action_id}");
            previous.shut(ServerMessage::Disconnect);
            state.notify(ConnectionEvent::closed(action_id.clone()));
        }

        state.notify(ConnectionEvent::opened(action_id.clone()));

        Channel {
            action_id,
            id,
            outbox,
            open,
        }
    }

    /// Forget `channel` after it closed from either end.
    ///
    /// Does nothing if the channel was already removed by [`Self::close_window`]
    /// or replaced by a newer connection.
    pub fn disconnect(&self, channel: &Channel) {
        channel.open.store(false, Ordering::SeqCst);

        let mut state = self.0.state.lock().unwrap();

        let is_current = state
            .connections
            .get(&channel.action_id)
            .is_some_and(|connection| connection.id == channel.id);

        if is_current {
            state.connections.remove(&channel.action_id);
            state.notify(ConnectionEvent::closed(channel.action_id.clone()));
        }
    }

    pub fn is_connected(&self, action_id: &ActionId) -> bool {
        self.0
            .state
            .lock()
            .unwrap()
            .connections
            .get(action_id)
            .is_some_and(|connection| connection.open.load(Ordering::SeqCst))
    }

    /// Tell the window of `action_id` to close and drop its channel.
    ///
    /// Returns false when no open channel exists.
    pub fn close_window(&self, action_id: &ActionId) -> bool {
        let mut state = self.0.state.lock().unwrap();

        let is_open = state
            .connections
            .get(action_id)
            .is_some_and(|connection| connection.open.load(Ordering::SeqCst));
        if !is_open {
            return false;
        }

        if let Some(connection) = state.connections.remove(action_id) {
            connection.shut(ServerMessage::CloseWindow);
            state.notify(ConnectionEvent::closed(action_id.clone()));
        }

        true
    }

    /// Start receiving connection changes.
    ///
    /// A subscriber that falls [`SUBSCRIBER_BUFFER_SIZE`] events behind is
    /// removed and its [`Subscription::recv`] fails once the backlog is read.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = flume::bounded(SUBSCRIBER_BUFFER_SIZE);
        let id = self.next_id();

        self.0.state.lock().unwrap().subscribers.insert(id, sender);

        Subscription {
            id,
            receiver,
            tracker: self.clone(),
        }
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.0
            .state
            .lock()
            .unwrap()
            .subscribers
            .remove(&id)
            .is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.state.lock().unwrap().subscribers.len()
    }
}

/// A stream of connection changes. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<ConnectionEvent>,
    tracker: ConnectionTracker,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next connection change.
    ///
    /// Fails once the subscription has been removed with
    /// [`ConnectionTracker::unsubscribe`].
    pub async fn recv(&self) -> Result<ConnectionEvent, flume::RecvError> {
        self.receiver.recv_async().await
    }

    pub fn try_recv(&self) -> Option<ConnectionEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.tracker.unsubscribe(self.id);
    }
}
