use std::{
    collections::BTreeMap,
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::UnboundedReceiverStream, Stream};

/// Returned by an [Observer] after each notification, to tell the
/// [Store](crate::Store) whether it still wants to receive states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverStatus {
    Alive,
    /// The observer is no longer interested. It is removed from the
    /// store on the next delivery attempt.
    Dead,
}

/// Handle issued by [Store::subscribe()](crate::Store::subscribe()).
/// Handles are issued in increasing order and never reused within a
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A callback which is notified of changes to the
/// [Store](crate::Store) `State`.
pub struct Observer<State> {
    callback: Box<dyn FnMut(Arc<State>) -> ObserverStatus + Send>,
}

impl<State> Observer<State> {
    pub fn new<C>(callback: C) -> Self
    where
        C: FnMut(Arc<State>) -> ObserverStatus + Send + 'static,
    {
        Observer {
            callback: Box::new(callback),
        }
    }

    pub fn observe(&mut self, state: Arc<State>) -> ObserverStatus {
        (self.callback)(state)
    }
}

impl<C, State> From<C> for Observer<State>
where
    C: FnMut(Arc<State>) -> ObserverStatus + Send + 'static,
{
    fn from(callback: C) -> Self {
        Observer::new(callback)
    }
}

impl<State> fmt::Debug for Observer<State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observer")
    }
}

/// The store side of a registered [Observer]. Each observer gets its
/// own delivery task, so a slow observer never holds up the store lane
/// or any other observer, and each observer sees states in commit
/// order.
struct ObserverHandle<State> {
    sender: mpsc::UnboundedSender<Arc<State>>,
}

impl<State> ObserverHandle<State>
where
    State: Send + Sync + 'static,
{
    fn spawn(mut observer: Observer<State>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Arc<State>>();

        tokio::spawn(async move {
            while let Some(state) = receiver.recv().await {
                if observer.observe(state) == ObserverStatus::Dead {
                    break;
                }
            }
        });

        ObserverHandle { sender }
    }

    /// Returns `false` once the delivery task has stopped.
    fn deliver(&self, state: Arc<State>) -> bool {
        self.sender.send(state).is_ok()
    }
}

/// The set of observers registered with a store, keyed by
/// [SubscriptionId]. Only ever touched from inside the store lane.
pub(crate) struct ObserverRegistry<State> {
    observers: BTreeMap<SubscriptionId, ObserverHandle<State>>,
}

impl<State> ObserverRegistry<State>
where
    State: Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        ObserverRegistry {
            observers: BTreeMap::new(),
        }
    }

    /// Register `observer` and deliver `current` to it straight away.
    pub(crate) fn insert(
        &mut self,
        id: SubscriptionId,
        observer: Observer<State>,
        current: Arc<State>,
    ) {
        let handle = ObserverHandle::spawn(observer);
        if handle.deliver(current) {
            self.observers.insert(id, handle);
        }
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    /// Deliver `state` to every observer, dropping the ones which have
    /// declared themselves dead.
    pub(crate) fn notify(&mut self, state: &Arc<State>) {
        let mut dead: Vec<SubscriptionId> = Vec::new();

        for (id, handle) in &self.observers {
            if !handle.deliver(state.clone()) {
                dead.push(*id);
            }
        }

        for id in dead {
            log::debug!("removing dead observer {}", id);
            self.observers.remove(&id);
        }
    }
}

/// A [Stream] of committed states, produced by
/// [Store::watch()](crate::Store::watch()). The first item is the
/// state at the time of subscription. Dropping the stream ends the
/// subscription.
pub struct StateStream<State> {
    id: SubscriptionId,
    inner: UnboundedReceiverStream<Arc<State>>,
}

impl<State> StateStream<State>
where
    State: Send + Sync + 'static,
{
    /// Create the stream and the [Observer] that feeds it.
    pub(crate) fn channel(id: SubscriptionId) -> (Self, Observer<State>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let observer = Observer::new(move |state| match sender.send(state) {
            Ok(()) => ObserverStatus::Alive,
            Err(_) => ObserverStatus::Dead,
        });

        let stream = StateStream {
            id,
            inner: UnboundedReceiverStream::new(receiver),
        };

        (stream, observer)
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl<State> Stream for StateStream<State> {
    type Item = Arc<State>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
