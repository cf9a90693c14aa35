use crate::{
    listener::{ObserverRegistry, StateStream},
    middleware::{Middleware, Next},
    Observer, Reducer, StoreError, SubscriptionId,
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::{mpsc, watch};

/// A message for the store lane. Everything which reads or writes the
/// state, or the set of observers, travels through the same channel so
/// it is applied in enqueue order.
pub(crate) enum Command<State, Action> {
    /// Run an action through the whole middleware chain.
    Dispatch(Action),
    /// Continue an action from the middleware at `position`, after a
    /// middleware called [Next::run()] asynchronously.
    Resume { position: usize, action: Action },
    Subscribe {
        id: SubscriptionId,
        observer: Observer<State>,
    },
    Unsubscribe(SubscriptionId),
}

/// A non-owning handle used to send actions into a [Store].
///
/// Middleware tasks hold a `Dispatcher` rather than a [Store] so that
/// the store lane stops once the application drops its last [Store]
/// handle; from then on every dispatch fails with [StoreError::Closed].
pub struct Dispatcher<State, Action> {
    commands: mpsc::WeakUnboundedSender<Command<State, Action>>,
}

impl<State, Action> Clone for Dispatcher<State, Action> {
    fn clone(&self) -> Self {
        Dispatcher {
            commands: self.commands.clone(),
        }
    }
}

impl<State, Action> fmt::Debug for Dispatcher<State, Action> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dispatcher")
    }
}

impl<State, Action> Dispatcher<State, Action> {
    /// Enqueue `action` at the start of the middleware chain.
    pub fn dispatch<A: Into<Action>>(&self, action: A) -> Result<(), StoreError> {
        self.send(Command::Dispatch(action.into()))
    }

    pub fn is_closed(&self) -> bool {
        self.commands.upgrade().is_none()
    }

    pub(crate) fn send(&self, command: Command<State, Action>) -> Result<(), StoreError> {
        let commands = self.commands.upgrade().ok_or(StoreError::Closed)?;
        commands.send(command).map_err(|_| StoreError::Closed)
    }
}

/// Returned by [Store::subscribe()]. Dropping a `Subscription` does not
/// end it; call [Subscription::unsubscribe()], or have the observer
/// return [ObserverStatus::Dead](crate::ObserverStatus::Dead).
pub struct Subscription<State, Action> {
    id: SubscriptionId,
    dispatcher: Dispatcher<State, Action>,
}

impl<State, Action> Subscription<State, Action> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the observer from the store. Delivery stops once the
    /// store lane has processed everything queued before this call.
    pub fn unsubscribe(self) {
        if self.dispatcher.send(Command::Unsubscribe(self.id)).is_err() {
            log::debug!("store closed before unsubscribing {}", self.id);
        }
    }
}

/// Builds a [Store] with an ordered middleware chain.
pub struct StoreBuilder<State, Action> {
    reducer: Box<dyn Reducer<State, Action>>,
    initial_state: State,
    middleware: Vec<Arc<dyn Middleware<State, Action>>>,
}

impl<State, Action> StoreBuilder<State, Action>
where
    State: PartialEq + Send + Sync + 'static,
    Action: Send + 'static,
{
    pub fn new<R: Reducer<State, Action>>(reducer: R, initial_state: State) -> Self {
        StoreBuilder {
            reducer: Box::new(reducer),
            initial_state,
            middleware: Vec::new(),
        }
    }

    /// Append `middleware` to the chain. Middleware added first sees
    /// each action first.
    pub fn middleware<M: Middleware<State, Action> + 'static>(self, middleware: M) -> Self {
        self.shared_middleware(Arc::new(middleware))
    }

    /// Like [StoreBuilder::middleware()], for middleware the caller
    /// keeps a handle to.
    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware<State, Action>>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Spawn the store lane on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn build(self) -> Store<State, Action> {
        let state = Arc::new(self.initial_state);
        let (commands, receiver) = mpsc::unbounded_channel();
        let (published, state_receiver) = watch::channel(state.clone());

        let lane = Lane {
            reducer: self.reducer,
            middleware: self.middleware,
            state,
            observers: ObserverRegistry::new(),
            commands: receiver,
            dispatcher: Dispatcher {
                commands: commands.downgrade(),
            },
            published,
        };
        tokio::spawn(lane.run());

        Store {
            commands,
            state: state_receiver,
            next_subscription: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// This struct is designed to operate as a central source of truth
/// within your application.
///
/// The current state of this store ([Store::state()]) can only be
/// modified by dispatching an `Action` via [Store::dispatch()]. All
/// actions are applied one at a time by a dedicated task (the store
/// lane) which owns the state: each action runs through the middleware
/// chain, then the [Reducer] produces the next state, and observers
/// registered with [Store::subscribe()] are notified if it changed.
///
/// `Store` is a cheap handle; clones share the same lane. The lane
/// stops once every `Store` handle has been dropped.
pub struct Store<State, Action> {
    commands: mpsc::UnboundedSender<Command<State, Action>>,
    state: watch::Receiver<Arc<State>>,
    next_subscription: Arc<AtomicU64>,
}

impl<State, Action> Clone for Store<State, Action> {
    fn clone(&self) -> Self {
        Store {
            commands: self.commands.clone(),
            state: self.state.clone(),
            next_subscription: self.next_subscription.clone(),
        }
    }
}

impl<State, Action> Store<State, Action>
where
    State: PartialEq + Send + Sync + 'static,
    Action: Send + 'static,
{
    /// Create a new [Store] without middleware, which uses the
    /// specified `reducer` to handle `Action`s, starting from
    /// `initial_state`.
    pub fn new<R: Reducer<State, Action>>(reducer: R, initial_state: State) -> Self {
        StoreBuilder::new(reducer, initial_state).build()
    }

    pub fn builder<R: Reducer<State, Action>>(
        reducer: R,
        initial_state: State,
    ) -> StoreBuilder<State, Action> {
        StoreBuilder::new(reducer, initial_state)
    }

    /// Get the latest committed `State`.
    ///
    /// Actions dispatched but not yet applied by the store lane are not
    /// reflected; use [Store::wait_for()] to wait for a given state.
    pub fn state(&self) -> Arc<State> {
        self.state.borrow().clone()
    }

    /// Dispatch an `Action` to be passed through the middleware chain
    /// and then to the [Reducer]. Returns as soon as the action is
    /// queued.
    pub fn dispatch<A: Into<Action>>(&self, action: A) {
        if self.try_dispatch(action).is_err() {
            log::warn!("store lane is closed, dropping dispatched action");
        }
    }

    /// Like [Store::dispatch()], reporting when the lane is gone.
    pub fn try_dispatch<A: Into<Action>>(&self, action: A) -> Result<(), StoreError> {
        self.commands
            .send(Command::Dispatch(action.into()))
            .map_err(|_| StoreError::Closed)
    }

    pub fn dispatcher(&self) -> Dispatcher<State, Action> {
        Dispatcher {
            commands: self.commands.downgrade(),
        }
    }

    /// Subscribe an [Observer] to changes in the store state. The
    /// observer is registered from inside the store lane and
    /// immediately receives the state at that point, followed by every
    /// state committed after it.
    pub fn subscribe<O: Into<Observer<State>>>(&self, observer: O) -> Subscription<State, Action> {
        let id = self.issue_subscription_id();
        if self
            .commands
            .send(Command::Subscribe {
                id,
                observer: observer.into(),
            })
            .is_err()
        {
            log::warn!("store lane is closed, observer {} not registered", id);
        }

        Subscription {
            id,
            dispatcher: self.dispatcher(),
        }
    }

    /// Subscribe to changes in the store state as a [Stream](tokio_stream::Stream).
    /// Dropping the stream ends the subscription.
    pub fn watch(&self) -> StateStream<State> {
        let id = self.issue_subscription_id();
        let (stream, observer) = StateStream::channel(id);
        if self
            .commands
            .send(Command::Subscribe { id, observer })
            .is_err()
        {
            log::warn!("store lane is closed, stream {} not registered", id);
        }

        stream
    }

    /// Wait until the committed state satisfies `predicate`, and return
    /// that state. Resolves immediately if the current state already
    /// does.
    pub async fn wait_for<P>(&self, mut predicate: P) -> Result<Arc<State>, StoreError>
    where
        P: FnMut(&State) -> bool,
    {
        let mut receiver = self.state.clone();
        let state = receiver
            .wait_for(|state| predicate(state.as_ref()))
            .await
            .map_err(|_| StoreError::Closed)?;
        Ok(state.clone())
    }

    fn issue_subscription_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed))
    }
}

/// The single task which owns the store state, the reducer, the
/// middleware chain and the observers.
struct Lane<State, Action> {
    reducer: Box<dyn Reducer<State, Action>>,
    middleware: Vec<Arc<dyn Middleware<State, Action>>>,
    state: Arc<State>,
    observers: ObserverRegistry<State>,
    commands: mpsc::UnboundedReceiver<Command<State, Action>>,
    dispatcher: Dispatcher<State, Action>,
    published: watch::Sender<Arc<State>>,
}

impl<State, Action> Lane<State, Action>
where
    State: PartialEq + Send + Sync + 'static,
    Action: Send + 'static,
{
    async fn run(mut self) {
        log::debug!(
            "store lane started with {} middleware",
            self.middleware.len()
        );

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Dispatch(action) => self.run_chain(0, action),
                Command::Resume { position, action } => self.run_chain(position, action),
                Command::Subscribe { id, observer } => {
                    self.observers.insert(id, observer, self.state.clone());
                }
                Command::Unsubscribe(id) => {
                    if !self.observers.remove(id) {
                        log::debug!("observer {} was already removed", id);
                    }
                }
            }
        }

        log::debug!(
            "store lane stopped with {} observers registered",
            self.observers.len()
        );
    }

    /// Execute the middleware at `position` and every middleware after
    /// it, until all middleware has been invoked, at which point the
    /// action is sent to the reducer.
    fn run_chain(&mut self, position: usize, action: Action) {
        let middleware = match self.middleware.get(position) {
            Some(middleware) => middleware.clone(),
            None => return self.commit(action),
        };

        let next = Next::new(position + 1, self.dispatcher.clone());
        middleware.process(action, &self.state, next.clone());

        for action in next.detach() {
            self.run_chain(position + 1, action);
        }
    }

    fn commit(&mut self, action: Action) {
        let next_state = self.reducer.reduce(&self.state, &action);
        if Arc::ptr_eq(&next_state, &self.state) || *next_state == *self.state {
            return;
        }

        self.state = next_state;
        self.published.send_replace(self.state.clone());
        self.observers.notify(&self.state);
    }
}
