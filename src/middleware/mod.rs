//! [Middleware] used to observe, transform, suppress or delay actions
//! on their way to the [Reducer](crate::Reducer) of a [Store](crate::Store).
//! This module also contains a simple logging middleware which can be
//! used as a utility in an application.

pub mod simple_logger;

use crate::store::{Command, Dispatcher};
use parking_lot::Mutex;
use std::sync::Arc;

/// `Middleware` used to modify the behaviour of a [Store](crate::Store)
/// during a [Store::dispatch()](crate::Store::dispatch()).
///
/// Middleware is composed into a chain in the order it was added to the
/// [StoreBuilder](crate::StoreBuilder): the first middleware added is
/// the first to see each action, and the reducer only runs once every
/// middleware in the chain has passed the action along.
pub trait Middleware<State, Action>: Send + Sync {
    /// This method is invoked by the store lane for every dispatched
    /// `Action`, with a read-only snapshot of the current `state`.
    ///
    /// Calling [Next::run()] hands the action (or a replacement) to
    /// the rest of the chain and finally the reducer. Not calling it
    /// suppresses the action. `next` may also be moved into a spawned
    /// task and called later, in which case the action re-enters the
    /// store lane behind everything already queued.
    fn process(&self, action: Action, state: &Arc<State>, next: Next<State, Action>);
}

enum NextSlot<Action> {
    /// [Middleware::process()] is still running: forwarded actions are
    /// collected and continue down the chain as soon as it returns.
    Inline(Vec<Action>),
    /// [Middleware::process()] has returned: forwarded actions are
    /// sent back through the store lane.
    Detached,
}

/// The continuation of the middleware chain, handed to
/// [Middleware::process()].
pub struct Next<State, Action> {
    position: usize,
    slot: Arc<Mutex<NextSlot<Action>>>,
    dispatcher: Dispatcher<State, Action>,
}

impl<State, Action> Clone for Next<State, Action> {
    fn clone(&self) -> Self {
        Next {
            position: self.position,
            slot: self.slot.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<State, Action> Next<State, Action> {
    pub(crate) fn new(position: usize, dispatcher: Dispatcher<State, Action>) -> Self {
        Next {
            position,
            slot: Arc::new(Mutex::new(NextSlot::Inline(Vec::new()))),
            dispatcher,
        }
    }

    /// Pass `action` to the rest of the chain. May be called more than
    /// once to fan an action out.
    pub fn run(&self, action: Action) {
        let mut slot = self.slot.lock();
        match &mut *slot {
            NextSlot::Inline(pending) => pending.push(action),
            NextSlot::Detached => {
                drop(slot);
                let resumed = self.dispatcher.send(Command::Resume {
                    position: self.position,
                    action,
                });
                if resumed.is_err() {
                    log::debug!("store closed, dropping action resumed by middleware");
                }
            }
        }
    }

    /// A handle for dispatching follow-up actions from the start of the
    /// middleware chain.
    pub fn dispatcher(&self) -> &Dispatcher<State, Action> {
        &self.dispatcher
    }

    /// Take the actions forwarded while [Middleware::process()] was
    /// running; later calls to [Next::run()] go through the store lane.
    pub(crate) fn detach(&self) -> Vec<Action> {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, NextSlot::Detached) {
            NextSlot::Inline(pending) => pending,
            NextSlot::Detached => Vec::new(),
        }
    }
}
