use std::sync::Arc;

/// Using the [reduce()](Reducer::reduce()) method, implementors of
/// this trait take an `Action` submitted to a store via
/// [Store::dispatch()](crate::Store::dispatch()) and produce the next
/// `State` from the previous one.
///
/// A reducer is pure and total: it performs no side effects and cannot
/// fail. Validation happens upstream in
/// [Middleware](crate::middleware::Middleware), and side effects are
/// performed there as well.
pub trait Reducer<State, Action>: Send + 'static {
    /// Take an `Action` submitted to a store via
    /// [Store::dispatch()](crate::Store::dispatch()) and produce the
    /// next `State` from `prev_state`.
    ///
    /// Returning `prev_state` itself (or an equal state) signals that
    /// nothing changed, and store observers are not notified.
    fn reduce(&self, prev_state: &Arc<State>, action: &Action) -> Arc<State>;
}

impl<State, Action, F> Reducer<State, Action> for F
where
    F: Fn(&Arc<State>, &Action) -> Arc<State> + Send + 'static,
{
    fn reduce(&self, prev_state: &Arc<State>, action: &Action) -> Arc<State> {
        (self)(prev_state, action)
    }
}

/// A [Reducer] composed of multiple reducers, applied in order, each
/// one receiving the state produced by the previous.
pub struct CompositeReducer<State, Action> {
    reducers: Vec<Box<dyn Reducer<State, Action>>>,
}

impl<State, Action> CompositeReducer<State, Action> {
    /// Create a new [CompositeReducer].
    pub fn new(reducers: Vec<Box<dyn Reducer<State, Action>>>) -> Self {
        CompositeReducer { reducers }
    }
}

impl<State, Action> Reducer<State, Action> for CompositeReducer<State, Action>
where
    State: 'static,
    Action: 'static,
{
    fn reduce(&self, prev_state: &Arc<State>, action: &Action) -> Arc<State> {
        let mut state = prev_state.clone();

        for reducer in &self.reducers {
            state = reducer.reduce(&state, action);
        }

        state
    }
}
