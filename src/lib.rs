//! A serialized application state store (similar to redux), with
//! middleware that may work asynchronously, and the loan calculator
//! state machine built on top of it in [loan].

mod error;
mod listener;
pub mod loan;
pub mod middleware;
mod reducer;
mod store;

pub use error::StoreError;
pub use listener::{Observer, ObserverStatus, StateStream, SubscriptionId};
pub use reducer::*;
pub use store::{Dispatcher, Store, StoreBuilder, Subscription};
