//! A loan calculator form built on the [Store](crate::Store): the user
//! picks an amount and a duration, sees the repayment, and submits the
//! loan to a remote endpoint, while the form follows the connectivity
//! of the device.
//!
//! ```no_run
//! use loan_store::loan::{
//!     loan_store, ConnectivitySignal, HttpTransport, LoanAction, LoanConfig, LoanMiddleware,
//!     MemoryInputStore,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LoanConfig::load("loan.toml")?;
//! let transport = HttpTransport::new(config.endpoint.clone(), config.request_timeout())?;
//! let middleware = LoanMiddleware::new(
//!     &config,
//!     Arc::new(transport),
//!     Arc::new(ConnectivitySignal::new()),
//!     Arc::new(MemoryInputStore::new()),
//! );
//!
//! let store = loan_store(&config, middleware);
//! store.dispatch(LoanAction::UpdateAmount(20_000.0));
//! store.dispatch(LoanAction::SendLoan(store.state().loan.clone()));
//! # Ok(())
//! # }
//! ```

mod action;
mod config;
mod connectivity;
mod error;
mod middleware;
mod model;
mod network;
mod persistence;
mod reducer;
mod state;

pub use action::LoanAction;
pub use config::{ConfigError, LoanConfig, DEFAULT_ENDPOINT};
pub use connectivity::{ConnectivityMonitor, ConnectivitySignal, ConnectivityStream};
pub use error::LoanError;
pub use middleware::{LoanMiddleware, RetryPolicy};
pub use model::{Loan, LoanBounds, ProcessState};
pub use network::{HttpTransport, LoanId, LoanRequest, LoanResponse, LoanTransport};
pub use persistence::{InputStore, JsonFileInputStore, LastInput, MemoryInputStore, PersistError};
pub use reducer::LoanReducer;
pub use state::LoanState;

use crate::{middleware::simple_logger::LoggerMiddleware, Store};

pub type LoanStore = Store<LoanState, LoanAction>;

/// Build the store of a loan form configured by `config`: every action
/// is logged, then handled by `middleware`, then reduced.
///
/// # Panics
///
/// Panics if called outside of a tokio runtime.
pub fn loan_store(config: &LoanConfig, middleware: LoanMiddleware) -> LoanStore {
    Store::builder(LoanReducer::new(config.bounds), config.initial_state())
        .middleware(LoggerMiddleware::new())
        .middleware(middleware)
        .build()
}
