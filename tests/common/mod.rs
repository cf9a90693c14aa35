//! Shared test utilities: scripted collaborators for the loan store.

#![allow(dead_code, unused_imports)]

pub mod mock_endpoint;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::StreamExt;
use loan_store::loan::{
    loan_store, ConnectivitySignal, InputStore, LastInput, LoanAction, LoanConfig, LoanError,
    LoanMiddleware, LoanState, LoanStore, LoanTransport, MemoryInputStore, PersistError,
    ProcessState,
};
use loan_store::StateStream;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 18).unwrap()
}

pub fn response_body(id: u64) -> Result<Vec<u8>, LoanError> {
    Ok(format!(r#"{{"id": {}}}"#, id).into_bytes())
}

pub fn transport_failure(message: &str) -> Result<Vec<u8>, LoanError> {
    Err(LoanError::TransportFailure(message.to_string()))
}

/// A [LoanTransport] which answers from a script, then with `fallback`
/// once the script is exhausted, and records every request body.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Vec<u8>, LoanError>>>,
    fallback: Result<Vec<u8>, LoanError>,
    requests: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTransport {
    pub fn new(
        script: Vec<Result<Vec<u8>, LoanError>>,
        fallback: Result<Vec<u8>, LoanError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn always(result: Result<Vec<u8>, LoanError>) -> Arc<Self> {
        Self::new(Vec::new(), result)
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests
            .lock()
            .iter()
            .map(|body| serde_json::from_slice(body).unwrap())
            .collect()
    }
}

#[async_trait]
impl LoanTransport for ScriptedTransport {
    async fn post(&self, body: Vec<u8>) -> Result<Vec<u8>, LoanError> {
        self.requests.lock().push(body);
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// An [InputStore] whose writes always fail.
pub struct BrokenInputStore;

impl InputStore for BrokenInputStore {
    fn save_last_input(&self, _input: LastInput) -> Result<(), PersistError> {
        Err(PersistError::Io(std::io::Error::other("disk full")))
    }

    fn load_last_input(&self) -> Result<Option<LastInput>, PersistError> {
        Ok(None)
    }
}

pub struct Harness {
    pub store: LoanStore,
    pub signal: ConnectivitySignal,
    pub inputs: Arc<MemoryInputStore>,
}

pub fn harness(transport: Arc<dyn LoanTransport>) -> Harness {
    harness_with(&LoanConfig::default(), transport)
}

pub fn harness_with(config: &LoanConfig, transport: Arc<dyn LoanTransport>) -> Harness {
    let signal = ConnectivitySignal::new();
    let inputs = Arc::new(MemoryInputStore::new());
    let middleware = LoanMiddleware::new(
        config,
        transport,
        Arc::new(signal.clone()),
        inputs.clone(),
    )
    .with_today(today);

    Harness {
        store: loan_store(config, middleware),
        signal,
        inputs,
    }
}

/// Collect the process states seen by `states` up to and including the
/// first terminal one.
pub async fn process_states_until_terminal(states: &mut StateStream<LoanState>) -> Vec<ProcessState> {
    let mut seen = Vec::new();
    while let Some(state) = states.next().await {
        let process_state = state.loan.process_state.clone();
        let terminal = process_state.is_terminal();
        seen.push(process_state);
        if terminal {
            break;
        }
    }
    seen
}
