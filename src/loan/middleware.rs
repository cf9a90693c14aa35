use super::{
    ConnectivityMonitor, InputStore, LastInput, LoanAction, LoanBounds, LoanConfig, LoanError,
    LoanRequest, LoanResponse, LoanState, LoanTransport,
};
use crate::{
    middleware::{Middleware, Next},
    Dispatcher,
};
use chrono::{Local, NaiveDate};
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

/// How often, and how patiently, a failed submission is attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// The side effects of the loan form: amount validation, remembering
/// the last inputs, submission with bounded retry, and following the
/// device connectivity.
pub struct LoanMiddleware {
    bounds: LoanBounds,
    retry: RetryPolicy,
    transport: Arc<dyn LoanTransport>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    inputs: Arc<dyn InputStore>,
    today: Today,
    probe: Mutex<Option<JoinHandle<()>>>,
}

impl LoanMiddleware {
    pub fn new(
        config: &LoanConfig,
        transport: Arc<dyn LoanTransport>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        inputs: Arc<dyn InputStore>,
    ) -> Self {
        LoanMiddleware {
            bounds: config.bounds,
            retry: config.retry_policy(),
            transport,
            connectivity,
            inputs,
            today: Arc::new(|| Local::now().date_naive()),
            probe: Mutex::new(None),
        }
    }

    /// Use `today` instead of the local calendar date when computing
    /// the repayment of a submitted loan.
    pub fn with_today<F>(mut self, today: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.today = Arc::new(today);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn remember_inputs(&self, amount: f64, duration: u32) {
        let input = LastInput { amount, duration };
        if let Err(e) = self.inputs.save_last_input(input) {
            log::warn!("failed to remember last loan inputs: {}", e);
        }
    }

    fn start_probe(&self, dispatcher: Dispatcher<LoanState, LoanAction>) {
        let mut readings = self.connectivity.monitor();
        let handle = tokio::spawn(async move {
            while let Some(available) = readings.next().await {
                let action = if available {
                    LoanAction::ConnectivityRestored
                } else {
                    LoanAction::ConnectivityLost
                };
                if dispatcher.dispatch(action).is_err() {
                    break;
                }
            }
            log::debug!("connectivity probe stopped");
        });

        if let Some(previous) = self.probe.lock().replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for LoanMiddleware {
    fn drop(&mut self) {
        if let Some(probe) = self.probe.get_mut().take() {
            probe.abort();
        }
    }
}

impl Middleware<LoanState, LoanAction> for LoanMiddleware {
    fn process(
        &self,
        action: LoanAction,
        _state: &Arc<LoanState>,
        next: Next<LoanState, LoanAction>,
    ) {
        match action {
            LoanAction::UpdateAmount(amount) if !self.bounds.contains_amount(amount) => {
                log::debug!("rejecting amount {}", amount);
                next.run(LoanAction::AmountOutOfRange);
            }
            LoanAction::StartProcessing(loan) => {
                self.remember_inputs(loan.amount, loan.duration);
                next.run(LoanAction::StartProcessing(loan));
            }
            LoanAction::SendLoan(loan) => {
                let request = LoanRequest::from_loan(&loan, (self.today)());
                let dispatcher = next.dispatcher().clone();
                next.run(LoanAction::SendLoan(loan));

                tokio::spawn(submit(
                    request,
                    self.transport.clone(),
                    self.retry,
                    dispatcher,
                ));
            }
            LoanAction::CheckConnectivity => {
                self.start_probe(next.dispatcher().clone());
                next.run(LoanAction::CheckConnectivity);
            }
            action => next.run(action),
        }
    }
}

/// Post `request`, retrying retryable failures, and dispatch the
/// outcome.
async fn submit(
    request: LoanRequest,
    transport: Arc<dyn LoanTransport>,
    retry: RetryPolicy,
    dispatcher: Dispatcher<LoanState, LoanAction>,
) {
    let outcome = match request.encode() {
        Ok(body) => post_with_retry(body, transport.as_ref(), retry, &dispatcher).await,
        Err(e) => Err(e),
    };

    let action = match outcome {
        Ok(response) => {
            log::info!("loan submitted as {:?}", response.id);
            LoanAction::SubmitSucceeded(response)
        }
        Err(e) => {
            log::warn!("loan submission failed: {}", e);
            LoanAction::SubmitFailed(e)
        }
    };
    if dispatcher.dispatch(action).is_err() {
        log::debug!("store closed before the submission finished");
    }
}

async fn post_with_retry(
    body: Vec<u8>,
    transport: &dyn LoanTransport,
    retry: RetryPolicy,
    dispatcher: &Dispatcher<LoanState, LoanAction>,
) -> Result<LoanResponse, LoanError> {
    let mut attempt = 0;
    loop {
        let result = match transport.post(body.clone()).await {
            Ok(response) => LoanResponse::decode(&response),
            Err(e) => Err(e),
        };

        match result {
            Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                attempt += 1;
                log::warn!(
                    "loan submission failed ({}), retry {}/{} in {:?}",
                    e,
                    attempt,
                    retry.max_retries,
                    retry.backoff
                );
                if dispatcher
                    .dispatch(LoanAction::SubmitRetrying { attempt })
                    .is_err()
                {
                    log::debug!("store closed while retrying a submission");
                }
                tokio::time::sleep(retry.backoff).await;
            }
            result => return result,
        }
    }
}
