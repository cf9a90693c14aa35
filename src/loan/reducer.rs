use super::{LoanAction, LoanBounds, LoanState, ProcessState};
use crate::Reducer;
use std::sync::Arc;

/// Applies [LoanAction]s to [LoanState].
///
/// Amounts arrive already validated by
/// [LoanMiddleware](super::LoanMiddleware); durations are snapped to
/// the nearest valid step here so the committed state always holds a
/// valid duration.
#[derive(Debug, Clone, Default)]
pub struct LoanReducer {
    bounds: LoanBounds,
}

impl LoanReducer {
    pub fn new(bounds: LoanBounds) -> Self {
        LoanReducer { bounds }
    }
}

impl Reducer<LoanState, LoanAction> for LoanReducer {
    fn reduce(&self, prev_state: &Arc<LoanState>, action: &LoanAction) -> Arc<LoanState> {
        let mut state = LoanState::clone(prev_state);

        match action {
            LoanAction::UpdateAmount(amount) => {
                state.loan.amount = *amount;
                state.is_incorrect_amount = false;
            }
            LoanAction::UpdateDuration(days) => {
                state.loan.duration = self.bounds.snap_duration(*days);
            }
            LoanAction::StartProcessing(_) | LoanAction::SendLoan(_) => {
                state.loan.process_state = ProcessState::Processing;
            }
            LoanAction::SubmitRetrying { attempt } => {
                state.loan.process_state = ProcessState::Retrying(*attempt);
            }
            LoanAction::SubmitSucceeded(_) => {
                state.loan.process_state = ProcessState::Succeeded;
            }
            LoanAction::SubmitFailed(error) => {
                state.loan.process_state = ProcessState::Failed(error.clone());
            }
            LoanAction::Reset => {
                state.loan.process_state = ProcessState::Idle;
                state.is_incorrect_amount = false;
            }
            LoanAction::CheckConnectivity => return prev_state.clone(),
            LoanAction::ConnectivityLost => {
                state.is_internet_available = Some(false);
                state.notify_on_restore_internet_connection = Some(true);
            }
            LoanAction::ConnectivityRestored => {
                state.is_internet_available = Some(true);
            }
            LoanAction::ClearConnectivityNotice => {
                state.notify_on_restore_internet_connection = None;
            }
            LoanAction::AmountOutOfRange => {
                state.is_incorrect_amount = true;
            }
        }

        Arc::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{Loan, LoanError, LoanId, LoanResponse};

    fn initial() -> Arc<LoanState> {
        Arc::new(LoanState::new(Loan::new(10_000.0, 14, 15.0)))
    }

    fn reduce_all(actions: &[LoanAction]) -> Arc<LoanState> {
        let reducer = LoanReducer::default();
        actions
            .iter()
            .fold(initial(), |state, action| reducer.reduce(&state, action))
    }

    #[test]
    fn amount_update_clears_rejection() {
        let state = reduce_all(&[LoanAction::AmountOutOfRange, LoanAction::UpdateAmount(20_000.0)]);
        assert_eq!(state.loan.amount, 20_000.0);
        assert!(!state.is_incorrect_amount);
    }

    #[test]
    fn rejected_amount_keeps_previous_value() {
        let state = reduce_all(&[LoanAction::AmountOutOfRange]);
        assert_eq!(state.loan.amount, 10_000.0);
        assert!(state.is_incorrect_amount);
    }

    #[test]
    fn duration_is_snapped() {
        let state = reduce_all(&[LoanAction::UpdateDuration(22)]);
        assert_eq!(state.loan.duration, 21);
    }

    #[test]
    fn huge_duration_is_clamped() {
        let state = reduce_all(&[LoanAction::UpdateDuration(u32::MAX)]);
        assert_eq!(state.loan.duration, 28);
    }

    #[test]
    fn submission_lifecycle() {
        let loan = initial().loan.clone();
        let state = reduce_all(&[LoanAction::SendLoan(loan.clone())]);
        assert_eq!(state.loan.process_state, ProcessState::Processing);

        let state = reduce_all(&[
            LoanAction::SendLoan(loan.clone()),
            LoanAction::SubmitRetrying { attempt: 2 },
        ]);
        assert_eq!(state.loan.process_state, ProcessState::Retrying(2));

        let state = reduce_all(&[
            LoanAction::SendLoan(loan.clone()),
            LoanAction::SubmitSucceeded(LoanResponse::new(LoanId::Number(101))),
        ]);
        assert_eq!(state.loan.process_state, ProcessState::Succeeded);

        let error = LoanError::TransportFailure("status 500".to_string());
        let state = reduce_all(&[
            LoanAction::SendLoan(loan),
            LoanAction::SubmitFailed(error.clone()),
        ]);
        assert_eq!(state.loan.process_state, ProcessState::Failed(error));
    }

    #[test]
    fn submission_does_not_touch_inputs() {
        let mut submitted = initial().loan.clone();
        submitted.amount = f64::NAN;
        submitted.duration = 3;

        let state = reduce_all(&[LoanAction::StartProcessing(submitted)]);
        assert_eq!(state.loan.amount, 10_000.0);
        assert_eq!(state.loan.duration, 14);
    }

    #[test]
    fn reset_is_idempotent() {
        let failed = LoanAction::SubmitFailed(LoanError::Undefined);
        let once = reduce_all(&[failed.clone(), LoanAction::Reset]);
        let twice = reduce_all(&[failed, LoanAction::Reset, LoanAction::Reset]);
        assert_eq!(once.loan.process_state, ProcessState::Idle);
        assert_eq!(once, twice);
    }

    #[test]
    fn check_connectivity_is_a_no_op() {
        let reducer = LoanReducer::default();
        let state = initial();
        let next = reducer.reduce(&state, &LoanAction::CheckConnectivity);
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn connectivity_notice() {
        let state = reduce_all(&[LoanAction::ConnectivityLost]);
        assert_eq!(state.is_internet_available, Some(false));
        assert_eq!(state.notify_on_restore_internet_connection, Some(true));

        let state = reduce_all(&[LoanAction::ConnectivityLost, LoanAction::ConnectivityRestored]);
        assert_eq!(state.is_internet_available, Some(true));
        assert_eq!(state.notify_on_restore_internet_connection, Some(true));

        let state = reduce_all(&[
            LoanAction::ConnectivityLost,
            LoanAction::ConnectivityRestored,
            LoanAction::ClearConnectivityNotice,
        ]);
        assert_eq!(state.notify_on_restore_internet_connection, None);

        let state = reduce_all(&[LoanAction::ConnectivityRestored]);
        assert_eq!(state.is_internet_available, Some(true));
        assert_eq!(state.notify_on_restore_internet_connection, None);
    }
}
