use super::Loan;

#[derive(Debug, Clone, PartialEq)]
pub struct LoanState {
    pub loan: Loan,
    /// `None` until the first connectivity reading.
    pub is_internet_available: Option<bool>,
    /// Set when the connection drops, so the UI can tell the user once
    /// it comes back. Cleared by
    /// [LoanAction::ClearConnectivityNotice](super::LoanAction::ClearConnectivityNotice).
    pub notify_on_restore_internet_connection: Option<bool>,
    /// Set when an amount update was rejected.
    pub is_incorrect_amount: bool,
}

impl LoanState {
    pub fn new(loan: Loan) -> Self {
        LoanState {
            loan,
            is_internet_available: None,
            notify_on_restore_internet_connection: None,
            is_incorrect_amount: false,
        }
    }

    /// Returns true while a submission is processing or retrying.
    pub fn is_submitting(&self) -> bool {
        self.loan.process_state.is_in_flight()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_submitting()
    }
}
