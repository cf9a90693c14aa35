use super::{Loan, LoanError, LoanResponse};

/// Everything that can happen to the loan form.
#[derive(Debug, Clone, PartialEq)]
pub enum LoanAction {
    UpdateAmount(f64),
    /// Days.
    UpdateDuration(u32),
    /// The user confirmed the form; the inputs are remembered.
    StartProcessing(Loan),
    /// Submit the loan to the remote endpoint.
    SendLoan(Loan),
    /// A submission attempt failed and retry number `attempt` is
    /// scheduled.
    SubmitRetrying { attempt: u32 },
    SubmitSucceeded(LoanResponse),
    SubmitFailed(LoanError),
    /// Acknowledge a finished submission.
    Reset,
    /// Start following the connectivity of the device.
    CheckConnectivity,
    ConnectivityLost,
    ConnectivityRestored,
    ClearConnectivityNotice,
    /// An amount update was rejected.
    AmountOutOfRange,
}
