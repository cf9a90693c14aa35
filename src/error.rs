use thiserror::Error;

/// Errors produced by a [Store](crate::Store) handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Every [Store](crate::Store) handle has been dropped and the
    /// lane which owned the state has stopped.
    #[error("store lane is closed")]
    Closed,
}
