use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("lock {0} is not initialised")]
    NotInitialised(u64),
    #[error("lock {0} is closed")]
    Closed(u64),
    #[error("unlock {0} called by another holder")]
    OwnershipViolation(u64),
}
