pub mod seat;
pub mod schedule;

pub use seat::{HolderId, SeatId, SeatStatus, SeatView, Snapshot};
pub use schedule::{ExpiryCallback, Scheduler, TimerHandle, TokioScheduler};

/// Caller-facing outcomes of a seat operation.
///
/// None of these are internal faults: each one tells the caller which rule
/// rejected the attempt, and the caller decides whether to retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatError {
    #[error("Seat not found: {0}")]
    NotFound(String),
    #[error("Seat {0} is already booked")]
    AlreadyBooked(SeatId),
    #[error("Seat {0} is already locked")]
    AlreadyLocked(SeatId),
    #[error("Seat {0} is not locked")]
    NotLocked(SeatId),
    #[error("Seat {0} is locked by another holder")]
    NotLockOwner(SeatId),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SeatError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SeatError::NotFound(_) => "not_found",
            SeatError::AlreadyBooked(_) => "already_booked",
            SeatError::AlreadyLocked(_) => "already_locked",
            SeatError::NotLocked(_) => "not_locked",
            SeatError::NotLockOwner(_) => "not_lock_owner",
            SeatError::InvalidInput(_) => "invalid_input",
        }
    }
}

pub type SeatResult<T> = Result<T, SeatError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Scheduler unavailable: {0}")]
    SchedulerUnavailable(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
