use thiserror::Error;

/// Message shared by every outcome that must look like a plain failed login.
pub const GENERIC_FAILURE: &str = "Login failed. Please try again.";

/// Outcome of a rejected login attempt.
///
/// `Failure` and `Wiped` render identically so the duress path cannot be
/// told apart from a wrong passphrase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Username required, passphrase min {min_len} characters")]
    Validation { min_len: usize },

    #[error("Too many failed attempts. Try again in {remaining_secs}s")]
    LockedOut { remaining_secs: u64 },

    #[error("{msg}", msg = GENERIC_FAILURE)]
    Failure,

    #[error("{msg}", msg = GENERIC_FAILURE)]
    Wiped,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Store serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Credential digest error: {0}")]
    Digest(String),

    #[error("Credentials rejected")]
    Rejected,

    #[error("No active session")]
    NotLoggedIn,

    #[error("Friend name required")]
    EmptyFriendName,

    #[error("Invalid key chord: {0}")]
    InvalidChord(String),
}

pub type GuardResult<T> = Result<T, GuardError>;
