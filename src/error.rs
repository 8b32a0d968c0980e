// error.rs

use nix::errno::Errno;
use thiserror::Error;

/// Failures of the recall grammar and the `history` listing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("No commands in history!")]
    Empty,
    /// Carries the 1-based number the user typed.
    #[error("There is no command numbered {0} in the history.")]
    InvalidIndex(i64),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("fork failed: {0}")]
    Fork(#[source] Errno),
    #[error("waiting for process {pid} failed: {source}")]
    Wait { pid: i32, source: Errno },
    #[error("argument contains a NUL byte: {0}")]
    Nul(#[from] std::ffi::NulError),
}

impl DispatchError {
    /// A failed fork takes the whole interpreter down; everything else is
    /// reported and the loop carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DispatchError::Fork(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}
