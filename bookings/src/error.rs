//! Errors returned by the booking store facade.

use crate::backend::BackendError;
use kinxplore_runtime::StoreError;
use thiserror::Error;

/// Result alias for facade operations
pub type Result<T> = std::result::Result<T, BookingError>;

/// Why a store operation did not complete
#[derive(Error, Debug)]
pub enum BookingError {
    /// The backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The runtime could not deliver a response (shutdown, timeout)
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    /// The backend failure, if that is what this is
    #[must_use]
    pub const fn backend(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(error) => Some(error),
            Self::Store(_) => None,
        }
    }
}
