//! Errors produced by the volume façade.

use thiserror::Error;
use volume::{RequestError, VolumeId};

/// Failure of a volume operation.
///
/// Transport and status failures pass through unchanged as
/// [`VolumeError::Request`]; the remaining variants come from the
/// wait-until-schedulable loop.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// The underlying request failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The volume was written but did not become schedulable within the
    /// wait policy's attempt budget.
    #[error("Volume '{id}' still not schedulable after {attempts} status checks")]
    NotSchedulable {
        /// Volume being waited on.
        id: VolumeId,
        /// Status reads performed.
        attempts: u32,
    },

    /// The caller cancelled the wait.
    ///
    /// The volume itself was written; only the wait was abandoned.
    #[error("Wait for volume '{id}' cancelled after {attempts} status checks")]
    WaitCancelled {
        /// Volume being waited on.
        id: VolumeId,
        /// Status reads performed before cancellation.
        attempts: u32,
    },
}

impl VolumeError {
    /// Returns the underlying request error, if this is one.
    pub fn as_request(&self) -> Option<&RequestError> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }
}
