//! Nomad CSI volume façade.
//!
//! [`VolumeClient`] exposes the volume endpoints as typed async methods and
//! implements the one piece of behaviour the API does not provide itself:
//! waiting, after a create, until the orchestrator reports the volume as
//! schedulable.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** The façade sequences calls through the
//! [`volume::Requester`] port and contains no transport code. The `transport`
//! crate supplies the HTTP implementation.
//!
//! ## Waiting
//!
//! The wait is a fixed-interval poll (2 s by default) bounded by
//! [`WaitPolicy::max_attempts`] and abandonable through a [`CancelSignal`].
//! There is no back-off and no retry of failed status reads: the first error
//! ends the wait.

pub mod errors;
pub mod facade;
pub mod wait;

#[cfg(test)]
mod testing;

pub use errors::VolumeError;
pub use facade::{CreateOptions, ListFilter, VolumeClient, VolumeWrite};
pub use wait::{cancel_pair, CancelHandle, CancelSignal, WaitId, WaitPolicy};
