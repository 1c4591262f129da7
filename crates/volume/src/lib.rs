//! Core domain for the Nomad CSI volume client.
//!
//! This crate contains the identifiers, pass-through value types, and error
//! type shared by every other crate in the workspace, plus the [`Requester`]
//! port that the volume façade calls through. Infrastructure crates implement
//! the port; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies. It
//! defines *what* a request to the orchestrator looks like; the `transport`
//! crate defines *how* it is sent.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`VolumeId`, `Namespace`) |
//! | [`types`] | Request and payload values (`ApiRequest`, `VolumeConfig`, `VolumeStatus`) |
//! | [`errors`] | [`RequestError`], the failure type every requester returns |
//! | [`ports`] | The [`Requester`] trait |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::RequestError;
pub use identifiers::{Namespace, VolumeId};
pub use ports::Requester;
pub use types::{ApiRequest, Method, VolumeConfig, VolumeStatus};
