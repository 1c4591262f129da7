//! Nomad HTTP transport.
//!
//! Implements the [`volume::Requester`] trait with [`reqwest`]. Everything
//! connection-wide lives here: address resolution, the `/v1/` prefix,
//! percent-encoding of path segments, the `X-Nomad-Token` header, default
//! namespace and region parameters, timeouts, TLS verification, and the
//! mapping of HTTP status codes onto [`volume::RequestError`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The `client` crate sees only [`volume::Requester`].

pub mod config;
pub mod requester;

pub use config::{ConfigError, NomadConfig};
pub use requester::HttpRequester;
