//! Request-level error type.
//!
//! [`RequestError`] is what every [`crate::Requester`] implementation returns.
//! Its variants follow the status-code classes the orchestrator uses, so a
//! caller can tell "the volume does not exist" apart from "the token lacks the
//! required capability" without parsing response bodies.
//!
//! Errors raised by the volume façade itself (poll budget exhausted, wait
//! cancelled) live in the `client` crate and wrap this type.

use thiserror::Error;

/// Failure of a single call against the orchestrator's API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// The server rejected the request as malformed (HTTP 400).
    #[error("Bad request: {body}")]
    BadRequest {
        /// Response body, as returned by the server.
        body: String,
    },

    /// The ACL token is missing or lacks the required capability (HTTP 403).
    #[error("Permission denied: {body}")]
    Forbidden {
        /// Response body, as returned by the server.
        body: String,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found: {url}")]
    NotFound {
        /// URL that produced the 404.
        url: String,
    },

    /// Any other non-success status.
    #[error("Orchestrator returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the server.
        body: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Connection, TLS, or other transport-level failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },

    /// The response body was not valid JSON.
    #[error("Could not decode response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// The caller supplied parameters the request could not be built from
    /// (e.g. an unparseable server address).
    #[error("Invalid parameters: {message}")]
    InvalidParameters {
        /// Description of the problem.
        message: String,
    },
}

impl RequestError {
    /// Classifies a non-success HTTP status into the matching variant.
    ///
    /// `url` is only kept for 404s; the other classes carry the body.
    pub fn from_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        match status {
            400 => Self::BadRequest { body: body.into() },
            403 => Self::Forbidden { body: body.into() },
            404 => Self::NotFound { url: url.into() },
            _ => Self::Api {
                status,
                body: body.into(),
            },
        }
    }

    /// Returns `true` for [`RequestError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert_eq!(
            RequestError::from_status(400, "u", "missing ID"),
            RequestError::BadRequest {
                body: "missing ID".into()
            }
        );
        assert_eq!(
            RequestError::from_status(403, "u", "Permission denied"),
            RequestError::Forbidden {
                body: "Permission denied".into()
            }
        );
        assert!(RequestError::from_status(404, "http://h/v1/volume/csi/x", "").is_not_found());
        assert_eq!(
            RequestError::from_status(500, "u", "rpc error"),
            RequestError::Api {
                status: 500,
                body: "rpc error".into()
            }
        );
    }

    #[test]
    fn not_found_message_names_the_url() {
        let err = RequestError::from_status(404, "http://h/v1/volume/csi/x", "ignored");
        assert_eq!(err.to_string(), "Not found: http://h/v1/volume/csi/x");
    }
}
