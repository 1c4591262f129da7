//! Connection settings for the orchestrator's HTTP API.
//!
//! Environment variables (the same ones the `nomad` CLI reads):
//! - `NOMAD_ADDR`: base address, defaults to `http://127.0.0.1:4646`.
//! - `NOMAD_TOKEN`: ACL token, sent as `X-Nomad-Token`.
//! - `NOMAD_NAMESPACE`: namespace applied to requests that do not set one.
//! - `NOMAD_REGION`: region applied to every request.
//! - `NOMAD_CLIENT_TIMEOUT`: per-request timeout in whole seconds, defaults to `5`.
//! - `NOMAD_SKIP_VERIFY`: `1` or `true` disables TLS certificate verification.

use std::time::Duration;

use thiserror::Error;
use volume::Namespace;

/// A malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for {variable}: '{value}' ({reason})")]
pub struct ConfigError {
    /// Variable or setting name.
    pub variable: String,
    /// Value as supplied.
    pub value: String,
    /// What was expected.
    pub reason: &'static str,
}

/// Connection settings for [`crate::HttpRequester`].
#[derive(Clone, PartialEq, Eq)]
pub struct NomadConfig {
    /// Base address, e.g. `https://nomad.example.com:4646`. May carry a path
    /// prefix when the API sits behind a reverse proxy.
    pub address: String,
    /// ACL token.
    pub token: Option<String>,
    /// Namespace applied to requests that do not set one themselves.
    pub namespace: Option<Namespace>,
    /// Region applied to every request.
    pub region: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether to verify the server's TLS certificate.
    pub verify_tls: bool,
}

impl NomadConfig {
    /// Address used when none is configured.
    pub const DEFAULT_ADDRESS: &'static str = "http://127.0.0.1:4646";

    /// Per-request timeout used when none is configured.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(address) = var("NOMAD_ADDR") {
            config.address = address;
        }
        config.token = var("NOMAD_TOKEN");
        config.namespace = var("NOMAD_NAMESPACE").and_then(Namespace::new);
        config.region = var("NOMAD_REGION");

        if let Some(raw) = var("NOMAD_CLIENT_TIMEOUT") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError {
                variable: "NOMAD_CLIENT_TIMEOUT".into(),
                value: raw.clone(),
                reason: "expected a whole number of seconds",
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = var("NOMAD_SKIP_VERIFY") {
            config.verify_tls = !parse_flag("NOMAD_SKIP_VERIFY", &raw)?;
        }

        Ok(config)
    }

    /// Replaces the base address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets the ACL token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the default namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// Sets the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }
}

impl Default for NomadConfig {
    fn default() -> Self {
        Self {
            address: Self::DEFAULT_ADDRESS.to_string(),
            token: None,
            namespace: None,
            region: None,
            timeout: Self::DEFAULT_TIMEOUT,
            verify_tls: true,
        }
    }
}

// The token must never reach logs.
impl std::fmt::Debug for NomadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NomadConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("namespace", &self.namespace)
            .field("region", &self.region)
            .field("timeout", &self.timeout)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

fn parse_flag(variable: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError {
            variable: variable.to_string(),
            value: raw.to_string(),
            reason: "expected 1/0 or true/false",
        }),
    }
}
