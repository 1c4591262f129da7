//! Command-line arguments.
//!
//! Connection flags override the `NOMAD_*` environment variables read by
//! [`transport::NomadConfig::from_env`].

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use transport::NomadConfig;
use volume::Namespace;

#[derive(Debug, Parser)]
#[command(name = "nomad-volume", version, about = "Manage Nomad CSI volumes")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Log output format (written to stderr).
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint to export traces to.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", global = true)]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Agent address [default: $NOMAD_ADDR or http://127.0.0.1:4646].
    #[arg(long, global = true)]
    pub address: Option<String>,

    /// ACL token [default: $NOMAD_TOKEN].
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Namespace for requests that do not name one [default: $NOMAD_NAMESPACE].
    #[arg(long, global = true, value_parser = parse_namespace)]
    pub default_namespace: Option<Namespace>,

    /// Region [default: $NOMAD_REGION].
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Per-request timeout in seconds [default: $NOMAD_CLIENT_TIMEOUT or 5].
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Skip TLS certificate verification.
    #[arg(long, global = true)]
    pub skip_verify: bool,
}

impl ConnectionArgs {
    /// Applies the flags that were given on top of `base`.
    pub fn apply(&self, mut base: NomadConfig) -> NomadConfig {
        if let Some(address) = &self.address {
            base.address = address.clone();
        }
        if let Some(token) = &self.token {
            base.token = Some(token.clone());
        }
        if let Some(namespace) = &self.default_namespace {
            base.namespace = Some(namespace.clone());
        }
        if let Some(region) = &self.region {
            base.region = Some(region.clone());
        }
        if let Some(secs) = self.timeout_secs {
            base.timeout = Duration::from_secs(secs);
        }
        if self.skip_verify {
            base.verify_tls = false;
        }
        base
    }
}

fn parse_namespace(raw: &str) -> Result<Namespace, String> {
    Namespace::new(raw).ok_or_else(|| "namespace must not be empty".to_string())
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or update a CSI volume and wait until it is schedulable.
    Create {
        /// Volume ID.
        id: String,
        /// JSON volume specification file, or `-` for stdin.
        config: PathBuf,
        /// Ignore soft Sentinel policy failures.
        #[arg(long)]
        policy_override: bool,
        /// Return as soon as the create is accepted.
        #[arg(long)]
        no_wait: bool,
        /// Seconds between status checks.
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
        /// Status checks before giving up.
        #[arg(long, default_value_t = 150)]
        max_attempts: u32,
    },
    /// Read a CSI volume.
    Get {
        id: String,
        #[arg(long)]
        namespace: Option<String>,
    },
    /// List CSI volumes.
    List {
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        plugin_id: Option<String>,
        #[arg(long)]
        node_id: Option<String>,
    },
    /// Register an existing external volume.
    Register {
        id: String,
        /// JSON volume specification file, or `-` for stdin.
        config: PathBuf,
        #[arg(long)]
        policy_override: bool,
    },
    /// Deregister a volume, leaving the storage in place.
    Deregister {
        id: String,
        /// Detach from allocations still claiming the volume.
        #[arg(long)]
        force: bool,
    },
    /// Delete the storage behind a volume and deregister it.
    Delete { id: String },
}
