//! Subcommand execution.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use client::{cancel_pair, CreateOptions, ListFilter, VolumeClient, WaitPolicy};
use serde_json::Value;
use tracing::info;
use transport::{HttpRequester, NomadConfig};
use volume::{Namespace, Requester, VolumeConfig, VolumeId};

use crate::args::{Command, ConnectionArgs};

/// Builds the HTTP requester from the environment and connection flags.
pub fn requester(connection: &ConnectionArgs) -> anyhow::Result<HttpRequester> {
    let config = connection.apply(NomadConfig::from_env()?);
    info!(address = %config.address, "Connecting to Nomad");
    Ok(HttpRequester::new(config)?)
}

/// Runs `command` and returns the JSON document to print.
pub async fn run<R: Requester>(client: &VolumeClient<R>, command: Command) -> anyhow::Result<Value> {
    match command {
        Command::Create {
            id,
            config,
            policy_override,
            no_wait,
            interval_secs,
            max_attempts,
        } => {
            let id = volume_id(&id)?;
            let config = read_volume_config(&config)?;

            let mut options = CreateOptions::default().policy_override(policy_override);
            if no_wait {
                options = options.no_wait();
            } else {
                let policy = WaitPolicy::new(Duration::from_secs(interval_secs), max_attempts)
                    .context("--max-attempts must be at least 1")?;
                let (handle, signal) = cancel_pair();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        handle.cancel();
                    }
                });
                options = options.wait_with(policy).cancel_on(signal);
            }

            let written = client.create_or_update(&id, config, options).await?;
            Ok(written.polled.unwrap_or(written.response))
        }
        Command::Get { id, namespace } => {
            let namespace = namespace.map(namespace_arg).transpose()?;
            Ok(client.get(&volume_id(&id)?, namespace.as_ref()).await?)
        }
        Command::List {
            namespace,
            prefix,
            plugin_id,
            node_id,
        } => {
            let filter = ListFilter {
                namespace: namespace.map(namespace_arg).transpose()?,
                prefix,
                plugin_id,
                node_id,
            };
            Ok(client.list(&filter).await?)
        }
        Command::Register {
            id,
            config,
            policy_override,
        } => {
            let config = read_volume_config(&config)?;
            Ok(client
                .register(&volume_id(&id)?, config, policy_override)
                .await?)
        }
        Command::Deregister { id, force } => Ok(client.deregister(&volume_id(&id)?, force).await?),
        Command::Delete { id } => Ok(client.delete(&volume_id(&id)?).await?),
    }
}

fn volume_id(raw: &str) -> anyhow::Result<VolumeId> {
    VolumeId::new(raw).ok_or_else(|| anyhow!("invalid volume ID '{raw}'"))
}

fn namespace_arg(raw: String) -> anyhow::Result<Namespace> {
    Namespace::new(raw).ok_or_else(|| anyhow!("namespace must not be empty"))
}

/// Reads a JSON volume specification from `path`, or stdin for `-`.
fn read_volume_config(path: &Path) -> anyhow::Result<VolumeConfig> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading volume specification from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading volume specification {}", path.display()))?
    };
    parse_volume_config(&text)
}

fn parse_volume_config(text: &str) -> anyhow::Result<VolumeConfig> {
    let value: Value = serde_json::from_str(text).context("volume specification is not JSON")?;
    match VolumeConfig::from_value(value) {
        Some(config) => Ok(config),
        None => bail!("volume specification must be a JSON object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use client::VolumeError;
    use serde_json::json;
    use tempfile::NamedTempFile;
    use volume::{ApiRequest, Method, RequestError};

    /// Answers requests from a fixed script and remembers what was asked.
    struct Replay {
        script: Mutex<VecDeque<Value>>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl Replay {
        fn new(script: Vec<Value>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<ApiRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Requester for Replay {
        async fn request(&self, request: ApiRequest) -> Result<Value, RequestError> {
            self.seen.lock().unwrap().push(request);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| RequestError::Transport {
                    message: "script exhausted".into(),
                })
        }
    }

    fn spec_file(body: &Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{body}").unwrap();
        file
    }

    fn create(config: PathBuf, no_wait: bool, max_attempts: u32) -> Command {
        Command::Create {
            id: "db".into(),
            config,
            policy_override: false,
            no_wait,
            interval_secs: 0,
            max_attempts,
        }
    }

    #[tokio::test]
    async fn create_without_wait_prints_the_create_response() {
        let file = spec_file(&json!({"ID": "db", "PluginID": "ebs"}));
        let accepted = json!({"Volumes": [{"ID": "db", "Schedulable": false}]});
        let replay = Arc::new(Replay::new(vec![accepted.clone()]));
        let client = VolumeClient::new(Arc::clone(&replay));

        let output = run(&client, create(file.path().into(), true, 150))
            .await
            .unwrap();

        assert_eq!(output, accepted);
        let seen = replay.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::Put);
        assert_eq!(seen[0].path(), "volume/csi/db/create");
    }

    #[tokio::test]
    async fn create_with_wait_prints_the_schedulable_volume() {
        let file = spec_file(&json!({"ID": "db", "Namespace": "prod"}));
        let ready = json!({"ID": "db", "Namespace": "prod", "Schedulable": true});
        let replay = Arc::new(Replay::new(vec![
            json!({"Volumes": [{"ID": "db", "Namespace": "prod", "Schedulable": false}]}),
            json!({"ID": "db", "Namespace": "prod", "Schedulable": false}),
            ready.clone(),
        ]));
        let client = VolumeClient::new(Arc::clone(&replay));

        let output = run(&client, create(file.path().into(), false, 5))
            .await
            .unwrap();

        assert_eq!(output, ready);
        let seen = replay.seen();
        assert_eq!(seen.len(), 3);
        assert!(seen[1..]
            .iter()
            .all(|req| req.method == Method::Get && req.query_value("namespace") == Some("prod")));
    }

    #[tokio::test]
    async fn create_stops_after_max_attempts() {
        let file = spec_file(&json!({"ID": "db"}));
        let pending = json!({"ID": "db", "Schedulable": false});
        let replay = Arc::new(Replay::new(vec![
            json!({"Volumes": [pending.clone()]}),
            pending.clone(),
            pending,
        ]));
        let client = VolumeClient::new(Arc::clone(&replay));

        let err = run(&client, create(file.path().into(), false, 2))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<VolumeError>(),
            Some(VolumeError::NotSchedulable { attempts: 2, .. })
        ));
        assert_eq!(replay.seen().len(), 3);
    }

    #[tokio::test]
    async fn zero_max_attempts_is_rejected_before_any_request() {
        let file = spec_file(&json!({"ID": "db"}));
        let replay = Arc::new(Replay::new(Vec::new()));
        let client = VolumeClient::new(Arc::clone(&replay));

        let err = run(&client, create(file.path().into(), false, 0))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("--max-attempts"));
        assert!(replay.seen().is_empty());
    }

    #[tokio::test]
    async fn dot_volume_ids_are_rejected_before_any_request() {
        let replay = Arc::new(Replay::new(Vec::new()));
        let client = VolumeClient::new(Arc::clone(&replay));

        let err = run(
            &client,
            Command::Get {
                id: "..".into(),
                namespace: None,
            },
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("invalid volume ID"));
        assert!(replay.seen().is_empty());
    }

    #[test]
    fn volume_config_must_be_a_json_object() {
        let config = parse_volume_config(r#"{"ID": "db", "PluginID": "ebs"}"#).unwrap();
        assert_eq!(config.as_map()["PluginID"], "ebs");

        assert!(parse_volume_config("[]").is_err());
        assert!(parse_volume_config("id = \"db\"").is_err());
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(volume_id("").is_err());
        assert!(namespace_arg(String::new()).is_err());
        assert_eq!(volume_id("db").unwrap().as_str(), "db");
    }
}
