//! The volume façade.
//!
//! [`VolumeClient`] turns volume operations into [`ApiRequest`]s against the
//! `volume` and `volumes` routes and hands them to a [`Requester`]. Responses
//! come back as undecorated JSON.

use serde_json::{json, Value};
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use volume::{
    ApiRequest, Method, Namespace, Requester, VolumeConfig, VolumeId, VolumeStatus,
};

use crate::errors::VolumeError;
use crate::wait::{CancelSignal, WaitId, WaitPolicy};

/// Base route for single-volume operations.
const VOLUME_ENDPOINT: &str = "volume";

/// Base route for volume listings.
const VOLUMES_ENDPOINT: &str = "volumes";

/// Volume type segment; only CSI volumes are handled.
const CSI: &str = "csi";

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Options for [`VolumeClient::create_or_update`].
///
/// The default matches the common case: no policy override, wait until
/// schedulable under [`WaitPolicy::default`], no cancellation.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    policy_override: bool,
    wait: Option<WaitPolicy>,
    cancel: Option<CancelSignal>,
}

impl CreateOptions {
    /// Sets `PolicyOverride`, which makes the server ignore soft Sentinel
    /// policy failures.
    #[must_use]
    pub fn policy_override(mut self, enabled: bool) -> Self {
        self.policy_override = enabled;
        self
    }

    /// Returns as soon as the write is acknowledged.
    #[must_use]
    pub fn no_wait(mut self) -> Self {
        self.wait = None;
        self
    }

    /// Waits for schedulability under `policy`.
    #[must_use]
    pub fn wait_with(mut self, policy: WaitPolicy) -> Self {
        self.wait = Some(policy);
        self
    }

    /// Abandons the wait when `signal` fires.
    #[must_use]
    pub fn cancel_on(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            policy_override: false,
            wait: Some(WaitPolicy::default()),
            cancel: None,
        }
    }
}

/// Outcome of [`VolumeClient::create_or_update`].
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeWrite {
    /// Decoded response to the create request.
    pub response: Value,
    /// Last status read by the schedulability poll.
    ///
    /// `None` when waiting was disabled or the create response already
    /// reported the volume as schedulable.
    pub polled: Option<Value>,
}

/// Filters for [`VolumeClient::list`]. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Restrict to one namespace (`"*"` lists all namespaces).
    pub namespace: Option<Namespace>,
    /// Only volumes whose ID starts with this prefix.
    pub prefix: Option<String>,
    /// Only volumes served by this CSI plugin.
    pub plugin_id: Option<String>,
    /// Only volumes with a claim on this client node.
    pub node_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Façade
// ---------------------------------------------------------------------------

/// Client for the orchestrator's CSI volume endpoints.
///
/// Generic over the [`Requester`] so tests can substitute a recording mock
/// and production code can share one HTTP connection pool via `Arc`.
#[derive(Debug, Clone)]
pub struct VolumeClient<R> {
    requester: R,
}

impl<R: Requester> VolumeClient<R> {
    /// Creates a client that sends every call through `requester`.
    pub fn new(requester: R) -> Self {
        Self { requester }
    }

    /// Creates or updates a CSI volume, optionally waiting until the
    /// orchestrator reports it as schedulable.
    ///
    /// Issues exactly one `PUT volume/csi/{id}/create`. If the response
    /// already reports the volume as schedulable no status reads follow;
    /// otherwise the volume is re-read every [`WaitPolicy::interval`], in the
    /// namespace reported by the server (falling back to the config's
    /// `Namespace`), until it is schedulable.
    ///
    /// # Errors
    ///
    /// - [`VolumeError::Request`] if the create or any status read fails.
    /// - [`VolumeError::NotSchedulable`] once the attempt budget is spent.
    /// - [`VolumeError::WaitCancelled`] if the cancel signal fires.
    #[instrument(skip_all, fields(volume = %id))]
    pub async fn create_or_update(
        &self,
        id: &VolumeId,
        config: VolumeConfig,
        options: CreateOptions,
    ) -> Result<VolumeWrite, VolumeError> {
        let config_namespace = config.namespace();
        let request = ApiRequest::new(Method::Put, VOLUME_ENDPOINT)
            .segment(CSI)
            .segment(id.as_str())
            .segment("create")
            .json(write_body(config, options.policy_override));

        let response = self.requester.request(request).await?;
        info!(policy_override = options.policy_override, "Volume create accepted");

        let Some(policy) = options.wait else {
            return Ok(VolumeWrite {
                response,
                polled: None,
            });
        };

        let written = VolumeStatus::from_write_response(&response);
        if written.is_some_and(|status| status.is_schedulable()) {
            debug!("Volume schedulable on create; no status reads needed");
            return Ok(VolumeWrite {
                response,
                polled: None,
            });
        }
        if written.is_none() {
            warn!("Create response carried no volume status; polling");
        }

        let namespace = written
            .and_then(|status| status.namespace())
            .or(config_namespace);
        let polled = self
            .wait_until_schedulable(id, namespace.as_ref(), policy, options.cancel)
            .await?;

        Ok(VolumeWrite {
            response,
            polled: Some(polled),
        })
    }

    /// Reads a single CSI volume.
    ///
    /// `namespace` is sent as the `namespace` query parameter only when
    /// supplied; otherwise the requester's default namespace (if any) applies.
    ///
    /// # Errors
    ///
    /// Any [`volume::RequestError`]; a missing volume is
    /// [`volume::RequestError::NotFound`].
    #[instrument(skip_all, fields(volume = %id))]
    pub async fn get(
        &self,
        id: &VolumeId,
        namespace: Option<&Namespace>,
    ) -> Result<Value, VolumeError> {
        let mut request = ApiRequest::new(Method::Get, VOLUME_ENDPOINT)
            .segment(CSI)
            .segment(id.as_str());
        if let Some(ns) = namespace {
            request = request.query("namespace", ns.as_str());
        }
        Ok(self.requester.request(request).await?)
    }

    /// Re-reads a volume until it reports `Schedulable: true`.
    ///
    /// Sleeps [`WaitPolicy::interval`] before each read and gives up after
    /// [`WaitPolicy::max_attempts`] reads. Returns the first schedulable
    /// status.
    ///
    /// # Errors
    ///
    /// See [`VolumeClient::create_or_update`].
    pub async fn wait_until_schedulable(
        &self,
        id: &VolumeId,
        namespace: Option<&Namespace>,
        policy: WaitPolicy,
        mut cancel: Option<CancelSignal>,
    ) -> Result<Value, VolumeError> {
        let wait_id = WaitId::new_random();
        let span = info_span!(
            "wait_until_schedulable",
            volume = %id,
            wait_id = %wait_id,
            max_attempts = policy.max_attempts(),
            budget_secs = policy.budget().as_secs(),
        );

        async move {
            let mut attempts = 0u32;
            while attempts < policy.max_attempts() {
                tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel) => {
                        info!(attempts, "Schedulability wait cancelled");
                        return Err(VolumeError::WaitCancelled { id: id.clone(), attempts });
                    }
                    _ = tokio::time::sleep(policy.interval()) => {}
                }

                attempts += 1;
                let status = self.get(id, namespace).await?;
                if VolumeStatus::of(&status).is_schedulable() {
                    info!(attempts, "Volume is schedulable");
                    return Ok(status);
                }
                debug!(attempts, "Volume not yet schedulable");
            }

            warn!(attempts, "Volume did not become schedulable");
            Err(VolumeError::NotSchedulable {
                id: id.clone(),
                attempts,
            })
        }
        .instrument(span)
        .await
    }

    /// Registers an existing external volume with the orchestrator.
    ///
    /// Sends `PUT volume/csi/{id}` with the same body shape as
    /// [`VolumeClient::create_or_update`]; the storage provider is not asked
    /// to create anything.
    #[instrument(skip_all, fields(volume = %id))]
    pub async fn register(
        &self,
        id: &VolumeId,
        config: VolumeConfig,
        policy_override: bool,
    ) -> Result<Value, VolumeError> {
        let request = ApiRequest::new(Method::Put, VOLUME_ENDPOINT)
            .segment(CSI)
            .segment(id.as_str())
            .json(write_body(config, policy_override));
        Ok(self.requester.request(request).await?)
    }

    /// Removes a volume from the orchestrator without deleting the
    /// underlying storage.
    ///
    /// With `force`, the server detaches the volume from any allocations that
    /// still claim it.
    #[instrument(skip_all, fields(volume = %id, force = force))]
    pub async fn deregister(&self, id: &VolumeId, force: bool) -> Result<Value, VolumeError> {
        let mut request = ApiRequest::new(Method::Delete, VOLUME_ENDPOINT)
            .segment(CSI)
            .segment(id.as_str());
        if force {
            request = request.query("force", "true");
        }
        Ok(self.requester.request(request).await?)
    }

    /// Deletes the external storage behind a volume and deregisters it.
    #[instrument(skip_all, fields(volume = %id))]
    pub async fn delete(&self, id: &VolumeId) -> Result<Value, VolumeError> {
        let request = ApiRequest::new(Method::Delete, VOLUME_ENDPOINT)
            .segment(CSI)
            .segment(id.as_str())
            .segment("delete");
        Ok(self.requester.request(request).await?)
    }

    /// Lists CSI volumes matching `filter`.
    #[instrument(skip_all)]
    pub async fn list(&self, filter: &ListFilter) -> Result<Value, VolumeError> {
        let mut request = ApiRequest::new(Method::Get, VOLUMES_ENDPOINT).query("type", CSI);
        if let Some(ns) = &filter.namespace {
            request = request.query("namespace", ns.as_str());
        }
        if let Some(prefix) = &filter.prefix {
            request = request.query("prefix", prefix.as_str());
        }
        if let Some(plugin) = &filter.plugin_id {
            request = request.query("plugin_id", plugin.as_str());
        }
        if let Some(node) = &filter.node_id {
            request = request.query("node_id", node.as_str());
        }
        Ok(self.requester.request(request).await?)
    }
}

/// Builds the `{PolicyOverride, Volumes: [config]}` body shared by create and
/// register.
fn write_body(config: VolumeConfig, policy_override: bool) -> Value {
    json!({
        "PolicyOverride": policy_override,
        "Volumes": [config.into_value()],
    })
}

async fn cancelled(signal: &mut Option<CancelSignal>) {
    match signal {
        Some(signal) => signal.cancelled().await,
        None => std::future::pending().await,
    }
}
