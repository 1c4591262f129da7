//! Port traits implemented by infrastructure crates.

use async_trait::async_trait;
use serde_json::Value;

use crate::{ApiRequest, RequestError};

/// Sends an [`ApiRequest`] to the orchestrator and returns the decoded JSON
/// response.
///
/// Implementations own everything connection-wide: base address, `/v1/`
/// prefix, authentication, region and default namespace, timeouts. A response
/// with an empty body decodes to [`Value::Null`]. Non-success statuses are
/// reported through [`RequestError`]; implementations do not retry.
#[async_trait]
pub trait Requester: Send + Sync {
    /// Performs one call.
    async fn request(&self, request: ApiRequest) -> Result<Value, RequestError>;
}

#[async_trait]
impl<R: Requester + ?Sized> Requester for std::sync::Arc<R> {
    async fn request(&self, request: ApiRequest) -> Result<Value, RequestError> {
        (**self).request(request).await
    }
}

#[async_trait]
impl<R: Requester + ?Sized> Requester for Box<R> {
    async fn request(&self, request: ApiRequest) -> Result<Value, RequestError> {
        (**self).request(request).await
    }
}
