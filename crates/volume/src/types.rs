//! Request and payload values.
//!
//! Volume payloads are schema-less: the orchestrator owns the schema and this
//! client passes objects through untouched. The only keys read here are
//! `Schedulable` and `Namespace`, via [`VolumeStatus`] and [`VolumeConfig`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Namespace;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------

/// A single call against the orchestrator's API, expressed independently of
/// any HTTP library.
///
/// `endpoint` is the base route (`"volume"`, `"volumes"`); `segments` are
/// appended after it. The transport is responsible for the `/v1/` prefix,
/// percent-encoding each segment, and adding connection-wide parameters
/// (token, region, default namespace).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Base route, without leading or trailing slashes.
    pub endpoint: String,
    /// Path segments appended to `endpoint`, unencoded.
    pub segments: Vec<String>,
    /// Query parameters, in insertion order.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Creates a request with no segments, query parameters, or body.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Appends a path segment.
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the first value of query parameter `key`, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the unencoded path (`endpoint/segment/...`), used for logging
    /// and error messages.
    pub fn path(&self) -> String {
        std::iter::once(self.endpoint.as_str())
            .chain(self.segments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path())
    }
}

// ---------------------------------------------------------------------------
// Volume payloads
// ---------------------------------------------------------------------------

/// A single CSI volume specification, as accepted by the create and register
/// endpoints.
///
/// The object is forwarded verbatim. The only invariant enforced here is that
/// it is a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeConfig(Map<String, Value>);

impl VolumeConfig {
    /// Wraps a JSON value, returning `None` if it is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the `Namespace` key, if present and non-empty.
    pub fn namespace(&self) -> Option<Namespace> {
        self.0
            .get("Namespace")
            .and_then(Value::as_str)
            .and_then(Namespace::new)
    }

    /// Borrows the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts back into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

// ---------------------------------------------------------------------------

/// Read-only view over a volume object returned by the server.
///
/// Missing or mistyped keys read as "absent": a volume without a boolean
/// `Schedulable` is reported as not schedulable.
#[derive(Debug, Clone, Copy)]
pub struct VolumeStatus<'a>(&'a Value);

impl<'a> VolumeStatus<'a> {
    /// Views `value` as a volume object (e.g. a `GET volume/csi/{id}` response).
    pub fn of(value: &'a Value) -> Self {
        Self(value)
    }

    /// Locates the volume inside a create or register response.
    ///
    /// Those endpoints answer `{"Volumes": [...], ...}`; the first element is
    /// the volume just written. A bare volume object is accepted as well.
    /// Returns `None` when the response carries no volume at all.
    pub fn from_write_response(response: &'a Value) -> Option<Self> {
        if let Some(first) = response
            .get("Volumes")
            .and_then(Value::as_array)
            .and_then(|volumes| volumes.first())
        {
            return Some(Self(first));
        }
        match response {
            Value::Object(map) if map.contains_key("Schedulable") => Some(Self(response)),
            _ => None,
        }
    }

    /// Returns `true` only if `Schedulable` is the boolean `true`.
    pub fn is_schedulable(&self) -> bool {
        self.0
            .get("Schedulable")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns the `Namespace` key, if present and non-empty.
    pub fn namespace(&self) -> Option<Namespace> {
        self.0
            .get("Namespace")
            .and_then(Value::as_str)
            .and_then(Namespace::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_path_joins_endpoint_and_segments() {
        let req = ApiRequest::new(Method::Put, "volume")
            .segment("csi")
            .segment("db")
            .segment("create");
        assert_eq!(req.path(), "volume/csi/db/create");
        assert_eq!(req.to_string(), "PUT volume/csi/db/create");
    }

    #[test]
    fn query_value_returns_first_match() {
        let req = ApiRequest::new(Method::Get, "volumes")
            .query("type", "csi")
            .query("prefix", "a")
            .query("prefix", "b");
        assert_eq!(req.query_value("prefix"), Some("a"));
        assert_eq!(req.query_value("namespace"), None);
    }

    #[test]
    fn volume_config_must_be_an_object() {
        assert!(VolumeConfig::from_value(json!([1, 2])).is_none());
        assert!(VolumeConfig::from_value(json!("x")).is_none());

        let cfg = VolumeConfig::from_value(json!({"ID": "db", "Namespace": "prod"})).unwrap();
        assert_eq!(cfg.namespace().unwrap().as_str(), "prod");
        assert_eq!(cfg.into_value(), json!({"ID": "db", "Namespace": "prod"}));
    }

    #[test]
    fn volume_config_serializes_as_the_bare_object() {
        let cfg = VolumeConfig::from_value(json!({"ID": "db"})).unwrap();
        assert_eq!(serde_json::to_value(&cfg).unwrap(), json!({"ID": "db"}));
    }

    #[test]
    fn status_reads_schedulable_strictly() {
        assert!(VolumeStatus::of(&json!({"Schedulable": true})).is_schedulable());
        assert!(!VolumeStatus::of(&json!({"Schedulable": false})).is_schedulable());
        assert!(!VolumeStatus::of(&json!({"Schedulable": "true"})).is_schedulable());
        assert!(!VolumeStatus::of(&json!({})).is_schedulable());
        assert!(!VolumeStatus::of(&Value::Null).is_schedulable());
    }

    #[test]
    fn write_response_yields_first_volume() {
        let resp = json!({
            "Volumes": [
                {"ID": "db", "Namespace": "prod", "Schedulable": false},
                {"ID": "other", "Schedulable": true}
            ],
            "Warnings": ""
        });
        let status = VolumeStatus::from_write_response(&resp).unwrap();
        assert!(!status.is_schedulable());
        assert_eq!(status.namespace().unwrap().as_str(), "prod");
    }

    #[test]
    fn write_response_without_volumes() {
        assert!(VolumeStatus::from_write_response(&Value::Null).is_none());
        assert!(VolumeStatus::from_write_response(&json!({"Volumes": []})).is_none());

        let bare = json!({"ID": "db", "Schedulable": true});
        assert!(VolumeStatus::from_write_response(&bare)
            .unwrap()
            .is_schedulable());
    }
}
