//! reqwest-backed [`Requester`].

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument};
use volume::{ApiRequest, Method, RequestError, Requester};

use crate::NomadConfig;

/// Header carrying the ACL token.
const TOKEN_HEADER: &str = "X-Nomad-Token";

/// API version prefix prepended to every path.
const API_PREFIX: &str = "v1";

/// Sends [`ApiRequest`]s to a Nomad agent over HTTP(S).
///
/// Holds one pooled [`reqwest::Client`]; clone the requester (or wrap it in
/// an `Arc`) to share the pool.
#[derive(Debug, Clone)]
pub struct HttpRequester {
    http: reqwest::Client,
    base: Url,
    config: NomadConfig,
}

impl HttpRequester {
    /// Builds a requester for `config`.
    ///
    /// # Errors
    ///
    /// [`RequestError::InvalidParameters`] if the address is not an absolute
    /// `http` or `https` URL; [`RequestError::Transport`] if the HTTP client
    /// cannot be constructed (e.g. TLS backend initialisation failure).
    pub fn new(config: NomadConfig) -> Result<Self, RequestError> {
        let base = Url::parse(&config.address).map_err(|e| RequestError::InvalidParameters {
            message: format!("address '{}': {e}", config.address),
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(RequestError::InvalidParameters {
                message: format!("address '{}' must be an http(s) URL", config.address),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| RequestError::Transport {
                message: e.to_string(),
            })?;

        Ok(Self { http, base, config })
    }

    /// Resolves the full URL for `request`: base address, `/v1/`, the
    /// percent-encoded endpoint and segments, then the request's query
    /// followed by the default namespace (unless the request set one) and the
    /// region.
    ///
    /// # Errors
    ///
    /// [`RequestError::InvalidParameters`] if the endpoint or a segment is
    /// empty, `.` or `..`; those would be dropped or resolved away and the
    /// request would address a different resource.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, RequestError> {
        if let Some(bad) = std::iter::once(&request.endpoint)
            .chain(&request.segments)
            .find(|s| matches!(s.as_str(), "" | "." | ".."))
        {
            return Err(RequestError::InvalidParameters {
                message: format!("path segment '{bad}' in {request}"),
            });
        }

        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push(API_PREFIX)
                .push(&request.endpoint)
                .extend(&request.segments);
        }

        let mut query: Vec<(&str, &str)> = request
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if request.query_value("namespace").is_none() {
            if let Some(ns) = &self.config.namespace {
                query.push(("namespace", ns.as_str()));
            }
        }
        if let Some(region) = &self.config.region {
            query.push(("region", region.as_str()));
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Requester for HttpRequester {
    #[instrument(skip_all, fields(method = %request.method, path = %request.path()))]
    async fn request(&self, request: ApiRequest) -> Result<Value, RequestError> {
        let url = self.url_for(&request)?;

        let mut builder = self.http.request(http_method(request.method), url.clone());
        if let Some(token) = &self.config.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(send_error)?;
        let status = response.status();
        let text = response.text().await.map_err(send_error)?;
        debug!(status = status.as_u16(), bytes = text.len(), "Response received");

        if !status.is_success() {
            return Err(RequestError::from_status(status.as_u16(), url.as_str(), text));
        }
        decode(&text)
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn send_error(e: reqwest::Error) -> RequestError {
    if e.is_timeout() {
        RequestError::Timeout
    } else {
        RequestError::Transport {
            message: e.to_string(),
        }
    }
}

/// Decodes a success body; deregister and delete answer with an empty one.
fn decode(text: &str) -> Result<Value, RequestError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| RequestError::Decode {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use volume::Namespace;

    fn requester(config: NomadConfig) -> HttpRequester {
        HttpRequester::new(config).unwrap()
    }

    #[test]
    fn url_prefixes_api_version_and_encodes_segments() {
        let r = requester(NomadConfig::default().with_address("http://nomad:4646"));
        let req = ApiRequest::new(Method::Get, "volume")
            .segment("csi")
            .segment("data/0 a");
        assert_eq!(
            r.url_for(&req).unwrap().as_str(),
            "http://nomad:4646/v1/volume/csi/data%2F0%20a"
        );
    }

    #[test]
    fn url_keeps_address_path_prefix() {
        let r = requester(NomadConfig::default().with_address("https://proxy/nomad/"));
        let req = ApiRequest::new(Method::Get, "volumes").query("type", "csi");
        assert_eq!(
            r.url_for(&req).unwrap().as_str(),
            "https://proxy/nomad/v1/volumes?type=csi"
        );
    }

    #[test]
    fn default_namespace_does_not_override_request_namespace() {
        let r = requester(
            NomadConfig::default()
                .with_namespace(Namespace::new("default-ns").unwrap())
                .with_region("eu"),
        );

        let plain = ApiRequest::new(Method::Get, "volume").segment("csi").segment("a");
        assert_eq!(
            r.url_for(&plain).unwrap().query(),
            Some("namespace=default-ns&region=eu")
        );

        let scoped = plain.clone().query("namespace", "prod");
        assert_eq!(r.url_for(&scoped).unwrap().query(), Some("namespace=prod&region=eu"));
    }

    #[test]
    fn no_query_string_without_parameters() {
        let r = requester(NomadConfig::default());
        let req = ApiRequest::new(Method::Delete, "volume").segment("csi").segment("a");
        assert_eq!(r.url_for(&req).unwrap().query(), None);
    }

    #[test]
    fn dot_and_empty_segments_are_rejected() {
        let r = requester(NomadConfig::default());
        for id in ["..", ".", ""] {
            let req = ApiRequest::new(Method::Put, "volume")
                .segment("csi")
                .segment(id)
                .segment("create");
            assert!(
                matches!(r.url_for(&req), Err(RequestError::InvalidParameters { .. })),
                "segment {id:?} produced a URL"
            );
        }

        let dotted = ApiRequest::new(Method::Get, "volume").segment("csi").segment("a..b");
        assert_eq!(
            r.url_for(&dotted).unwrap().path(),
            "/v1/volume/csi/a..b"
        );
    }

    #[test]
    fn invalid_addresses_are_rejected() {
        for address in ["not a url", "ftp://nomad:21", "mailto:ops@example.com"] {
            let err = HttpRequester::new(NomadConfig::default().with_address(address)).unwrap_err();
            assert!(
                matches!(err, RequestError::InvalidParameters { .. }),
                "{address}: {err:?}"
            );
        }
    }

    #[test]
    fn empty_bodies_decode_to_null() {
        assert_eq!(decode("").unwrap(), Value::Null);
        assert_eq!(decode(" \n").unwrap(), Value::Null);
        assert!(matches!(decode("{oops"), Err(RequestError::Decode { .. })));
    }
}
