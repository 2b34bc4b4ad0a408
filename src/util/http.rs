//! HTTP transport.
//!
//! Registry and hosting API calls go through the [`Transport`] trait so that
//! tests can answer them from memory. Non-2xx answers are errors carrying
//! their status; callers look the status up with [`http_status`].

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A complete HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,

    /// Header names are lowercase
    pub headers: HashMap<String, String>,

    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        serde_json::from_slice(&self.body)
            .with_context(|| format!("invalid JSON returned by {}", url))
    }
}

/// Failure of a single request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("the \"{url}\" file could not be downloaded (HTTP {status})")]
    Status { url: String, status: u16 },

    #[error("the \"{url}\" file could not be downloaded: {message}")]
    Network { url: String, message: String },
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network { .. } => None,
        }
    }
}

/// Blocking GET capability.
pub trait Transport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, TransportError>;
}

/// HTTP status of the first transport error in an error chain.
pub fn http_status(err: &anyhow::Error) -> Option<u16> {
    transport_error(err).and_then(TransportError::status)
}

/// True when the chain holds a transport failure without a status.
pub fn is_network_error(err: &anyhow::Error) -> bool {
    matches!(transport_error(err), Some(TransportError::Network { .. }))
}

fn transport_error(err: &anyhow::Error) -> Option<&TransportError> {
    err.chain().find_map(|e| e.downcast_ref::<TransportError>())
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("asset-bridge/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(ReqwestTransport { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        tracing::debug!("GET {}", url);

        let network = |e: reqwest::Error| TransportError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send().map_err(network)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
            });
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().map_err(network)?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Next page URL of a `Link` header (`<url>; rel="next"`).
pub fn next_link(response: &HttpResponse) -> Option<String> {
    let link = response.header("link")?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| target.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}
