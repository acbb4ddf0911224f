// Status API HTTP client
//
// Wraps `reqwest::Client` with openWB URL construction and payload
// validation. One GET per call, no retries: retry policy belongs to the
// poller driving this client.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::endpoint::DeviceEndpoint;
use crate::error::Error;
use crate::snapshot::RawSnapshot;
use crate::transport::TransportConfig;

/// Stateless HTTP client for one device's status API.
#[derive(Debug, Clone)]
pub struct OpenWbClient {
    http: reqwest::Client,
    endpoint: DeviceEndpoint,
    url: Url,
    timeout: Duration,
}

impl OpenWbClient {
    /// Create a client for `endpoint` from a `TransportConfig`.
    pub fn new(endpoint: DeviceEndpoint, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, endpoint, transport.timeout)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// `timeout` is applied per request, so it holds even when the shared
    /// client was built without one.
    pub fn with_client(
        http: reqwest::Client,
        endpoint: DeviceEndpoint,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let url = endpoint.status_url()?;
        Ok(Self {
            http,
            endpoint,
            url,
            timeout,
        })
    }

    /// The device this client talks to.
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// The full status URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch the full status payload (`?get=all`).
    pub async fn fetch_status(&self) -> Result<RawSnapshot, Error> {
        debug!("GET {}", self.url);

        let resp = self
            .http
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        trace!(bytes = body.len(), "status body received");

        // openWB serves this with `text/html`, so parse the text ourselves
        // instead of trusting the content type.
        let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        RawSnapshot::try_from(value)
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
