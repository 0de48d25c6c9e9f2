//! HTTP client for the host manager API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::{HostManager, HostMgrError};

/// Host manager API client.
pub struct HttpHostManager {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHostManager {
    /// Create a client for the host manager at `base_url`.
    ///
    /// `timeout` bounds each request at the transport level.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, HostMgrError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, HostMgrError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Host manager request failed");
        Err(HostMgrError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DrainingHostsResponse {
    #[serde(default)]
    hostnames: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MarkHostsDrainedRequest<'a> {
    hostnames: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct MarkHostsDrainedResponse {
    #[serde(default)]
    marked_hosts: Vec<String>,
}

#[async_trait]
impl HostManager for HttpHostManager {
    async fn get_draining_hosts(&self, limit: u32) -> Result<Vec<String>, HostMgrError> {
        let url = format!("{}/v1/hosts/draining", self.base_url);
        debug!(url = %url, limit, "Fetching draining hosts");

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let body: DrainingHostsResponse = Self::check(response).await?.json().await?;

        debug!(host_count = body.hostnames.len(), "Fetched draining hosts");
        Ok(body.hostnames)
    }

    async fn mark_host_drained(&self, hostname: &str) -> Result<(), HostMgrError> {
        let url = format!("{}/v1/hosts/drained", self.base_url);
        debug!(host = %hostname, "Marking host drained");

        let request = MarkHostsDrainedRequest {
            hostnames: [hostname],
        };
        let response = self.client.post(&url).json(&request).send().await?;
        let body: MarkHostsDrainedResponse = Self::check(response).await?.json().await?;

        if !body.marked_hosts.iter().any(|h| h == hostname) {
            // The host left the draining state on its own; nothing left to confirm.
            warn!(host = %hostname, "Host manager did not mark host drained");
        }
        Ok(())
    }
}
