//! Client for the Redpanda admin API.

use std::{fmt, time::Duration};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::constants::{HEALTH_OVERVIEW_PATH, USERS_PATH};

/// Errors returned by the admin API client.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The base URL could not be parsed.
    #[error("invalid admin api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The request failed or the response body could not be decoded.
    #[error("admin api request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The admin API answered with a non-success status.
    #[error("admin api returned {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, as text.
        body: String,
    },
}

/// SCRAM mechanism used to hash a user's password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScramMechanism {
    /// `SCRAM-SHA-256`.
    #[default]
    #[serde(rename = "SCRAM-SHA-256")]
    ScramSha256,
    /// `SCRAM-SHA-512`.
    #[serde(rename = "SCRAM-SHA-512")]
    ScramSha512,
}

impl ScramMechanism {
    /// Returns the mechanism name as the admin API expects it.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

impl fmt::Display for ScramMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cluster health as reported by `/v1/cluster/health_overview`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthOverview {
    /// Whether the cluster considers itself healthy.
    #[serde(alias = "healthy")]
    pub is_healthy: bool,
    /// Node ID of the current controller, if elected.
    #[serde(default)]
    pub controller_id: Option<i64>,
    /// IDs of all known nodes.
    #[serde(default)]
    pub all_nodes: Vec<i64>,
    /// IDs of nodes that are down.
    #[serde(default)]
    pub nodes_down: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct NewUser<'a> {
    username: &'a str,
    password: &'a str,
    algorithm: ScramMechanism,
}

/// HTTP client bound to one admin API address.
#[derive(Debug, Clone)]
pub struct AdminApiClient {
    base_url: Url,
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl AdminApiClient {
    /// Creates a client for the admin API at `base_url`, e.g. `http://localhost:55002`.
    pub fn new(base_url: &str) -> Result<Self, AdminError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Creates a client reusing an existing HTTP client.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, AdminError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AdminError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self { base_url, http, timeout: None })
    }

    /// Fails any request that takes longer than `timeout`.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the admin API base URL.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the cluster health overview.
    pub async fn health_overview(&self) -> Result<HealthOverview, AdminError> {
        let request = self.http.get(self.base_url.join(HEALTH_OVERVIEW_PATH)?);
        let response = self.with_request_timeout(request).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Creates a SASL/SCRAM user.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        mechanism: ScramMechanism,
    ) -> Result<(), AdminError> {
        let body = NewUser { username, password, algorithm: mechanism };
        let request = self.http.post(self.base_url.join(USERS_PATH)?).json(&body);
        let response = self.with_request_timeout(request).send().await?;
        check_status(response).await?;
        Ok(())
    }

    fn with_request_timeout(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AdminError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AdminError::Status { status, body })
}
