use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use urlencoding::encode;

use crate::config::types::BackendConfig;
use crate::transform::{TransformedPayload, transform_payload};
use crate::types::IssueId;

use super::error::{ApiError, ApiResult};

/// Body of `PATCH /api/reports/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBody<'a> {
    pub status: &'a str,
}

/// Thin client over the reports endpoints.
#[derive(Debug, Clone)]
pub struct ReportsClient {
    client: Client,
    base_url: String,
}

impl ReportsClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("civic-board/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(cfg: &BackendConfig) -> ApiResult<Self> {
        Self::new(&cfg.base_url, Duration::from_secs(cfg.timeout_secs.max(1)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/reports`, transformed. A malformed envelope is an error; a
    /// malformed record inside a good envelope is skipped and counted.
    pub async fn fetch_reports(&self) -> ApiResult<TransformedPayload> {
        let url = format!("{}/api/reports", self.base_url);
        tracing::debug!("api: GET {url}");
        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        let payload: serde_json::Value = serde_json::from_slice(&bytes)?;
        Ok(transform_payload(payload)?)
    }

    /// `PATCH /api/reports/{id}/status` with a backend status code.
    pub async fn update_status(&self, id: &IssueId, code: &str) -> ApiResult<()> {
        let url = format!(
            "{}/api/reports/{}/status",
            self.base_url,
            encode(&id.to_string())
        );
        tracing::debug!("api: PATCH {url} status={code}");
        let response = self
            .client
            .patch(&url)
            .json(&StatusBody { status: code })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = match status {
        StatusCode::NOT_FOUND if body.is_empty() => "not found".to_owned(),
        _ => body.chars().take(200).collect(),
    };
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}
