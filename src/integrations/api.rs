//! HTTP client for the metrics backend

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::MetricsSource;

/// Failures talking to the metrics collaborator
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{endpoint} responded with HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("malformed response from {endpoint}: {source}")]
    Malformed {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    Unavailable(String),
}

/// Memory or swap usage block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    #[serde(default)]
    pub used: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub free: u64,
    pub percent: f64,
}

/// Utilization of one mounted storage volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeReading {
    pub device: String,
    pub mountpoint: String,
    #[serde(rename = "fstype")]
    pub filesystem_type: String,
    #[serde(rename = "total")]
    pub total_bytes: u64,
    #[serde(rename = "used")]
    pub used_bytes: u64,
    #[serde(default)]
    pub free: u64,
    pub percent: f64,
    #[serde(default)]
    pub read_bytes: Option<u64>,
    #[serde(default)]
    pub write_bytes: Option<u64>,
}

/// Body of `GET /api/system`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    pub timestamp: i64,
    pub hostname: String,
    pub platform: String,
    pub cpu_percent: f64,
    pub memory: MemoryUsage,
    pub swap: MemoryUsage,
    #[serde(default)]
    pub boot_time: Option<i64>,
    #[serde(default)]
    pub disks: Vec<VolumeReading>,
}

impl SystemReport {
    /// Sampling time in the local timezone.
    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        DateTime::from_timestamp(self.timestamp, 0).map(|t| t.with_timezone(&Local))
    }
}

/// One entry of `GET /api/snapshots`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: u64,
    pub created_at: String,
    #[serde(default)]
    pub hostname: Option<String>,
    pub cpu_percent: f64,
    pub memory: MemoryUsage,
}

impl SnapshotSummary {
    /// The backend stores naive UTC timestamps, so a missing offset is read as UTC.
    pub fn created_local(&self) -> Option<DateTime<Local>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(parsed.with_timezone(&Local));
        }
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&Local))
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotList {
    #[serde(default)]
    snapshots: Vec<SnapshotSummary>,
}

#[derive(Debug, Deserialize)]
struct CreatedSnapshot {
    snapshot_id: u64,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    /// Anything other than `ok` means the backend is up but not serving.
    fn check(self) -> Result<Self, ApiError> {
        if self.status.eq_ignore_ascii_case("ok") {
            Ok(self)
        } else {
            Err(ApiError::Unavailable(format!(
                "backend reports status {:?}",
                self.status
            )))
        }
    }
}

/// reqwest-backed metrics source
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status });
        }
        response.json::<T>().await.map_err(|source| {
            if source.is_decode() {
                ApiError::Malformed { endpoint, source }
            } else {
                ApiError::Transport(source)
            }
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        tracing::debug!(endpoint, base = %self.base_url, "GET");
        let response = self
            .http
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        Self::decode(endpoint, response).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let health: HealthStatus = self.get_json("/api/health", &[]).await?;
        health.check()
    }
}

#[async_trait]
impl MetricsSource for ApiClient {
    fn label(&self) -> String {
        self.base_url.clone()
    }

    async fn system(&self) -> Result<SystemReport, ApiError> {
        self.get_json("/api/system", &[]).await
    }

    async fn snapshots(&self, limit: usize) -> Result<Vec<SnapshotSummary>, ApiError> {
        let list: SnapshotList = self
            .get_json("/api/snapshots", &[("limit", limit.to_string())])
            .await?;
        Ok(list.snapshots)
    }

    async fn create_snapshot(&self) -> Result<u64, ApiError> {
        let endpoint = "/api/snapshots";
        tracing::debug!(endpoint, base = %self.base_url, "POST");
        let response = self
            .http
            .post(self.url(endpoint))
            .send()
            .await
            .map_err(ApiError::Transport)?;
        let created: CreatedSnapshot = Self::decode(endpoint, response).await?;
        Ok(created.snapshot_id)
    }
}
