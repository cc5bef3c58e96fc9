//! HTTP client for the backend's diagnostics endpoints
//!
//! One GET per endpoint, no retries. The performance snapshot is mandatory;
//! history and slowest-requests degrade to [`Source::Absent`].

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{Endpoints, REQUEST_TIMEOUT};
use crate::error::{AuditError, FetchFailure, Result};
use crate::models::{HistorySnapshot, PrimarySnapshot, SlowestSnapshot};

/// Outcome of fetching an optional diagnostics source
#[derive(Debug, Clone)]
pub enum Source<T> {
    Available(T),
    Absent(FetchFailure),
}

impl<T> Source<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Source::Available(data) => Some(data),
            Source::Absent(_) => None,
        }
    }
}

/// Diagnostics endpoint client
pub struct DiagnosticsClient {
    http: Client,
    endpoints: Endpoints,
}

impl DiagnosticsClient {
    /// Create a client using the fixed request timeout
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        Self::with_timeout(endpoints, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuditError::Fetch {
                url: endpoints.performance.clone(),
                reason: FetchFailure::Network(e.to_string()),
            })?;

        Ok(Self { http, endpoints })
    }

    /// GET the performance snapshot. Any failure aborts the run.
    pub async fn fetch_performance(&self) -> Result<PrimarySnapshot> {
        let url = &self.endpoints.performance;

        let raw = self.get_json(url).await.map_err(|reason| {
            error!(url = %url, reason = %reason, "Performance snapshot unavailable");
            AuditError::Fetch {
                url: url.clone(),
                reason,
            }
        })?;

        PrimarySnapshot::from_value(raw).map_err(|source| AuditError::Decode {
            url: url.clone(),
            source,
        })
    }

    pub async fn fetch_history(&self) -> Source<HistorySnapshot> {
        self.fetch_optional(&self.endpoints.history).await
    }

    pub async fn fetch_slowest(&self) -> Source<SlowestSnapshot> {
        self.fetch_optional(&self.endpoints.slowest_with_limit()).await
    }

    async fn fetch_optional<T: DeserializeOwned>(&self, url: &str) -> Source<T> {
        let outcome = match self.get_json(url).await {
            Ok(Value::Null) => Err(FetchFailure::Empty),
            Ok(Value::Object(map)) if map.is_empty() => Err(FetchFailure::Empty),
            Ok(raw) => serde_json::from_value(raw).map_err(|e| FetchFailure::Decode(e.to_string())),
            Err(reason) => Err(reason),
        };

        match outcome {
            Ok(data) => {
                debug!(url = %url, "Optional diagnostics source fetched");
                Source::Available(data)
            }
            Err(reason) => {
                info!(url = %url, reason = %reason, "Optional diagnostics source unavailable");
                Source::Absent(reason)
            }
        }
    }

    async fn get_json(&self, url: &str) -> std::result::Result<Value, FetchFailure> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }
}
