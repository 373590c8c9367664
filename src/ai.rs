// MIT License - Copyright (c) 2026 Peter Wright
// External AI endpoint client

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};

/// Window of sensor history the anomaly endpoint should analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
    #[serde(rename = "all")]
    All,
}

#[derive(Debug, Serialize)]
struct FanRequest {
    temperature: f64,
    humidity: f64,
}

/// Response of the fan-control endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FanSuggestion {
    /// Suggested speed in percent. The endpoint promises 0-100 but is
    /// not trusted; use [`clamped_speed`](Self::clamped_speed).
    #[serde(rename = "fanSpeed")]
    pub fan_speed: f64,
    pub reason: String,
}

impl FanSuggestion {
    /// The suggestion clamped to the valid fan-speed range.
    pub fn clamped_speed(&self) -> u8 {
        if self.fan_speed.is_nan() {
            return 0;
        }
        self.fan_speed.round().clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Serialize)]
struct AnomalyRequest {
    #[serde(rename = "timeFrame")]
    time_frame: TimeFrame,
}

/// One detected anomaly.
#[derive(Debug, Clone, Deserialize)]
pub struct Anomaly {
    /// Severity class: "warning", "error" or "info".
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyStatistics {
    /// Formatted average temperature (the endpoint sends strings).
    #[serde(rename = "avgTemp")]
    pub avg_temp: String,
    #[serde(rename = "avgHum")]
    pub avg_hum: String,
    #[serde(rename = "dataPoints")]
    pub data_points: u32,
}

/// Response of the anomaly-detection endpoint.
///
/// With insufficient history the endpoint returns only `anomalies: []`
/// plus a `message`; `insights` and `statistics` are then absent.
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyReport {
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub statistics: Option<AnomalyStatistics>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for the two AI helper endpoints.
///
/// Both calls are plain request/response; any retry or backoff policy
/// belongs to the caller (see [`AiBackoff`](crate::policy::AiBackoff)
/// for the periodic fan loop).
#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_url: String,
}

impl AiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Ask for a fan-speed suggestion for the current conditions.
    ///
    /// An HTTP 429 maps to [`HubError::AiRateLimited`] so the periodic
    /// caller can back off instead of retrying.
    pub async fn suggest_fan_speed(&self, temperature: f64, humidity: f64) -> Result<FanSuggestion> {
        let response = self
            .http
            .post(format!("{}/ai-fan-control", self.base_url))
            .json(&FanRequest { temperature, humidity })
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Run anomaly detection over the stored sensor history.
    ///
    /// On-demand only: a failure is surfaced once and requires a manual
    /// re-trigger.
    pub async fn analyze_anomalies(&self, time_frame: TimeFrame) -> Result<AnomalyReport> {
        let response = self
            .http
            .post(format!("{}/ai-anomaly-detection", self.base_url))
            .json(&AnomalyRequest { time_frame })
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(HubError::AiRateLimited),
            status if !status.is_success() => Err(HubError::AiEndpoint { status: status.as_u16() }),
            _ => response
                .json()
                .await
                .map_err(|e| HubError::AiResponse { details: e.to_string() }),
        }
    }
}
