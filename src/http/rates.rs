//! Daily exchange rates from a fixer.io-style API, cached on disk.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::core::{ClientError, CurrencyRates, RateSettings, RateSource};

/// Name of the snapshot file inside the cache directory.
pub const CACHE_FILE: &str = "currency_rates.json";

/// Failure report inside an otherwise successful response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Status {
    success: Option<bool>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiError {
    code: Option<u32>,
    info: Option<String>,
}

/// [`RateSource`] that keeps the latest snapshot in `currency_rates.json`
/// and asks the API only once the snapshot is stale.
#[derive(Debug, Clone)]
pub struct FixerRateSource {
    http: reqwest::Client,
    settings: RateSettings,
}

impl FixerRateSource {
    pub fn new(settings: &RateSettings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            settings: settings.clone(),
        })
    }

    pub fn cache_path(&self) -> PathBuf {
        self.settings.cache_dir.join(CACHE_FILE)
    }

    /// The cached snapshot, if there is a readable one.
    pub async fn cached(&self) -> Option<CurrencyRates> {
        let path = self.cache_path();
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "rate cache unreadable");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(rates) => Some(rates),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "rate cache corrupt");
                None
            }
        }
    }

    /// [`RateSource::refresh`] as of `today`.
    pub async fn refresh_on(
        &self,
        base: &str,
        today: NaiveDate,
    ) -> Result<Option<CurrencyRates>, ClientError> {
        if self.cached().await.is_some_and(|rates| !rates.is_stale(today)) {
            return Ok(None);
        }

        let url = format!("{}/latest", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .query(&[("access_key", self.settings.access_key.as_str()), ("base", base)])
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Remote(format!("HTTP {status}: {text}")));
        }

        let rates = parse_rates(&text)?;
        self.store(&text).await;
        tracing::info!(base = %rates.base, date = %rates.date, "currency rates fetched");
        Ok(Some(rates))
    }
}

impl FixerRateSource {
    /// Replace the snapshot file. A failed write only costs a refetch.
    async fn store(&self, text: &str) {
        let path = self.cache_path();
        if let Err(e) = tokio::fs::write(&path, text).await {
            tracing::warn!(path = %path.display(), error = %e, "rate cache not written");
        }
    }
}

#[async_trait]
impl RateSource for FixerRateSource {
    async fn refresh(&self, base: &str) -> Result<Option<CurrencyRates>, ClientError> {
        self.refresh_on(base, Utc::now().date_naive()).await
    }
}

/// Parse an API response, honouring `"success": false` reports.
fn parse_rates(text: &str) -> Result<CurrencyRates, ClientError> {
    let status: Status =
        serde_json::from_str(text).map_err(|e| ClientError::Decode(e.to_string()))?;
    if status.success == Some(false) {
        let error = status.error.unwrap_or_default();
        return Err(ClientError::Remote(format!(
            "rate API error {}: {}",
            error.code.unwrap_or_default(),
            error.info.unwrap_or_default()
        )));
    }
    serde_json::from_str(text).map_err(|e| ClientError::Decode(e.to_string()))
}
