//! Upstream rate source implementations

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use fx_core::{CurrencyRate, FetchError, FetchResult, RateSnapshot, UpstreamConfig};

/// One-shot retrieval of the current rate snapshot.
///
/// No retries happen inside `fetch`: the retry policy lives in the
/// poller, which simply tries again on the next tick.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> FetchResult<RateSnapshot>;
}

/// Wire format of the upstream daily document.
///
/// Only `Valute` is read; the document carries more fields (dates,
/// previous values) which are ignored.
#[derive(Debug, Deserialize)]
struct DailyDocument {
    #[serde(rename = "Valute")]
    valute: HashMap<String, ValuteEntry>,
}

#[derive(Debug, Deserialize)]
struct ValuteEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value")]
    value: Decimal,
}

/// HTTP rate source for the Central Bank daily JSON feed
pub struct CbrRateSource {
    client: reqwest::Client,
    url: String,
}

impl CbrRateSource {
    pub fn new(config: &UpstreamConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    fn parse_document(body: &str) -> FetchResult<RateSnapshot> {
        let document: DailyDocument = serde_json::from_str(body)
            .map_err(|e| FetchError::MalformedPayload(e.to_string()))?;

        Ok(document
            .valute
            .into_iter()
            .map(|(code, entry)| (code, CurrencyRate::new(entry.name, entry.value)))
            .collect())
    }
}

#[async_trait::async_trait]
impl RateSource for CbrRateSource {
    async fn fetch(&self) -> FetchResult<RateSnapshot> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let snapshot = Self::parse_document(&body)?;
        debug!("Fetched {} rates from upstream", snapshot.len());

        Ok(snapshot)
    }
}
