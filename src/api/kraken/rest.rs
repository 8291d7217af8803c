use super::types::{candles_from_result, first_ticker, AssetPairs, Candle, Envelope, RawTicker, Ticker};
use crate::api::retry::{retry, RetryPolicy};
use crate::config::ApiConfig;
use crate::error::{KrakenWatchError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// The three public market-data calls the monitors depend on.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn asset_pairs(&self) -> Result<AssetPairs>;
    async fn ticker(&self, pair: &str) -> Result<Ticker>;
    async fn ohlc(&self, pair: &str, interval_minutes: u32) -> Result<Vec<Candle>>;
}

/// REST client for Kraken's public endpoints.
pub struct KrakenClient {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl KrakenClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("krakenwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            retry: config.retry.clone(),
        })
    }

    async fn get<T: DeserializeOwned + Send>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        retry(&self.retry, endpoint, || async {
            debug!("GET {} {:?}", url, query);
            let response = self.client.get(&url).query(query).send().await?;

            if !response.status().is_success() {
                return Err(KrakenWatchError::StatusError {
                    endpoint: endpoint.to_string(),
                    status: response.status(),
                });
            }

            let envelope: Envelope<T> = response.json().await?;
            envelope.into_result(endpoint)
        })
        .await
    }
}

#[async_trait]
impl MarketData for KrakenClient {
    async fn asset_pairs(&self) -> Result<AssetPairs> {
        let pairs: AssetPairs = self.get("AssetPairs", &[]).await?;
        debug!("Fetched {} asset pairs", pairs.len());
        Ok(pairs)
    }

    async fn ticker(&self, pair: &str) -> Result<Ticker> {
        let result: HashMap<String, RawTicker> =
            self.get("Ticker", &[("pair", pair.to_string())]).await?;
        first_ticker(result, pair)
    }

    async fn ohlc(&self, pair: &str, interval_minutes: u32) -> Result<Vec<Candle>> {
        let result: HashMap<String, Value> = self
            .get(
                "OHLC",
                &[
                    ("pair", pair.to_string()),
                    ("interval", interval_minutes.to_string()),
                ],
            )
            .await?;
        candles_from_result(result, pair)
    }
}
