//! Shared fakes for monitor tests.
#![allow(dead_code)]

use async_trait::async_trait;
use krakenwatch::alerts::{Alert, AlertSink};
use krakenwatch::api::kraken::{AssetPair, AssetPairs, Candle, MarketData, Ticker};
use krakenwatch::{KrakenWatchError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct FakeMarket {
    pairs: Arc<Mutex<AssetPairs>>,
    candles: Arc<Mutex<HashMap<String, Vec<Candle>>>>,
    tickers: Arc<Mutex<HashMap<String, Ticker>>>,
    ticker_calls: Arc<Mutex<Vec<String>>>,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pair(&self, name: &str, base: &str, quote: &str) {
        self.pairs.lock().unwrap().insert(
            name.to_string(),
            AssetPair {
                altname: name.to_string(),
                wsname: format!("{}/{}", base, quote),
                base: base.to_string(),
                quote: quote.to_string(),
                status: Some("online".to_string()),
            },
        );
    }

    pub fn set_candles(&self, pair: &str, candles: Vec<Candle>) {
        self.candles.lock().unwrap().insert(pair.to_string(), candles);
    }

    pub fn set_ticker(&self, pair: &str, last_price: f64, volume_24h: f64) {
        self.tickers.lock().unwrap().insert(
            pair.to_string(),
            Ticker {
                last_price,
                volume_24h,
            },
        );
    }

    pub fn ticker_calls(&self) -> Vec<String> {
        let mut calls = self.ticker_calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn asset_pairs(&self) -> Result<AssetPairs> {
        Ok(self.pairs.lock().unwrap().clone())
    }

    async fn ticker(&self, pair: &str) -> Result<Ticker> {
        self.ticker_calls.lock().unwrap().push(pair.to_string());
        self.tickers
            .lock()
            .unwrap()
            .get(pair)
            .copied()
            .ok_or_else(|| KrakenWatchError::ApiError(format!("EQuery:Unknown asset pair {}", pair)))
    }

    async fn ohlc(&self, pair: &str, _interval_minutes: u32) -> Result<Vec<Candle>> {
        self.candles
            .lock()
            .unwrap()
            .get(pair)
            .cloned()
            .ok_or_else(|| KrakenWatchError::ApiError(format!("EQuery:Unknown asset pair {}", pair)))
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<Alert>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Alert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, alert: &Alert) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(KrakenWatchError::EmailError("relay refused connection".into()));
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Candles from closes, each closing on its low with a 1% high.
pub fn candles(closes: impl IntoIterator<Item = f64>) -> Vec<Candle> {
    closes
        .into_iter()
        .enumerate()
        .map(|(i, close)| Candle {
            time: 1_700_000_000 + i as i64 * 900,
            open: close,
            high: close * 1.01,
            low: close,
            close,
            vwap: close,
            volume: 25.0,
            count: 10,
        })
        .collect()
}

/// A steady decline: RSI and %K both bottom out and price sits on its low.
pub fn selloff() -> Vec<Candle> {
    candles((0..120).map(|i| 300.0 - i as f64))
}

pub fn rally() -> Vec<Candle> {
    candles((0..120).map(|i| 100.0 + i as f64))
}
