use crate::error::{KrakenWatchError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Every public endpoint wraps its payload in `{ "error": [...], "result": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub error: Vec<String>,
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    pub fn into_result(self, endpoint: &str) -> Result<T> {
        if !self.error.is_empty() {
            return Err(KrakenWatchError::ApiError(self.error.join(", ")));
        }
        self.result
            .ok_or_else(|| KrakenWatchError::decode(endpoint, "response has no result"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetPair {
    #[serde(default)]
    pub altname: String,
    #[serde(default)]
    pub wsname: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub status: Option<String>,
}

pub type AssetPairs = HashMap<String, AssetPair>;

#[derive(Debug, Deserialize)]
pub(crate) struct RawTicker {
    c: Vec<String>, // Last trade [price, lot volume]
    v: Vec<String>, // Volume [today, last 24 hours]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ticker {
    pub last_price: f64,
    pub volume_24h: f64,
}

impl RawTicker {
    pub(crate) fn parse(&self, pair: &str) -> Result<Ticker> {
        Ok(Ticker {
            last_price: ticker_field(&self.c, 0, pair, "last price")?,
            volume_24h: ticker_field(&self.v, 1, pair, "24h volume")?,
        })
    }
}

fn ticker_field(values: &[String], idx: usize, pair: &str, name: &str) -> Result<f64> {
    let raw = values.get(idx).ok_or_else(|| {
        KrakenWatchError::decode(format!("{} ticker", pair), format!("missing {}", name))
    })?;
    parse_decimal(raw, pair, name)
}

/// Ticker results are keyed by Kraken's canonical name, which can differ
/// from the one requested (`XBTUSD` -> `XXBTZUSD`), so take the only entry.
pub(crate) fn first_ticker(result: HashMap<String, RawTicker>, pair: &str) -> Result<Ticker> {
    result
        .values()
        .next()
        .ok_or_else(|| KrakenWatchError::decode(format!("{} ticker", pair), "empty result"))?
        .parse(pair)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub vwap: f64,
    pub volume: f64,
    pub count: u64,
}

impl Candle {
    /// `[time, "open", "high", "low", "close", "vwap", "volume", count]`
    pub fn from_row(row: &Value, pair: &str) -> Result<Self> {
        let cells = row
            .as_array()
            .filter(|cells| cells.len() >= 8)
            .ok_or_else(|| KrakenWatchError::decode(format!("{} OHLC row", pair), "expected 8 columns"))?;

        let price = |idx: usize, name: &str| -> Result<f64> {
            match &cells[idx] {
                Value::String(s) => parse_decimal(s, pair, name),
                Value::Number(n) => n
                    .as_f64()
                    .ok_or_else(|| KrakenWatchError::decode(format!("{} OHLC row", pair), name)),
                other => Err(KrakenWatchError::decode(
                    format!("{} OHLC row", pair),
                    format!("{} is {}", name, other),
                )),
            }
        };

        Ok(Candle {
            time: cells[0].as_i64().ok_or_else(|| {
                KrakenWatchError::decode(format!("{} OHLC row", pair), "time is not an integer")
            })?,
            open: price(1, "open")?,
            high: price(2, "high")?,
            low: price(3, "low")?,
            close: price(4, "close")?,
            vwap: price(5, "vwap")?,
            volume: price(6, "volume")?,
            count: cells[7].as_u64().unwrap_or(0),
        })
    }
}

/// OHLC results hold the candle array under the pair name next to a
/// scalar `last` cursor; the first array-valued entry is the series.
pub(crate) fn candles_from_result(result: HashMap<String, Value>, pair: &str) -> Result<Vec<Candle>> {
    let rows = result
        .values()
        .find_map(|v| v.as_array())
        .ok_or_else(|| KrakenWatchError::decode(format!("{} OHLC", pair), "no candle series"))?;
    rows.iter().map(|row| Candle::from_row(row, pair)).collect()
}

fn parse_decimal(raw: &str, pair: &str, name: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|e| KrakenWatchError::decode(format!("{} {}", pair, name), format!("'{}': {}", raw, e)))
}
