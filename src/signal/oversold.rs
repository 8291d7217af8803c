use super::indicators::{rolling_min, rsi_series, stoch_k_series};
use crate::api::kraken::{AssetPair, AssetPairs, Candle, MarketData, Ticker};
use crate::error::Result;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

/// Thresholds for the mean-reversion screen.
#[derive(Debug, Clone, PartialEq)]
pub struct OversoldCriteria {
    pub min_candles: usize,
    pub rsi_length: usize,
    pub rsi_max: f64,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub stoch_max: f64,
    pub support_window: usize,
    /// Close must sit within this multiple of the rolling low.
    pub support_tolerance: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub min_volume: f64,
}

impl Default for OversoldCriteria {
    fn default() -> Self {
        Self {
            min_candles: 14,
            rsi_length: 14,
            rsi_max: 30.0,
            stoch_k: 14,
            stoch_d: 3,
            stoch_max: 20.0,
            support_window: 90,
            support_tolerance: 1.07,
            min_price: 1.0,
            max_price: 500.0,
            min_volume: 100_000.0,
        }
    }
}

/// Indicator readings at the last closed candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedReading {
    pub close: f64,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub support_low: Option<f64>,
}

impl ClosedReading {
    pub fn is_oversold(&self, criteria: &OversoldCriteria) -> bool {
        matches!(
            (self.rsi, self.stoch_k),
            (Some(rsi), Some(k)) if rsi < criteria.rsi_max && k < criteria.stoch_max
        )
    }

    pub fn near_support(&self, criteria: &OversoldCriteria) -> bool {
        self.support_low
            .map_or(false, |low| self.close <= low * criteria.support_tolerance)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OversoldHit {
    pub pair: String,
    pub rsi: f64,
    pub stoch_k: f64,
    pub close: f64,
    pub support_low: f64,
    pub last_price: f64,
    pub volume_24h: f64,
}

impl OversoldHit {
    pub fn summary(&self) -> String {
        format!("{}: RSI={:.2}, StochK={:.2}", self.pair, self.rsi, self.stoch_k)
    }
}

/// Kraken prefixes legacy four-letter asset codes with `X` (crypto) or
/// `Z` (fiat): `XXBT`, `ZUSD`. Newer listings carry no prefix.
pub fn normalize_asset(code: &str) -> &str {
    let upper = code.as_bytes();
    if upper.len() == 4 && matches!(upper[0], b'X' | b'Z') {
        &code[1..]
    } else {
        code
    }
}

/// USD-quoted pairs whose base is not itself fiat or a stablecoin.
pub fn select_usd_pairs(pairs: &AssetPairs, excluded_bases: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = pairs
        .iter()
        .filter(|(_, info)| is_usd_quoted(info) && !has_excluded_base(info, excluded_bases))
        .map(|(name, _)| name.clone())
        .collect();
    selected.sort();
    selected
}

fn is_usd_quoted(info: &AssetPair) -> bool {
    normalize_asset(&info.quote) == "USD" || info.altname.ends_with("USD")
}

fn has_excluded_base(info: &AssetPair, excluded_bases: &[String]) -> bool {
    let base = normalize_asset(&info.base);
    excluded_bases
        .iter()
        .any(|b| b == base || info.wsname.starts_with(&format!("{}/", b)))
}

/// Indicator readings at the second-to-last row; the final row is the
/// candle still being formed. `None` when there are too few rows.
pub fn read_closed_candle(candles: &[Candle], criteria: &OversoldCriteria) -> Result<Option<ClosedReading>> {
    if candles.len() < criteria.min_candles.max(2) {
        return Ok(None);
    }
    let idx = candles.len() - 2;
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let rsi = rsi_series(&closes, criteria.rsi_length)?;
    let stoch = stoch_k_series(candles, criteria.stoch_k, criteria.stoch_d)?;
    let support = rolling_min(&closes, criteria.support_window);

    Ok(Some(ClosedReading {
        close: closes[idx],
        rsi: rsi[idx],
        stoch_k: stoch[idx],
        support_low: support[idx],
    }))
}

pub fn is_rebound_candidate(ticker: &Ticker, criteria: &OversoldCriteria) -> bool {
    ticker.last_price > criteria.min_price
        && ticker.last_price < criteria.max_price
        && ticker.volume_24h > criteria.min_volume
}

/// Classify one pair. The ticker is only requested for pairs that already
/// pass the chart checks.
pub async fn analyze_pair<M: MarketData + ?Sized>(
    market: &M,
    pair: &str,
    ohlc_interval: u32,
    criteria: &OversoldCriteria,
) -> Result<Option<OversoldHit>> {
    let candles = market.ohlc(pair, ohlc_interval).await?;
    let reading = match read_closed_candle(&candles, criteria)? {
        Some(reading) => reading,
        None => {
            debug!("{}: only {} candles, skipping", pair, candles.len());
            return Ok(None);
        }
    };

    if !reading.is_oversold(criteria) || !reading.near_support(criteria) {
        return Ok(None);
    }

    let ticker = market.ticker(pair).await?;
    if !is_rebound_candidate(&ticker, criteria) {
        debug!(
            "{}: oversold but filtered out (price {}, 24h volume {})",
            pair, ticker.last_price, ticker.volume_24h
        );
        return Ok(None);
    }

    // Both are Some once is_oversold and near_support hold.
    let (Some(rsi), Some(stoch_k), Some(support_low)) =
        (reading.rsi, reading.stoch_k, reading.support_low)
    else {
        return Ok(None);
    };

    Ok(Some(OversoldHit {
        pair: pair.to_string(),
        rsi,
        stoch_k,
        close: reading.close,
        support_low,
        last_price: ticker.last_price,
        volume_24h: ticker.volume_24h,
    }))
}

/// Screen every USD pair with at most `workers` pairs in flight. Per-pair
/// failures are logged and skipped. Hits come back sorted by RSI.
pub async fn scan<M: MarketData + ?Sized>(
    market: &M,
    excluded_bases: &[String],
    ohlc_interval: u32,
    criteria: &OversoldCriteria,
    workers: usize,
) -> Result<Vec<OversoldHit>> {
    let pairs = select_usd_pairs(&market.asset_pairs().await?, excluded_bases);
    info!("Scanning {} USD pairs for oversold conditions", pairs.len());

    let outcomes: Vec<(String, Result<Option<OversoldHit>>)> = stream::iter(pairs)
        .map(|pair| async move {
            let outcome = analyze_pair(market, &pair, ohlc_interval, criteria).await;
            (pair, outcome)
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let mut hits = Vec::new();
    let mut failures = 0usize;
    for (pair, outcome) in outcomes {
        match outcome {
            Ok(Some(hit)) => hits.push(hit),
            Ok(None) => {}
            Err(e) => {
                failures += 1;
                warn!("{}: analysis failed: {}", pair, e);
            }
        }
    }
    if failures > 0 {
        warn!("{} pairs could not be analysed this scan", failures);
    }

    hits.sort_by(|a, b| a.rsi.total_cmp(&b.rsi));
    Ok(hits)
}
