//! Oscillator series over OHLC candles.
//!
//! Every series has one entry per input row; entries are `None` until the
//! indicator's warm-up is complete so that a partially seeded value can
//! never satisfy a threshold.

use crate::api::kraken::Candle;
use crate::error::{KrakenWatchError, Result};
use ta::{
    indicators::{FastStochastic, RelativeStrengthIndex, SimpleMovingAverage},
    Close, High, Low, Next,
};

impl High for Candle {
    fn high(&self) -> f64 {
        self.high
    }
}

impl Low for Candle {
    fn low(&self) -> f64 {
        self.low
    }
}

impl Close for Candle {
    fn close(&self) -> f64 {
        self.close
    }
}

fn indicator_error<E: std::fmt::Debug>(name: &str, err: E) -> KrakenWatchError {
    KrakenWatchError::IndicatorError(format!("{}: {:?}", name, err))
}

/// Wilder RSI of `closes`; defined once `length` price changes have been seen.
pub fn rsi_series(closes: &[f64], length: usize) -> Result<Vec<Option<f64>>> {
    if length == 0 {
        return Err(KrakenWatchError::IndicatorError(
            "RSI: length must be at least 1".to_string(),
        ));
    }
    // ta smooths with alpha 2/(p+1); p = 2n-1 gives Wilder's alpha 1/n.
    let mut rsi = RelativeStrengthIndex::new(2 * length - 1)
        .map_err(|e| indicator_error("RSI", e))?;
    Ok(closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let value = rsi.next(close);
            (i >= length).then_some(value)
        })
        .collect())
}

/// Stochastic %K over `k` rows, smoothed by an SMA of `d` (the slow %K line).
pub fn stoch_k_series(candles: &[Candle], k: usize, d: usize) -> Result<Vec<Option<f64>>> {
    let mut fast = FastStochastic::new(k).map_err(|e| indicator_error("stochastic", e))?;
    let mut smooth = SimpleMovingAverage::new(d).map_err(|e| indicator_error("stochastic", e))?;
    let warmup = k + d - 2;

    Ok(candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let raw = fast.next(candle);
            // The smoother only sees %K values computed over a full window.
            if i + 1 < k {
                return None;
            }
            let smoothed = smooth.next(raw);
            (i >= warmup).then_some(smoothed)
        })
        .collect())
}

/// Minimum of the trailing `window` values, defined once the window is full.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i].iter().copied().reduce(f64::min)
        })
        .collect()
}
