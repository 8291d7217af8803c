use super::Monitor;
use crate::alerts::{Alert, AlertLedger, AlertSink};
use crate::api::kraken::MarketData;
use crate::config::OversoldConfig;
use crate::error::Result;
use crate::signal::oversold::scan;
use crate::signal::OversoldHit;
use async_trait::async_trait;
use chrono::Utc;
use log::info;

/// Periodic oversold screen with per-pair alert cooldown.
pub struct OversoldMonitor {
    market: Box<dyn MarketData>,
    config: OversoldConfig,
    ledger: AlertLedger,
    sink: Box<dyn AlertSink>,
    last_hits: Vec<OversoldHit>,
}

impl OversoldMonitor {
    pub fn new(
        market: Box<dyn MarketData>,
        config: OversoldConfig,
        ledger: AlertLedger,
        sink: Box<dyn AlertSink>,
    ) -> Self {
        Self {
            market,
            config,
            ledger,
            sink,
            last_hits: Vec::new(),
        }
    }

    /// Hits from the most recent scan, alerted or not.
    pub fn last_hits(&self) -> &[OversoldHit] {
        &self.last_hits
    }
}

fn report(hits: &[OversoldHit]) {
    info!("Oversold coins:");
    for hit in hits {
        info!("{}", hit.summary());
    }
}

#[async_trait]
impl Monitor for OversoldMonitor {
    fn name(&self) -> &'static str {
        "oversold"
    }

    async fn tick(&mut self) -> Result<usize> {
        let hits = scan(
            self.market.as_ref(),
            &self.config.excluded_bases,
            self.config.ohlc_interval,
            &self.config.criteria,
            self.config.workers,
        )
        .await?;
        report(&hits);

        let now = Utc::now().timestamp();
        let fresh: Vec<OversoldHit> = self
            .ledger
            .fresh(&hits, now)
            .into_iter()
            .cloned()
            .collect();
        let suppressed = hits.len() - fresh.len();
        if suppressed > 0 {
            info!("{} pairs still within alert cooldown", suppressed);
        }
        self.last_hits = hits;

        if fresh.is_empty() {
            return Ok(0);
        }

        self.sink.send(&Alert::oversold(&fresh)).await?;
        self.ledger.record(fresh.iter().map(|h| h.pair.as_str()), now);
        self.ledger.save()?;
        Ok(fresh.len())
    }
}
