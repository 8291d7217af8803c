use super::Monitor;
use crate::alerts::{Alert, AlertSink, ListingLog};
use crate::api::kraken::MarketData;
use crate::error::Result;
use crate::signal::listings::diff;
use crate::store::SeenPairs;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Reports trading pairs that appear on the exchange for the first time.
pub struct ListingMonitor {
    market: Box<dyn MarketData>,
    seen: SeenPairs,
    log: ListingLog,
    sink: Box<dyn AlertSink>,
    alert_on_bootstrap: bool,
    /// Written to the listing log but not yet delivered.
    pending: BTreeSet<String>,
}

impl ListingMonitor {
    pub fn new(
        market: Box<dyn MarketData>,
        seen: SeenPairs,
        log: ListingLog,
        sink: Box<dyn AlertSink>,
        alert_on_bootstrap: bool,
    ) -> Self {
        Self {
            market,
            seen,
            log,
            sink,
            alert_on_bootstrap,
            pending: BTreeSet::new(),
        }
    }

    pub fn seen(&self) -> &SeenPairs {
        &self.seen
    }
}

#[async_trait]
impl Monitor for ListingMonitor {
    fn name(&self) -> &'static str {
        "listings"
    }

    async fn tick(&mut self) -> Result<usize> {
        let current: BTreeSet<String> = self.market.asset_pairs().await?.into_keys().collect();
        if current.is_empty() {
            warn!("Exchange returned no asset pairs; skipping this cycle");
            return Ok(0);
        }

        if !self.seen.has_baseline() && !self.alert_on_bootstrap {
            info!("Recording baseline of {} pairs", current.len());
            self.seen.extend(current);
            self.seen.save()?;
            return Ok(0);
        }

        let new_pairs = diff(&current, self.seen.pairs());
        if new_pairs.is_empty() {
            debug!("No new pairs among {}", current.len());
            return Ok(0);
        }

        let unlogged: Vec<String> = new_pairs
            .iter()
            .filter(|p| !self.pending.contains(*p))
            .cloned()
            .collect();
        self.log.record(&unlogged);
        self.pending.extend(unlogged);

        self.sink.send(&Alert::new_listings(&new_pairs)).await?;

        self.seen.extend(new_pairs.iter().cloned());
        self.seen.save()?;
        self.pending.clear();
        Ok(new_pairs.len())
    }
}
