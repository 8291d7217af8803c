use crate::error::Result;
use crate::signal::OversoldHit;
use crate::store::{read_json, write_json_atomic};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Remembers when each pair was last alerted so a pair that stays
/// oversold across scans is reported once per cooldown.
#[derive(Debug)]
pub struct AlertLedger {
    path: PathBuf,
    cooldown: Duration,
    last_alerted: BTreeMap<String, i64>,
}

impl AlertLedger {
    pub fn load(path: impl Into<PathBuf>, cooldown: Duration) -> Result<Self> {
        let path = path.into();
        let last_alerted = read_json(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            cooldown,
            last_alerted,
        })
    }

    pub fn is_suppressed(&self, pair: &str, now: i64) -> bool {
        self.last_alerted
            .get(pair)
            .map_or(false, |&at| now - at < self.cooldown.as_secs() as i64)
    }

    pub fn fresh<'a>(&self, hits: &'a [OversoldHit], now: i64) -> Vec<&'a OversoldHit> {
        hits.iter()
            .filter(|hit| !self.is_suppressed(&hit.pair, now))
            .collect()
    }

    /// Mark pairs as alerted and drop entries whose cooldown has lapsed.
    pub fn record<'a, I>(&mut self, pairs: I, now: i64)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for pair in pairs {
            self.last_alerted.insert(pair.to_string(), now);
        }
        let cooldown = self.cooldown.as_secs() as i64;
        self.last_alerted.retain(|_, at| now - *at < cooldown);
    }

    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.last_alerted)
    }

    pub fn len(&self) -> usize {
        self.last_alerted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alerted.is_empty()
    }
}
