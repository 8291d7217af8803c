pub mod email;
pub mod ledger;
pub mod listing_log;

use crate::config::EmailConfig;
use crate::error::Result;
use crate::signal::OversoldHit;
use async_trait::async_trait;
use log::info;
use num_format::{Locale, ToFormattedString};

pub use email::EmailSink;
pub use ledger::AlertLedger;
pub use listing_log::ListingLog;

const FOOTER: &str = "This is an automated alert.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

impl Alert {
    pub fn new_listings(pairs: &[String]) -> Self {
        Alert {
            subject: "Kraken New Listing Alert".to_string(),
            body: format!(
                "New Kraken asset pairs detected:\n\n{}\n\n{}",
                pairs.join("\n"),
                FOOTER
            ),
        }
    }

    pub fn oversold(hits: &[OversoldHit]) -> Self {
        let lines: Vec<String> = hits
            .iter()
            .map(|hit| {
                format!(
                    "{} | last {} | 24h volume {} | support {}",
                    hit.summary(),
                    format_price(hit.last_price),
                    (hit.volume_24h.round() as u64).to_formatted_string(&Locale::en),
                    format_price(hit.support_low),
                )
            })
            .collect();
        Alert {
            subject: format!("Kraken Oversold Alert ({} pairs)", hits.len()),
            body: format!(
                "Oversold Kraken pairs near support:\n\n{}\n\n{}",
                lines.join("\n"),
                FOOTER
            ),
        }
    }
}

fn format_price(price: f64) -> String {
    if price >= 100.0 {
        format!("{:.2}", price)
    } else {
        format!("{:.4}", price)
    }
}

/// Where alerts go once a signal fires.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<()>;
}

/// Used when email is disabled or for dry runs.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn send(&self, alert: &Alert) -> Result<()> {
        info!("[ALERT] {}\n{}", alert.subject, alert.body);
        Ok(())
    }
}

pub fn build_sink(
    config: &EmailConfig,
    retry: &crate::api::retry::RetryPolicy,
    dry_run: bool,
) -> Result<Box<dyn AlertSink>> {
    if dry_run || !config.enabled {
        info!("Email delivery disabled; alerts will be logged only");
        return Ok(Box::new(LogSink));
    }
    Ok(Box::new(EmailSink::new(config, retry.clone())?))
}
