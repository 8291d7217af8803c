use chrono::Local;
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Append-only record of every new pair ever detected.
#[derive(Debug, Clone)]
pub struct ListingLog {
    path: PathBuf,
}

impl ListingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn line(pair: &str) -> String {
        format!(
            "{} - NEW PAIR LISTED: {}",
            Local::now().format("%a %b %e %H:%M:%S %Y"),
            pair
        )
    }

    /// Logs every pair; a file that cannot be written only costs the file copy.
    pub fn record(&self, pairs: &[String]) {
        for pair in pairs {
            info!("[ALERT] New Kraken Pair: {}", pair);
        }

        let written = self.append(pairs);
        if let Err(e) = written {
            warn!(
                "Could not append {} pairs to {}: {}",
                pairs.len(),
                self.path.display(),
                e
            );
        }
    }

    fn append(&self, pairs: &[String]) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for pair in pairs {
            writeln!(file, "{}", Self::line(pair))?;
        }
        Ok(())
    }
}
