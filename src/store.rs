//! Small JSON state files.
//!
//! Writes go to a sibling `.tmp` file which is synced and then renamed
//! over the target, so a crash mid-write leaves the previous state intact.

use crate::error::Result;
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut file = File::create(&tmp_path)?;
        serde_json::to_writer(&mut file, value)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Pair names already reported by the listing monitor.
#[derive(Debug)]
pub struct SeenPairs {
    path: PathBuf,
    pairs: BTreeSet<String>,
    has_baseline: bool,
}

impl SeenPairs {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stored: Option<Vec<String>> = read_json(&path)?;
        let has_baseline = stored.is_some();
        let pairs: BTreeSet<String> = stored.unwrap_or_default().into_iter().collect();
        if has_baseline {
            info!("Loaded {} known pairs from {}", pairs.len(), path.display());
        } else {
            info!("No pair state at {}, starting without a baseline", path.display());
        }
        Ok(Self {
            path,
            pairs,
            has_baseline,
        })
    }

    /// False until a pair set has been loaded from or written to disk.
    pub fn has_baseline(&self) -> bool {
        self.has_baseline
    }

    pub fn pairs(&self) -> &BTreeSet<String> {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, pairs: I) {
        self.pairs.extend(pairs);
    }

    pub fn save(&mut self) -> Result<()> {
        let list: Vec<&String> = self.pairs.iter().collect();
        write_json_atomic(&self.path, &list)?;
        self.has_baseline = true;
        Ok(())
    }
}
