//! Kraken market monitors: an oversold mean-reversion screen and a
//! new-listing watch, both alerting by email.

pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod signal;
pub mod store;

pub use config::Config;
pub use error::{KrakenWatchError, Result};
