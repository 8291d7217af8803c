pub mod rest;
pub mod types;

pub use rest::{KrakenClient, MarketData};
pub use types::{AssetPair, AssetPairs, Candle, Ticker};
