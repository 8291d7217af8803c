pub mod kraken;
pub mod retry;
