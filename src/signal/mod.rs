pub mod indicators;
pub mod listings;
pub mod oversold;

pub use oversold::{OversoldCriteria, OversoldHit};
