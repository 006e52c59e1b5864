//! cnrates Common Types
//!
//! Shared types used across the cnrates workspace: currency pairs, the
//! per-source `RateResult`, the combined `CombinedRates` snapshot served over
//! HTTP, and date helpers.

pub mod monetary;
pub mod rates;
pub mod error;
pub mod time;

pub use monetary::*;
pub use rates::*;
pub use error::*;
pub use time::*;
