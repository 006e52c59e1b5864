//! cnrates FX
//!
//! Fetches the onshore (USD/CNY) and offshore (USD/CNH) renminbi rates.
//!
//! # Features
//!
//! - One primary and one fallback upstream per pair
//! - Typed per-attempt errors flattened into `RateResult` at the pair boundary
//! - Concurrent aggregation of both pairs into a `CombinedRates` snapshot
//! - Snapshot caching with a configurable window (5 minutes by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cnrates_fx::{Aggregator, RateCache, UpstreamConfig};
//!
//! let aggregator = Aggregator::from_config(reqwest::Client::new(), &UpstreamConfig::default());
//! let cache = RateCache::new(Arc::new(aggregator));
//!
//! let rates = cache.get_rates().await;
//! println!("CNY = {:?}, CNH = {:?}", rates.cny(), rates.cnh());
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod provider;
pub mod sources;

pub use aggregator::{Aggregator, CombinedRatesSource};
pub use cache::{RateCache, RateCacheConfig, SharedRateCache};
pub use config::UpstreamConfig;
pub use error::{FallbackError, FetchError, FetchResult};
pub use provider::{FallbackRateSource, Quote, RateSource};

#[cfg(any(test, feature = "test-utils"))]
pub use aggregator::MockCombinedSource;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateSource;
