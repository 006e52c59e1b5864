//! cnrates Server
//!
//! HTTP front end for the rate cache. Handlers only ever see `CombinedRates`
//! snapshots handed out by `RateCache::get_rates`.

pub mod config;
pub mod probe;
pub mod routes;

pub use config::{ConfigError, LegacyApiConfig, ServerConfig};
pub use routes::{router, AppState};
