//! Combines the onshore and offshore sources into one snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use cnrates_common::{CombinedRates, CurrencyPair, RateResult};
use tracing::{info, instrument};

use crate::config::UpstreamConfig;
use crate::provider::FallbackRateSource;
use crate::sources::{ChinaMoneySource, JuheSource, SinaQuoteSource};

/// Message reported when every onshore source fails.
pub const ONSHORE_NO_DATA: &str = "no data";

/// Anything that can produce a [`CombinedRates`] snapshot.
#[async_trait]
pub trait CombinedRatesSource: Send + Sync {
    async fn fetch_combined(&self) -> CombinedRates;
}

/// Fetches both pairs and merges them.
pub struct Aggregator {
    onshore: FallbackRateSource,
    offshore: FallbackRateSource,
}

impl Aggregator {
    pub fn new(onshore: FallbackRateSource, offshore: FallbackRateSource) -> Self {
        Self { onshore, offshore }
    }

    /// Build the production sources from configuration.
    pub fn from_config(client: reqwest::Client, config: &UpstreamConfig) -> Self {
        let onshore = FallbackRateSource::new(
            CurrencyPair::usd_cny(),
            Arc::new(ChinaMoneySource::new(
                client.clone(),
                &config.onshore_primary_url,
                config.onshore_timeout,
                &config.user_agent,
            )),
            Arc::new(SinaQuoteSource::new(
                "sina-cny",
                client.clone(),
                &config.onshore_fallback_url,
                config.onshore_timeout,
                &config.user_agent,
            )),
        )
        .with_failure_message(ONSHORE_NO_DATA);

        let offshore = FallbackRateSource::new(
            CurrencyPair::usd_cnh(),
            Arc::new(SinaQuoteSource::new(
                "sina-cnh",
                client.clone(),
                &config.offshore_primary_url,
                config.offshore_primary_timeout,
                &config.user_agent,
            )),
            Arc::new(JuheSource::new(
                client,
                &config.offshore_fallback_url,
                config.offshore_fallback_timeout,
                &config.user_agent,
            )),
        );

        Self::new(onshore, offshore)
    }

    /// USD/CNY alone.
    pub async fn fetch_onshore(&self) -> RateResult {
        self.onshore.fetch().await
    }

    /// USD/CNH alone.
    pub async fn fetch_offshore(&self) -> RateResult {
        self.offshore.fetch().await
    }
}

#[async_trait]
impl CombinedRatesSource for Aggregator {
    #[instrument(skip(self))]
    async fn fetch_combined(&self) -> CombinedRates {
        let (onshore, offshore) = tokio::join!(self.onshore.fetch(), self.offshore.fetch());
        let combined = CombinedRates::merge(&onshore, &offshore);

        info!(
            cny = ?combined.cny(),
            cnh = ?combined.cnh(),
            date = ?combined.date(),
            "Fetched exchange rates"
        );

        combined
    }
}

/// Mock snapshot source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockCombinedSource {
    response: parking_lot::Mutex<CombinedRates>,
    calls: std::sync::atomic::AtomicUsize,
    delay: std::time::Duration,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockCombinedSource {
    pub fn new(response: CombinedRates) -> Self {
        Self {
            response: parking_lot::Mutex::new(response),
            calls: std::sync::atomic::AtomicUsize::new(0),
            delay: std::time::Duration::ZERO,
        }
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_response(&self, response: CombinedRates) {
        *self.response.lock() = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl CombinedRatesSource for MockCombinedSource {
    async fn fetch_combined(&self) -> CombinedRates {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, FetchResult};
    use crate::provider::{MockRateSource, Quote};
    use crate::sources::test_support::{closed_port, serve};
    use crate::sources::USD_CNY_LABEL;
    use axum::{
        routing::{get, post},
        Json, Router,
    };
    use cnrates_common::today;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;

    fn mock(name: &str, response: FetchResult<Quote>) -> Arc<MockRateSource> {
        Arc::new(match response {
            Ok(quote) => MockRateSource::ok(name, quote),
            Err(e) => MockRateSource::failing(name, e),
        })
    }

    fn pair_source(
        pair: CurrencyPair,
        primary: FetchResult<Quote>,
        fallback: FetchResult<Quote>,
    ) -> FallbackRateSource {
        FallbackRateSource::new(pair, mock("primary", primary), mock("fallback", fallback))
            .with_failure_message(ONSHORE_NO_DATA)
    }

    fn down() -> FetchResult<Quote> {
        Err(FetchError::Network("down".into()))
    }

    #[tokio::test]
    async fn test_combined_both_succeed() {
        let aggregator = Aggregator::new(
            pair_source(
                CurrencyPair::usd_cny(),
                Ok(Quote::new(dec!(7.1234), "2024-01-01")),
                down(),
            ),
            pair_source(
                CurrencyPair::usd_cnh(),
                Ok(Quote::new(dec!(7.2345), "2024-01-02")),
                down(),
            ),
        );

        let combined = aggregator.fetch_combined().await;

        assert!(combined.success);
        assert_eq!(combined.cny(), Some(dec!(7.1234)));
        assert_eq!(combined.cnh(), Some(dec!(7.2345)));
        assert_eq!(combined.date(), Some("2024-01-01"));
    }

    #[tokio::test]
    async fn test_combined_onshore_down_uses_offshore_date() {
        let aggregator = Aggregator::new(
            pair_source(CurrencyPair::usd_cny(), down(), down()),
            pair_source(
                CurrencyPair::usd_cnh(),
                down(),
                Ok(Quote::new(dec!(7.25), "2024-01-02")),
            ),
        );

        let combined = aggregator.fetch_combined().await;

        assert!(combined.success);
        assert_eq!(combined.cny(), None);
        assert_eq!(combined.cnh(), Some(dec!(7.25)));
        assert_eq!(combined.date(), Some("2024-01-02"));
    }

    #[tokio::test]
    async fn test_combined_everything_down_is_still_success() {
        let aggregator = Aggregator::new(
            pair_source(CurrencyPair::usd_cny(), down(), down()),
            pair_source(CurrencyPair::usd_cnh(), down(), down()),
        );

        let combined = aggregator.fetch_combined().await;

        assert!(combined.success);
        assert!(!combined.has_any_rate());
        assert_eq!(combined.date(), None);
    }

    #[tokio::test]
    async fn test_from_config_against_local_upstreams() {
        let router = Router::new()
            .route(
                "/ccpr",
                post(|| async { Json(json!({ "records": [{ "date": "2024-01-01", "values": ["7.1234"] }] })) }),
            )
            .route(
                "/sina/fx_susdcnh",
                get(|| async { "var hq_str_fx_susdcnh=\"pair,a,b,c,d,e,f,7.2345\";" }),
            );
        let base = serve(router).await;

        let aggregator =
            Aggregator::from_config(reqwest::Client::new(), &UpstreamConfig::with_base_url(&base));
        let combined = aggregator.fetch_combined().await;

        assert_eq!(combined.cny(), Some(dec!(7.1234)));
        assert_eq!(combined.cnh(), Some(dec!(7.2345)));
        assert_eq!(combined.date(), Some("2024-01-01"));
    }

    #[tokio::test]
    async fn test_from_config_falls_back_per_pair() {
        let router = Router::new()
            .route(
                "/ccpr",
                post(|| async { Json(json!({ "records": [] })) }),
            )
            .route(
                "/sina/fx_susdcny",
                get(|| async { "var hq_str_fx_susdcny=\"pair,a,b,c,d,e,f,7.11115\";" }),
            )
            .route("/sina/fx_susdcnh", get(|| async { "garbage" }))
            .route(
                "/juhe",
                get(|| async { Json(json!({ "result": [{ "name": USD_CNY_LABEL, "price": "7.25" }] })) }),
            );
        let base = serve(router).await;

        let aggregator =
            Aggregator::from_config(reqwest::Client::new(), &UpstreamConfig::with_base_url(&base));

        let onshore = aggregator.fetch_onshore().await;
        assert_eq!(onshore.rate(), Some(dec!(7.1112)));
        assert_eq!(onshore.date(), Some(today().as_str()));

        let offshore = aggregator.fetch_offshore().await;
        assert_eq!(offshore.rate(), Some(dec!(7.25)));
    }

    #[tokio::test]
    async fn test_from_config_non_positive_rate_falls_back() {
        let router = Router::new()
            .route(
                "/sina/fx_susdcnh",
                get(|| async { "var hq_str_fx_susdcnh=\"pair,a,b,c,d,e,f,-7.1\";" }),
            )
            .route(
                "/juhe",
                get(|| async { Json(json!({ "result": [{ "name": USD_CNY_LABEL, "price": "7.25" }] })) }),
            );
        let base = serve(router).await;

        let aggregator =
            Aggregator::from_config(reqwest::Client::new(), &UpstreamConfig::with_base_url(&base));

        let offshore = aggregator.fetch_offshore().await;
        assert_eq!(offshore.rate(), Some(dec!(7.25)));
    }

    #[tokio::test]
    async fn test_from_config_all_upstreams_unreachable() {
        let mut config = UpstreamConfig::with_base_url(&closed_port());
        config.onshore_timeout = Duration::from_millis(500);
        config.offshore_primary_timeout = Duration::from_millis(500);
        config.offshore_fallback_timeout = Duration::from_millis(500);

        let aggregator = Aggregator::from_config(reqwest::Client::new(), &config);

        let onshore = aggregator.fetch_onshore().await;
        assert!(!onshore.is_success());
        assert_eq!(onshore.message(), Some(ONSHORE_NO_DATA));

        let offshore = aggregator.fetch_offshore().await;
        assert!(!offshore.is_success());
        assert!(offshore.message().unwrap().starts_with("Network error"));

        let combined = aggregator.fetch_combined().await;
        assert!(combined.success);
        assert!(!combined.has_any_rate());
    }
}
