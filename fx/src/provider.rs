//! Rate source trait and primary/fallback composition.

use std::sync::Arc;

use async_trait::async_trait;
use cnrates_common::{round_rate, CurrencyPair, RateResult};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{FallbackError, FetchError, FetchResult};

/// A rate quoted by one upstream, rounded to four decimal places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub rate: Decimal,
    /// Date the quote applies to, `YYYY-MM-DD`.
    pub date: String,
}

impl Quote {
    pub fn new(rate: Decimal, date: impl Into<String>) -> Self {
        Self {
            rate: round_rate(rate),
            date: date.into(),
        }
    }
}

impl From<Quote> for RateResult {
    fn from(quote: Quote) -> Self {
        RateResult::ok(quote.rate, quote.date)
    }
}

/// Trait for a single upstream quote provider.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch the current quote.
    async fn fetch_quote(&self) -> FetchResult<Quote>;
}

/// What to report when both legs fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureMessage {
    /// Always report this text.
    Fixed(String),
    /// Report the primary leg's error.
    Primary,
}

/// One currency pair served by a primary source with a fallback.
pub struct FallbackRateSource {
    pair: CurrencyPair,
    primary: Arc<dyn RateSource>,
    fallback: Arc<dyn RateSource>,
    on_failure: FailureMessage,
}

impl FallbackRateSource {
    /// Create a new fallback source that reports the primary error on failure.
    pub fn new(
        pair: CurrencyPair,
        primary: Arc<dyn RateSource>,
        fallback: Arc<dyn RateSource>,
    ) -> Self {
        Self {
            pair,
            primary,
            fallback,
            on_failure: FailureMessage::Primary,
        }
    }

    /// Report a fixed message instead of the primary error.
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.on_failure = FailureMessage::Fixed(message.into());
        self
    }

    /// Try the primary source, then the fallback, keeping both errors.
    pub async fn fetch_quote(&self) -> Result<Quote, FallbackError> {
        let primary = match self.primary.fetch_quote().await {
            Ok(quote) => {
                debug!(pair = %self.pair, source = self.primary.name(), rate = %quote.rate, "Got quote");
                return Ok(quote);
            }
            Err(e) => {
                warn!(
                    pair = %self.pair,
                    source = self.primary.name(),
                    kind = e.kind(),
                    error = %e,
                    "Primary source failed, trying fallback"
                );
                e
            }
        };

        match self.fallback.fetch_quote().await {
            Ok(quote) => {
                debug!(pair = %self.pair, source = self.fallback.name(), rate = %quote.rate, "Got quote from fallback");
                Ok(quote)
            }
            Err(fallback) => {
                warn!(
                    pair = %self.pair,
                    source = self.fallback.name(),
                    kind = fallback.kind(),
                    error = %fallback,
                    "Fallback source failed"
                );
                Err(FallbackError { primary, fallback })
            }
        }
    }

    /// Fetch and flatten into a [`RateResult`]. Never fails.
    pub async fn fetch(&self) -> RateResult {
        match self.fetch_quote().await {
            Ok(quote) => quote.into(),
            Err(e) => RateResult::failed(self.failure_message(&e.primary)),
        }
    }

    fn failure_message(&self, primary: &FetchError) -> String {
        match &self.on_failure {
            FailureMessage::Fixed(message) => message.clone(),
            FailureMessage::Primary => primary.to_string(),
        }
    }
}

/// Mock rate source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    response: parking_lot::Mutex<FetchResult<Quote>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// A source that always returns `quote`.
    pub fn ok(name: impl Into<String>, quote: Quote) -> Self {
        Self::with_response(name, Ok(quote))
    }

    /// A source that always fails with `error`.
    pub fn failing(name: impl Into<String>, error: FetchError) -> Self {
        Self::with_response(name, Err(error))
    }

    fn with_response(name: impl Into<String>, response: FetchResult<Quote>) -> Self {
        Self {
            name: name.into(),
            response: parking_lot::Mutex::new(response),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Replace the response returned by later calls.
    pub fn set_response(&self, response: FetchResult<Quote>) {
        *self.response.lock() = response;
    }

    /// Number of times the source was asked for a quote.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_quote(&self) -> FetchResult<Quote> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.response.lock().clone()
    }
}
