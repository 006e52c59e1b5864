//! One-shot upstream check, run by `cnrates probe`.

use cnrates_common::{CombinedRates, RateResult};
use cnrates_fx::Aggregator;
use serde::Serialize;
use tracing::{info, warn};

/// What every upstream pair returned during a probe.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub onshore: RateResult,
    pub offshore: RateResult,
    pub combined: CombinedRates,
}

impl ProbeReport {
    /// At least one pair produced a rate.
    pub fn is_healthy(&self) -> bool {
        self.combined.has_any_rate()
    }
}

/// Fetch both pairs once, bypassing the cache.
pub async fn run(aggregator: &Aggregator) -> ProbeReport {
    let (onshore, offshore) = tokio::join!(aggregator.fetch_onshore(), aggregator.fetch_offshore());

    for (pair, result) in [("USD/CNY", &onshore), ("USD/CNH", &offshore)] {
        match result.rate() {
            Some(rate) => info!(pair, rate = %rate, date = ?result.date(), "Probe succeeded"),
            None => warn!(pair, message = ?result.message(), "Probe failed"),
        }
    }

    let combined = CombinedRates::merge(&onshore, &offshore);
    ProbeReport {
        onshore,
        offshore,
        combined,
    }
}
