//! Rate snapshots exchanged between the fetch layer and the HTTP layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::monetary::round_rate;

/// Outcome of fetching one currency pair.
///
/// Built only through [`RateResult::ok`] and [`RateResult::failed`], so a
/// successful result always carries a rate and a date and a failed one always
/// carries a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateResult {
    success: bool,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl RateResult {
    /// A successful fetch.
    pub fn ok(rate: Decimal, date: impl Into<String>) -> Self {
        Self {
            success: true,
            rate: Some(rate),
            date: Some(date.into()),
            message: None,
        }
    }

    /// A failed fetch with a human-readable reason.
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            rate: None,
            date: None,
            message: Some(if message.is_empty() {
                "unknown error".to_string()
            } else {
                message
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn rate(&self) -> Option<Decimal> {
        self.rate
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Per-currency rates keyed by quote currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currencies {
    /// Onshore USD/CNY.
    #[serde(rename = "CNY", default, with = "rust_decimal::serde::float_option")]
    pub cny: Option<Decimal>,
    /// Offshore USD/CNH.
    #[serde(rename = "CNH", default, with = "rust_decimal::serde::float_option")]
    pub cnh: Option<Decimal>,
}

/// The central-parity block of the response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentralRates {
    pub currencies: Currencies,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatesData {
    pub central: CentralRates,
}

/// Combined onshore and offshore snapshot served to clients.
///
/// Missing individual rates are `None`; they never turn the whole snapshot
/// into a failure. `success: false` is reserved for failures of the snapshot
/// itself and carries a `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedRates {
    pub success: bool,
    pub data: RatesData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CombinedRates {
    /// Merge the onshore and offshore results.
    ///
    /// The date prefers the onshore result and falls back to the offshore one.
    pub fn merge(onshore: &RateResult, offshore: &RateResult) -> Self {
        let pick = |result: &RateResult| {
            if result.is_success() {
                result.rate().map(round_rate)
            } else {
                None
            }
        };

        let date = onshore
            .date()
            .or_else(|| offshore.date())
            .map(str::to_string);

        Self {
            success: true,
            data: RatesData {
                central: CentralRates {
                    currencies: Currencies {
                        cny: pick(onshore),
                        cnh: pick(offshore),
                    },
                    date,
                },
            },
            message: None,
        }
    }

    /// A snapshot that could not be produced at all.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: RatesData::default(),
            message: Some(message.into()),
        }
    }

    pub fn cny(&self) -> Option<Decimal> {
        self.data.central.currencies.cny
    }

    pub fn cnh(&self) -> Option<Decimal> {
        self.data.central.currencies.cnh
    }

    pub fn date(&self) -> Option<&str> {
        self.data.central.date.as_deref()
    }

    /// True if at least one rate is present.
    pub fn has_any_rate(&self) -> bool {
        self.cny().is_some() || self.cnh().is_some()
    }
}
