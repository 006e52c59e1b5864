//! Currency and rate value types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{InvalidRate, Result};

/// Number of decimal places every published rate is rounded to.
pub const RATE_DECIMAL_PLACES: u32 = 4;

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    /// Onshore renminbi, traded on the mainland market.
    pub fn cny() -> Self {
        Self::new("CNY")
    }

    /// Offshore renminbi, traded outside the mainland.
    pub fn cnh() -> Self {
        Self::new("CNH")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A currency pair for FX quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency.
    pub base: Currency,
    /// Quote currency (pricing currency).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// USD/CNY, the onshore pair.
    pub fn usd_cny() -> Self {
        Self::new(Currency::usd(), Currency::cny())
    }

    /// USD/CNH, the offshore pair.
    pub fn usd_cnh() -> Self {
        Self::new(Currency::usd(), Currency::cnh())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Round a rate to [`RATE_DECIMAL_PLACES`].
pub fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp(RATE_DECIMAL_PLACES)
}

/// Parse a textual rate as quoted by upstream feeds.
///
/// Surrounding whitespace is ignored and scientific notation is accepted.
/// Zero and negative values are rejected. The value is not rounded.
pub fn parse_rate(value: &str) -> Result<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InvalidRate::new(trimmed));
    }

    let rate = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| InvalidRate::new(trimmed))?;
    check_rate(rate).map_err(|_| InvalidRate::new(trimmed))
}

fn check_rate(rate: Decimal) -> Result<Decimal> {
    if rate > Decimal::ZERO {
        Ok(rate)
    } else {
        Err(InvalidRate::new(rate.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pair_display() {
        assert_eq!(CurrencyPair::usd_cny().to_string(), "USD/CNY");
        assert_eq!(CurrencyPair::usd_cnh().to_string(), "USD/CNH");
        assert_eq!(Currency::new("cnh"), Currency::cnh());
    }

    #[test]
    fn test_round_rate() {
        assert_eq!(round_rate(dec!(7.123449)), dec!(7.1234));
        assert_eq!(round_rate(dec!(7.12346)), dec!(7.1235));
        assert_eq!(round_rate(dec!(7.25)), dec!(7.25));
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("7.1234").unwrap(), dec!(7.1234));
        assert_eq!(parse_rate(" 7.2 \n").unwrap(), dec!(7.2));
        assert_eq!(parse_rate("7.1e0").unwrap(), dec!(7.1));
    }

    #[test]
    fn test_parse_rate_rejects_garbage() {
        assert!(parse_rate("").is_err());
        assert!(parse_rate("   ").is_err());
        assert!(parse_rate("n/a").is_err());
        assert_eq!(parse_rate("--").unwrap_err().value, "--");
    }

    #[test]
    fn test_parse_rate_rejects_non_positive() {
        assert_eq!(parse_rate("-7.1").unwrap_err().value, "-7.1");
        assert!(parse_rate("0").is_err());
        assert!(parse_rate("0.0000").is_err());
        assert!(check_rate(dec!(-0.5)).is_err());
        assert_eq!(check_rate(dec!(7.1)).unwrap(), dec!(7.1));
    }

    proptest! {
        #[test]
        fn rounded_rates_never_exceed_four_places(mantissa in 0i64..100_000_000_000, scale in 0u32..10) {
            let rate = round_rate(Decimal::new(mantissa, scale));
            prop_assert!(rate.scale() <= RATE_DECIMAL_PLACES);
        }
    }
}
