//! Upstream quote providers.
//!
//! Each provider owns its response schema and turns it into a [`Quote`] or a
//! typed [`FetchError`].
//!
//! [`Quote`]: crate::provider::Quote
//! [`FetchError`]: crate::error::FetchError

mod chinamoney;
mod juhe;
mod sina;

pub use chinamoney::ChinaMoneySource;
pub use juhe::{JuheSource, USD_CNY_LABEL};
pub use sina::{parse_quote_fields, SinaQuoteSource, SINA_RATE_FIELD};

use cnrates_common::parse_rate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{FetchError, FetchResult};

/// Send a request and return the body of a successful response.
pub(crate) async fn send_for_text(
    source: &str,
    request: reqwest::RequestBuilder,
) -> FetchResult<String> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(source, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Network(format!(
            "{source}: upstream returned status {status}"
        )));
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(source, e))
}

/// Read a rate that upstream JSON may encode as a string or a number.
pub(crate) fn decimal_from_json(source: &str, value: &Value) -> FetchResult<Decimal> {
    let parsed = match value {
        Value::String(text) => parse_rate(text),
        Value::Number(number) => parse_rate(&number.to_string()),
        other => {
            return Err(FetchError::Parse(format!(
                "{source}: expected a numeric rate, got {other}"
            )))
        }
    };

    parsed.map_err(|e| FetchError::Parse(format!("{source}: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serve `router` on a loopback port and return its base URL.
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// A base URL nothing listens on.
    pub fn closed_port() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_from_json() {
        assert_eq!(decimal_from_json("t", &json!("7.25")).unwrap(), dec!(7.25));
        assert_eq!(decimal_from_json("t", &json!(7.1234)).unwrap(), dec!(7.1234));
        assert_eq!(decimal_from_json("t", &json!(7)).unwrap(), dec!(7));
    }

    #[test]
    fn test_decimal_from_json_rejects_non_numbers() {
        assert!(matches!(
            decimal_from_json("t", &json!(null)),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            decimal_from_json("t", &json!("--")),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_decimal_from_json_rejects_non_positive() {
        assert!(matches!(
            decimal_from_json("t", &json!(-7.1)),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            decimal_from_json("t", &json!("0")),
            Err(FetchError::Parse(_))
        ));
    }
}
