//! Sina Finance `hq.sinajs.cn` quote feed.
//!
//! The feed answers with a JavaScript assignment such as
//! `var hq_str_fx_susdcnh="...";` whose quoted string is a comma-separated
//! record. Field 7 holds the latest price.

use std::time::Duration;

use async_trait::async_trait;
use cnrates_common::{parse_rate, today};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{REFERER, USER_AGENT};
use tracing::instrument;

use super::send_for_text;
use crate::error::{FetchError, FetchResult};
use crate::provider::{Quote, RateSource};

/// Index of the price inside the quoted record.
pub const SINA_RATE_FIELD: usize = 7;

const REFERER_URL: &str = "https://finance.sina.com.cn";

/// Quote source backed by one Sina symbol URL.
pub struct SinaQuoteSource {
    name: String,
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    user_agent: String,
}

impl SinaQuoteSource {
    pub fn new(
        name: impl Into<String>,
        client: reqwest::Client,
        url: impl Into<String>,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            url: url.into(),
            timeout,
            user_agent: user_agent.into(),
        }
    }

    /// Turn a feed body into a quote dated today.
    pub fn parse_body(&self, body: &str) -> FetchResult<Quote> {
        let fields = parse_quote_fields(body).ok_or_else(|| {
            FetchError::Parse(format!("{}: no quoted record in response", self.name))
        })?;

        let raw = fields.get(SINA_RATE_FIELD).ok_or_else(|| {
            FetchError::Parse(format!(
                "{}: expected at least {} fields, got {}",
                self.name,
                SINA_RATE_FIELD + 1,
                fields.len()
            ))
        })?;

        let rate = parse_rate(raw).map_err(|e| FetchError::Parse(format!("{}: {e}", self.name)))?;
        Ok(Quote::new(rate, today()))
    }
}

#[async_trait]
impl RateSource for SinaQuoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn fetch_quote(&self) -> FetchResult<Quote> {
        let request = self
            .client
            .get(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .header(REFERER, REFERER_URL)
            .timeout(self.timeout);

        let body = send_for_text(&self.name, request).await?;
        self.parse_body(&body)
    }
}

static QUOTED_RECORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("quoted record pattern is valid"));

/// Split the first non-empty double-quoted string in `body` on commas.
///
/// Returns `None` when the body holds no such string.
pub fn parse_quote_fields(body: &str) -> Option<Vec<&str>> {
    let record = QUOTED_RECORD.captures(body)?.get(1)?;
    Some(record.as_str().split(',').collect())
}
