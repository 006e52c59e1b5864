//! CFETS (chinamoney.com.cn) central parity history, the onshore primary.

use std::time::Duration;

use async_trait::async_trait;
use cnrates_common::today;
use reqwest::header::{ACCEPT, ORIGIN, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::{decimal_from_json, send_for_text};
use crate::error::{FetchError, FetchResult};
use crate::provider::{Quote, RateSource};

const ORIGIN_URL: &str = "https://www.chinamoney.com.cn";

/// Query body for one day of USD/CNY history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CcprQuery<'a> {
    start_date: &'a str,
    end_date: &'a str,
    currency: &'a str,
    page_num: u32,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct CcprResponse {
    #[serde(default)]
    records: Vec<CcprRecord>,
}

#[derive(Debug, Deserialize)]
struct CcprRecord {
    date: String,
    #[serde(default)]
    values: Vec<Value>,
}

pub struct ChinaMoneySource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    user_agent: String,
}

impl ChinaMoneySource {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
            user_agent: user_agent.into(),
        }
    }

    /// Take the first value of the first record, dated by the record.
    pub fn parse_body(&self, body: &str) -> FetchResult<Quote> {
        let response: CcprResponse = serde_json::from_str(body)
            .map_err(|e| FetchError::Parse(format!("chinamoney: {e}")))?;

        let record = response
            .records
            .first()
            .ok_or_else(|| FetchError::NotFound("chinamoney: no records".to_string()))?;

        let value = record.values.first().ok_or_else(|| {
            FetchError::NotFound(format!("chinamoney: record {} has no values", record.date))
        })?;

        Ok(Quote::new(
            decimal_from_json("chinamoney", value)?,
            record.date.clone(),
        ))
    }
}

#[async_trait]
impl RateSource for ChinaMoneySource {
    fn name(&self) -> &str {
        "chinamoney"
    }

    #[instrument(skip(self))]
    async fn fetch_quote(&self) -> FetchResult<Quote> {
        let today = today();
        let query = CcprQuery {
            start_date: &today,
            end_date: &today,
            currency: "USD/CNY",
            page_num: 1,
            page_size: 1,
        };

        let request = self
            .client
            .post(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .header(ORIGIN, ORIGIN_URL)
            .json(&query)
            .timeout(self.timeout);

        let body = send_for_text("chinamoney", request).await?;
        self.parse_body(&body)
    }
}
