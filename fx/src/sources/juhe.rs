//! Juhe exchange list, used as the offshore fallback.

use std::time::Duration;

use async_trait::async_trait;
use cnrates_common::today;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::{decimal_from_json, send_for_text};
use crate::error::{FetchError, FetchResult};
use crate::provider::{Quote, RateSource};

/// Entry name Juhe uses for the dollar against the renminbi.
pub const USD_CNY_LABEL: &str = "美元/人民币";

#[derive(Debug, Deserialize)]
struct JuheResponse {
    #[serde(default)]
    result: Option<Vec<JuheEntry>>,
}

#[derive(Debug, Deserialize)]
struct JuheEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Option<Value>,
}

pub struct JuheSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    user_agent: String,
}

impl JuheSource {
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

    /// Find the USD/CNY entry in a response body.
    pub fn parse_body(&self, body: &str) -> FetchResult<Quote> {
        let response: JuheResponse = serde_json::from_str(body)
            .map_err(|e| FetchError::Parse(format!("juhe: {e}")))?;

        let entries = response
            .result
            .ok_or_else(|| FetchError::NotFound("juhe: response has no result list".to_string()))?;

        let entry = entries
            .iter()
            .find(|entry| entry.name.as_deref() == Some(USD_CNY_LABEL))
            .ok_or_else(|| FetchError::NotFound(format!("juhe: no {USD_CNY_LABEL} entry")))?;

        let price = entry
            .price
            .as_ref()
            .ok_or_else(|| FetchError::Parse("juhe: entry has no price".to_string()))?;

        Ok(Quote::new(decimal_from_json("juhe", price)?, today()))
    }
}

#[async_trait]
impl RateSource for JuheSource {
    fn name(&self) -> &str {
        "juhe"
    }

    #[instrument(skip(self))]
    async fn fetch_quote(&self) -> FetchResult<Quote> {
        let request = self
            .client
            .get(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout);

        let body = send_for_text("juhe", request).await?;
        self.parse_body(&body)
    }
}
