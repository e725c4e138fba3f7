// src/ingest/providers/newsapi.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;

use crate::error::NewsError;
use crate::ingest::types::{SearchPage, SearchProvider, SearchQuery};

pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// NewsAPI `/v2/everything` client.
pub struct NewsApiProvider {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl NewsApiProvider {
    /// `timeout` bounds each request; the provider enforces its own limits too.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("news-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building newsapi http client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl SearchProvider for NewsApiProvider {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let t0 = std::time::Instant::now();
        let mut params = query.params();
        params.push(("apiKey", self.api_key.clone()));

        let resp = match self.client.get(&self.endpoint).query(&params).send().await {
            Ok(r) => r,
            Err(e) => {
                counter!("newsapi_http_errors_total").increment(1);
                return Err(e).context("newsapi http get()");
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            counter!("newsapi_http_errors_total").increment(1);
            return Err(NewsError::Transport {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let page: SearchPage = resp.json().await.context("decoding newsapi page")?;
        histogram!("newsapi_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(page)
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}
