//! Finnhub company-news client.
//!
//! Fetches the trailing week of articles for a symbol and scores each one.
//! All network I/O lives here, outside the forecasting core; the aggregator
//! only ever sees in-memory articles.

use crate::infrastructure::news::aggregator::NewsArticle;
use crate::infrastructure::news::sentiment_analyzer::SentimentAnalyzer;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const LOOKBACK_DAYS: i64 = 7;

/// Raw article shape as returned by the provider.
#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
}

pub struct FinnhubClient {
    http: Client,
    base_url: String,
    api_key: String,
    analyzer: SentimentAnalyzer,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key,
            analyzer: SentimentAnalyzer::new(),
        }
    }

    /// Fetch and score company news for the trailing week.
    pub async fn company_news(&self, symbol: &str) -> Result<Vec<NewsArticle>> {
        let to = Utc::now().date_naive();
        let from = to - Duration::days(LOOKBACK_DAYS);

        let raw: Vec<FinnhubArticle> = self
            .http
            .get(format!("{}/company-news", self.base_url))
            .query(&[
                ("symbol", symbol.to_uppercase().as_str()),
                ("from", from.to_string().as_str()),
                ("to", to.to_string().as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("company-news request failed")?
            .error_for_status()
            .context("company-news request rejected")?
            .json()
            .await
            .context("company-news payload is not valid JSON")?;

        let articles = self.score_articles(raw);
        debug!(symbol, count = articles.len(), "fetched company news");
        Ok(articles)
    }

    fn score_articles(&self, raw: Vec<FinnhubArticle>) -> Vec<NewsArticle> {
        raw.into_iter()
            .filter_map(|item| {
                if item.headline.is_empty() || item.summary.is_empty() || item.datetime == 0 {
                    return None;
                }
                let Some(published_at) = DateTime::from_timestamp(item.datetime, 0) else {
                    warn!(timestamp = item.datetime, "skipping article with bad timestamp");
                    return None;
                };
                let sentiment = self.analyzer.score_article(&item.headline, &item.summary);
                Some(NewsArticle {
                    title: item.headline,
                    source: if item.source.is_empty() {
                        "Finnhub".to_string()
                    } else {
                        item.source
                    },
                    published_at,
                    url: item.url,
                    summary: item.summary,
                    sentiment,
                })
            })
            .collect()
    }
}
