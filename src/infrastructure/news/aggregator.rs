//! News selection and sentiment aggregation.
//!
//! Buckets scored articles by sentiment, keeps the most extreme few from
//! each bucket, and summarizes the selection. The selection and ordering
//! rules here are load-bearing for the consuming UI and must not drift:
//! top 4 positive by score descending, top 4 negative by score ascending,
//! top 2 neutral by recency descending, then the union re-sorted by recency
//! descending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scores above this are positive articles; below its negation, negative.
pub const SENTIMENT_THRESHOLD: f64 = 0.3;

const MAX_POSITIVE: usize = 4;
const MAX_NEGATIVE: usize = 4;
const MAX_NEUTRAL: usize = 2;

/// One scored news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,
    #[serde(rename = "publishedAt")]
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub summary: String,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub overall_sentiment: f64,
    pub sentiment_trend: f64,
    pub news_sentiment: f64,
    pub sentiment_distribution: SentimentDistribution,
}

/// Selected articles plus their aggregate sentiment, shaped for a consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsDigest {
    pub articles: Vec<NewsArticle>,
    pub sentiment_analysis: SentimentSummary,
}

/// Apply the bucket caps and return the combined selection, most recent
/// first.
pub fn select_articles(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    let mut neutral = Vec::new();
    for article in articles {
        if article.sentiment > SENTIMENT_THRESHOLD {
            positive.push(article);
        } else if article.sentiment < -SENTIMENT_THRESHOLD {
            negative.push(article);
        } else {
            neutral.push(article);
        }
    }

    positive.sort_by(|a, b| b.sentiment.total_cmp(&a.sentiment));
    negative.sort_by(|a, b| a.sentiment.total_cmp(&b.sentiment));
    neutral.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    positive.truncate(MAX_POSITIVE);
    negative.truncate(MAX_NEGATIVE);
    neutral.truncate(MAX_NEUTRAL);

    let mut selected = positive;
    selected.append(&mut negative);
    selected.append(&mut neutral);
    selected.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    selected
}

/// Summarize an already-selected, recency-ordered article list.
pub fn summarize(selected: &[NewsArticle]) -> SentimentSummary {
    let sentiments: Vec<f64> = selected.iter().map(|a| a.sentiment).collect();

    let overall = if sentiments.is_empty() {
        0.0
    } else {
        sentiments.iter().sum::<f64>() / sentiments.len() as f64
    };

    // Trend compares the newer half against the older half of the
    // recency-sorted selection; the newer half takes the floor on odd counts.
    let trend = if sentiments.len() >= 2 {
        let half = sentiments.len() / 2;
        let recent = &sentiments[..half];
        let older = &sentiments[half..];
        recent.iter().sum::<f64>() / recent.len() as f64
            - older.iter().sum::<f64>() / older.len() as f64
    } else {
        0.0
    };

    let positive = sentiments
        .iter()
        .filter(|&&s| s > SENTIMENT_THRESHOLD)
        .count();
    let negative = sentiments
        .iter()
        .filter(|&&s| s < -SENTIMENT_THRESHOLD)
        .count();
    let neutral = sentiments.len() - positive - negative;

    SentimentSummary {
        overall_sentiment: overall,
        sentiment_trend: trend,
        news_sentiment: overall,
        sentiment_distribution: SentimentDistribution {
            positive,
            neutral,
            negative,
        },
    }
}

/// Select, then summarize.
pub fn digest(articles: Vec<NewsArticle>) -> NewsDigest {
    let selected = select_articles(articles);
    let sentiment_analysis = summarize(&selected);
    NewsDigest {
        articles: selected,
        sentiment_analysis,
    }
}
