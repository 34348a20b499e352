pub mod aggregator;
pub mod finnhub;
pub mod sentiment_analyzer;
