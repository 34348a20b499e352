use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};
use trendcast::application::ml::MovementClassifier;
use trendcast::config::ForecastConfig;
use trendcast::domain::market::bar::Bar;
use trendcast::infrastructure::news::aggregator;
use trendcast::infrastructure::news::finnhub::FinnhubClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "Three-way price movement forecaster", long_about = None)]
struct Args {
    /// Path to OHLCV bar CSV (columns: open,high,low,close,volume)
    #[arg(long, default_value = "data/bars.csv")]
    input: PathBuf,

    /// Run a chronological hold-out evaluation with this test fraction
    #[arg(long, value_parser = parse_test_fraction)]
    evaluate: Option<f64>,

    /// Fetch and aggregate recent company news (requires FINNHUB_API_KEY)
    #[arg(long)]
    news: bool,
}

/// The classifier asserts on an out-of-range fraction, so reject bad flag
/// values at the CLI boundary instead.
fn parse_test_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("test fraction must be inside (0, 1), got {value}"))
    }
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn load_bars(path: &PathBuf) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let record: BarRecord = record.context("Failed to parse bar row")?;
        bars.push(Bar::new(
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }
    Ok(bars)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ForecastConfig::from_env()?;

    let bars = load_bars(&args.input)?;
    info!(bars = bars.len(), symbol = %config.symbol, "loaded bar series");

    let mut classifier = MovementClassifier::new(config.classifier_params());
    classifier.train(&bars);

    let forecast = classifier.predict(&bars);
    println!("{}", serde_json::to_string_pretty(&forecast)?);

    if let Some(test_fraction) = args.evaluate {
        match classifier.evaluate(&bars, test_fraction) {
            Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
            None => warn!("evaluation skipped: not enough clean rows for the split"),
        }
    }

    if args.news {
        anyhow::ensure!(
            !config.finnhub_api_key.is_empty(),
            "FINNHUB_API_KEY is required for --news"
        );
        let client = FinnhubClient::new(config.finnhub_api_key.clone());
        let articles = client.company_news(&config.symbol).await?;
        let digest = aggregator::digest(articles);
        println!("{}", serde_json::to_string_pretty(&digest)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fractions_parse() {
        assert_eq!(parse_test_fraction("0.2"), Ok(0.2));
        assert_eq!(parse_test_fraction("0.999"), Ok(0.999));
    }

    #[test]
    fn test_out_of_range_fractions_are_rejected() {
        assert!(parse_test_fraction("0").is_err());
        assert!(parse_test_fraction("1").is_err());
        assert!(parse_test_fraction("1.5").is_err());
        assert!(parse_test_fraction("-0.2").is_err());
    }

    #[test]
    fn test_non_numeric_fraction_is_rejected() {
        assert!(parse_test_fraction("all").is_err());
        assert!(parse_test_fraction("").is_err());
    }
}
