use crate::application::ml::classifier::ClassifierParams;
use crate::application::ml::forest::ForestConfig;
use anyhow::{Context, Result};
use std::env;

/// Runtime configuration, sourced from the environment (and `.env` via
/// dotenvy at startup). Every knob has a default so the forecaster runs
/// without any environment at all; FINNHUB_API_KEY is only required when
/// news is requested.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub symbol: String,
    pub lookahead: usize,
    pub movement_threshold: f64,
    pub min_training_bars: usize,
    pub min_clean_rows: usize,
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
    pub finnhub_api_key: String,
}

impl ForecastConfig {
    pub fn from_env() -> Result<Self> {
        let symbol = env::var("SYMBOL").unwrap_or_else(|_| "AAPL".to_string());

        let lookahead = env::var("LOOKAHEAD_BARS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<usize>()
            .context("Failed to parse LOOKAHEAD_BARS")?;

        let movement_threshold = env::var("MOVEMENT_THRESHOLD")
            .unwrap_or_else(|_| "0.02".to_string())
            .parse::<f64>()
            .context("Failed to parse MOVEMENT_THRESHOLD")?;

        let min_training_bars = env::var("MIN_TRAINING_BARS")
            .unwrap_or_else(|_| "50".to_string())
            .parse::<usize>()
            .context("Failed to parse MIN_TRAINING_BARS")?;

        let min_clean_rows = env::var("MIN_CLEAN_ROWS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<usize>()
            .context("Failed to parse MIN_CLEAN_ROWS")?;

        let n_trees = env::var("FOREST_TREES")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<usize>()
            .context("Failed to parse FOREST_TREES")?;

        let max_depth = env::var("FOREST_MAX_DEPTH")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<usize>()
            .context("Failed to parse FOREST_MAX_DEPTH")?;

        let seed = env::var("FOREST_SEED")
            .unwrap_or_else(|_| "42".to_string())
            .parse::<u64>()
            .context("Failed to parse FOREST_SEED")?;

        let finnhub_api_key = env::var("FINNHUB_API_KEY").unwrap_or_default();

        anyhow::ensure!(lookahead > 0, "LOOKAHEAD_BARS must be positive");
        anyhow::ensure!(
            movement_threshold > 0.0,
            "MOVEMENT_THRESHOLD must be positive"
        );
        anyhow::ensure!(n_trees > 0, "FOREST_TREES must be positive");

        Ok(Self {
            symbol,
            lookahead,
            movement_threshold,
            min_training_bars,
            min_clean_rows,
            n_trees,
            max_depth,
            seed,
            finnhub_api_key,
        })
    }

    pub fn classifier_params(&self) -> ClassifierParams {
        ClassifierParams {
            lookahead: self.lookahead,
            movement_threshold: self.movement_threshold,
            min_training_bars: self.min_training_bars,
            min_clean_rows: self.min_clean_rows,
            forest: ForestConfig {
                n_trees: self.n_trees,
                max_depth: self.max_depth,
                seed: self.seed,
                ..ForestConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them to defaults-only so they
    // stay order-independent under the parallel test runner.
    #[test]
    fn test_defaults() {
        let config = ForecastConfig::from_env().unwrap();
        assert_eq!(config.lookahead, 5);
        assert_eq!(config.movement_threshold, 0.02);
        assert_eq!(config.min_training_bars, 50);
        assert_eq!(config.min_clean_rows, 30);
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_classifier_params_mirror_config() {
        let config = ForecastConfig::from_env().unwrap();
        let params = config.classifier_params();
        assert_eq!(params.lookahead, config.lookahead);
        assert_eq!(params.forest.n_trees, config.n_trees);
        assert_eq!(params.forest.seed, config.seed);
    }
}
