//! Three-way movement classifier.
//!
//! Owns one fitted scaler + forest pair and exposes the train / predict /
//! evaluate surface. Insufficient data is an expected condition and degrades
//! softly (a `false` return from training, the neutral fallback payload from
//! prediction); only caller contract violations fail loudly.

use crate::application::ml::forest::{ForestConfig, RandomForest};
use crate::application::ml::scaler::StandardScaler;
use crate::domain::errors::ModelError;
use crate::domain::market::bar::Bar;
use crate::domain::market::indicators::{self, IndicatorRow, MIN_BARS};
use crate::domain::ml::feature_registry::{self, FEATURE_NAMES};
use crate::domain::ml::metrics::{ClassSupport, ClassificationMetrics};
use crate::domain::ml::movement::{
    CLASSES, ClassProbabilities, Movement, MovementForecast, label_series,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Tunables for labeling and model fitting.
#[derive(Debug, Clone)]
pub struct ClassifierParams {
    /// Future bars used for the label's target return.
    pub lookahead: usize,
    /// Forward-return magnitude separating Bullish/Bearish from Neutral.
    pub movement_threshold: f64,
    /// Minimum bar count before indicator computation is attempted.
    pub min_training_bars: usize,
    /// Minimum rows surviving the feature-completeness drop.
    pub min_clean_rows: usize,
    pub forest: ForestConfig,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            lookahead: 5,
            movement_threshold: 0.02,
            min_training_bars: 50,
            min_clean_rows: 30,
            forest: ForestConfig::default(),
        }
    }
}

/// Diagnostic report from a chronological train/test split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub train_samples: usize,
    pub test_samples: usize,
    #[serde(flatten)]
    pub metrics: ClassificationMetrics,
    pub train_support: ClassSupport,
    pub test_support: ClassSupport,
}

/// One classifier instance per logical session, caller-owned.
///
/// The scaler and forest are fit together and belong to this instance
/// exclusively; mixing them with another instance's parameters produces
/// undefined predictions.
pub struct MovementClassifier {
    params: ClassifierParams,
    scaler: Option<StandardScaler>,
    forest: Option<RandomForest>,
    trained: bool,
}

impl MovementClassifier {
    pub fn new(params: ClassifierParams) -> Self {
        Self {
            params,
            scaler: None,
            forest: None,
            trained: false,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// The fixed, ordered feature catalog; available without training.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    /// Fit scaler + forest on the bar series. Returns `false` (never raises)
    /// when the data is insufficient or any internal step fails.
    pub fn train(&mut self, bars: &[Bar]) -> bool {
        match self.fit(bars) {
            Ok(samples) => {
                info!(samples, trees = self.params.forest.n_trees, "movement classifier trained");
                true
            }
            Err(error) => {
                warn!(%error, bars = bars.len(), "training skipped");
                false
            }
        }
    }

    fn fit(&mut self, bars: &[Bar]) -> Result<usize, ModelError> {
        if bars.len() < self.params.min_training_bars {
            return Err(ModelError::InsufficientData {
                need: self.params.min_training_bars,
                got: bars.len(),
            });
        }

        let rows = indicators::compute_indicators(bars);
        if rows.is_empty() {
            return Err(ModelError::EmptyIndicators);
        }

        let (x, y) = self.clean_dataset(bars, &rows);
        if x.len() < self.params.min_clean_rows {
            return Err(ModelError::InsufficientData {
                need: self.params.min_clean_rows,
                got: x.len(),
            });
        }

        let (scaler, forest) = fit_pair(&self.params.forest, &x, &y);
        self.scaler = Some(scaler);
        self.forest = Some(forest);
        self.trained = true;
        Ok(x.len())
    }

    /// Label every row, then drop rows without a complete feature vector.
    ///
    /// Labels stay aligned with their surviving rows by construction: each
    /// kept vector pushes its own label in the same step.
    fn clean_dataset(&self, bars: &[Bar], rows: &[IndicatorRow]) -> (Vec<Vec<f64>>, Vec<Movement>) {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let labels = label_series(&closes, self.params.lookahead, self.params.movement_threshold);

        let mut x = Vec::new();
        let mut y = Vec::new();
        for (row, label) in rows.iter().zip(labels.iter()) {
            if let Some(vector) = feature_registry::feature_vector(row) {
                x.push(vector);
                y.push(*label);
            }
        }
        (x, y)
    }

    /// Score the most recent bar. Every failure mode degrades to the neutral
    /// fallback payload; nothing is raised to the caller.
    pub fn predict(&self, bars: &[Bar]) -> MovementForecast {
        match self.score_latest(bars) {
            Ok(forecast) => forecast,
            Err(error) => {
                debug!(%error, bars = bars.len(), "returning neutral fallback");
                MovementForecast::neutral_fallback()
            }
        }
    }

    fn score_latest(&self, bars: &[Bar]) -> Result<MovementForecast, ModelError> {
        let (scaler, forest) = match (&self.scaler, &self.forest) {
            (Some(scaler), Some(forest)) if self.trained => (scaler, forest),
            _ => return Err(ModelError::NotTrained),
        };

        if bars.len() < MIN_BARS {
            return Err(ModelError::InsufficientData {
                need: MIN_BARS,
                got: bars.len(),
            });
        }

        let rows = indicators::compute_indicators(bars);
        let latest = rows.last().ok_or(ModelError::EmptyIndicators)?;
        let vector =
            feature_registry::feature_vector(latest).ok_or(ModelError::IncompleteFeatures)?;

        // Fit-time and predict-time vectors must agree in arity and order; a
        // mismatch is a caller bug, not a data condition.
        assert_eq!(
            vector.len(),
            FEATURE_NAMES.len(),
            "feature vector arity differs from the registry"
        );

        let scaled = scaler.transform_row(&vector);
        let probs = forest.predict_proba_one(&scaled);
        assert_eq!(probs.len(), CLASSES.len());
        let probs = [probs[0], probs[1], probs[2]];

        let (best_class, confidence) = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(class, &p)| (class, p))
            .expect("probability vector is non-empty");

        Ok(MovementForecast {
            prediction: Movement::from_index(best_class),
            confidence,
            probabilities: ClassProbabilities::from_vector(&probs),
            features: feature_registry::feature_values(&vector),
        })
    }

    /// Diagnostic chronological split evaluation.
    ///
    /// Fits a scratch scaler + forest on the head of the cleaned rows and
    /// scores the tail; the production pair is never touched, so a previously
    /// trained model keeps serving unchanged predictions. Soft-fails to
    /// `None` when either side of the split is too small.
    pub fn evaluate(&self, bars: &[Bar], test_fraction: f64) -> Option<EvaluationReport> {
        assert!(
            test_fraction > 0.0 && test_fraction < 1.0,
            "test_fraction must be inside (0, 1)"
        );

        let rows = indicators::compute_indicators(bars);
        if rows.is_empty() {
            warn!(bars = bars.len(), "evaluation skipped: no indicator rows");
            return None;
        }

        let (x, y) = self.clean_dataset(bars, &rows);
        let split = ((1.0 - test_fraction) * x.len() as f64) as usize;
        if split < self.params.min_clean_rows || split == x.len() {
            warn!(
                clean_rows = x.len(),
                split, "evaluation skipped: split leaves too little data"
            );
            return None;
        }

        let (x_train, x_test) = x.split_at(split);
        let (y_train, y_test) = y.split_at(split);

        let (scaler, forest) = fit_pair(&self.params.forest, x_train, y_train);
        let predictions: Vec<Movement> = x_test
            .iter()
            .map(|row| Movement::from_index(forest.predict_one(&scaler.transform_row(row))))
            .collect();

        let metrics = ClassificationMetrics::calculate(y_test, &predictions);
        debug!(
            accuracy = metrics.accuracy,
            train = y_train.len(),
            test = y_test.len(),
            "evaluation complete"
        );

        Some(EvaluationReport {
            train_samples: y_train.len(),
            test_samples: y_test.len(),
            metrics,
            train_support: ClassSupport::from_labels(y_train),
            test_support: ClassSupport::from_labels(y_test),
        })
    }
}

impl Default for MovementClassifier {
    fn default() -> Self {
        Self::new(ClassifierParams::default())
    }
}

fn fit_pair(
    config: &ForestConfig,
    x: &[Vec<f64>],
    y: &[Movement],
) -> (StandardScaler, RandomForest) {
    let scaler = StandardScaler::fit(x);
    let scaled = scaler.transform(x);
    let encoded: Vec<usize> = y.iter().map(|label| label.as_index()).collect();
    let forest = RandomForest::fit(config.clone(), CLASSES.len(), &scaled, &encoded);
    (scaler, forest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> ClassifierParams {
        ClassifierParams {
            forest: ForestConfig {
                n_trees: 25,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Closes rise >2% per 5-bar window throughout.
    fn uptrend_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 100.0 * 1.01f64.powi(i as i32);
                let wiggle = (i as f64 * 0.7).sin() * 0.002;
                let open = close * (0.996 + wiggle);
                Bar::new(
                    open,
                    close * 1.004,
                    open * 0.995,
                    close,
                    1000.0 + (i as f64 * 1.3).cos() * 50.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_untrained_predict_is_exact_fallback() {
        let classifier = MovementClassifier::new(test_params());
        let forecast = classifier.predict(&uptrend_bars(100));
        assert_eq!(forecast, MovementForecast::neutral_fallback());
    }

    #[test]
    fn test_train_rejects_short_series() {
        let mut classifier = MovementClassifier::new(test_params());
        assert!(!classifier.train(&uptrend_bars(49)));
        assert!(!classifier.is_trained());

        // Still untrained, so prediction degrades.
        let forecast = classifier.predict(&uptrend_bars(100));
        assert_eq!(forecast.confidence, 0.0);
    }

    #[test]
    fn test_train_then_predict_on_uptrend() {
        let bars = uptrend_bars(100);
        let mut classifier = MovementClassifier::new(test_params());
        assert!(classifier.train(&bars));
        assert!(classifier.is_trained());

        let forecast = classifier.predict(&bars);
        assert!(!forecast.is_fallback());
        assert_eq!(forecast.prediction, Movement::Bullish);
        assert!(forecast.confidence > 0.34, "confidence {}", forecast.confidence);
        assert_eq!(forecast.features.len(), FEATURE_NAMES.len());

        let sum = forecast.probabilities.bullish
            + forecast.probabilities.bearish
            + forecast.probabilities.neutral;
        assert!((sum - 1.0).abs() < 1e-9);

        let max = forecast
            .probabilities
            .bullish
            .max(forecast.probabilities.bearish)
            .max(forecast.probabilities.neutral);
        assert_eq!(forecast.confidence, max);
    }

    #[test]
    fn test_trained_predict_on_short_input_falls_back() {
        let bars = uptrend_bars(100);
        let mut classifier = MovementClassifier::new(test_params());
        assert!(classifier.train(&bars));

        let forecast = classifier.predict(&bars[..19]);
        assert_eq!(forecast, MovementForecast::neutral_fallback());
    }

    #[test]
    fn test_train_survives_malformed_close() {
        let mut bars = uptrend_bars(100);
        bars[40].close = f64::NAN;

        let mut classifier = MovementClassifier::new(test_params());
        // Rows touched by the hole are dropped; enough clean rows remain.
        assert!(classifier.train(&bars));
        assert!(classifier.is_trained());
    }

    #[test]
    fn test_train_fails_soft_when_holes_dominate() {
        let mut bars = uptrend_bars(60);
        for bar in bars.iter_mut().skip(25) {
            bar.close = f64::NAN;
        }

        let mut classifier = MovementClassifier::new(test_params());
        assert!(!classifier.train(&bars));
        assert!(!classifier.is_trained());
    }

    #[test]
    fn test_feature_catalog_without_training() {
        let classifier = MovementClassifier::new(test_params());
        assert_eq!(classifier.feature_names().len(), 17);
        assert_eq!(classifier.feature_names()[0], "price_change");
    }

    #[test]
    fn test_evaluate_reports_split() {
        let bars = uptrend_bars(150);
        let classifier = MovementClassifier::new(test_params());

        let report = classifier.evaluate(&bars, 0.2).expect("enough data");
        assert!(report.train_samples > report.test_samples);
        assert!(report.metrics.accuracy >= 0.0 && report.metrics.accuracy <= 1.0);
        assert_eq!(report.test_support.total(), report.test_samples);
        // A persistent uptrend is dominated by Bullish labels.
        assert!(report.train_support.bullish > report.train_support.bearish);
    }

    #[test]
    fn test_evaluate_does_not_touch_production_model() {
        let bars = uptrend_bars(120);
        let mut classifier = MovementClassifier::new(test_params());
        assert!(classifier.train(&bars));

        let before = classifier.predict(&bars);
        let _ = classifier.evaluate(&bars, 0.3);
        let after = classifier.predict(&bars);
        assert_eq!(before, after);
    }

    #[test]
    fn test_evaluate_insufficient_data_is_none() {
        let classifier = MovementClassifier::new(test_params());
        assert!(classifier.evaluate(&uptrend_bars(30), 0.5).is_none());
        assert!(classifier.evaluate(&uptrend_bars(10), 0.2).is_none());
    }
}
