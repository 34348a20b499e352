use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way directional call over the forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    Bearish,
    Neutral,
    Bullish,
}

/// Class index order used for the label encoding and the probability vector.
pub const CLASSES: [Movement; 3] = [Movement::Bearish, Movement::Neutral, Movement::Bullish];

impl Movement {
    pub fn as_index(self) -> usize {
        match self {
            Movement::Bearish => 0,
            Movement::Neutral => 1,
            Movement::Bullish => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        CLASSES[index]
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Movement::Bearish => write!(f, "Bearish"),
            Movement::Neutral => write!(f, "Neutral"),
            Movement::Bullish => write!(f, "Bullish"),
        }
    }
}

/// Label every position of a close series by its forward return over
/// `lookahead` bars: Bullish above `+threshold`, Bearish below `-threshold`,
/// Neutral otherwise.
///
/// The final `lookahead` positions have no observable future bar and are
/// labeled Neutral by convention; callers treating them as observed outcomes
/// will overstate the Neutral class.
pub fn label_series(closes: &[f64], lookahead: usize, threshold: f64) -> Vec<Movement> {
    (0..closes.len())
        .map(|i| {
            let future = i + lookahead;
            if future >= closes.len() {
                return Movement::Neutral;
            }
            let current = closes[i];
            let ahead = closes[future];
            if !current.is_finite() || !ahead.is_finite() || current == 0.0 {
                return Movement::Neutral;
            }
            let forward_return = ahead / current - 1.0;
            if forward_return > threshold {
                Movement::Bullish
            } else if forward_return < -threshold {
                Movement::Bearish
            } else {
                Movement::Neutral
            }
        })
        .collect()
}

/// Per-class probability mass of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClassProbabilities {
    pub bullish: f64,
    pub bearish: f64,
    pub neutral: f64,
}

impl ClassProbabilities {
    /// Build from a probability vector in [`CLASSES`] order.
    pub fn from_vector(probs: &[f64; 3]) -> Self {
        Self {
            bearish: probs[Movement::Bearish.as_index()],
            neutral: probs[Movement::Neutral.as_index()],
            bullish: probs[Movement::Bullish.as_index()],
        }
    }
}

/// One named feature value as reported to the prediction consumer.
///
/// Output-only: names are borrowed from the static registry, so the payload
/// serializes but is never read back in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureValue {
    pub name: &'static str,
    pub value: f64,
}

/// Structured prediction for the most recent bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementForecast {
    pub prediction: Movement,
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub features: Vec<FeatureValue>,
}

impl MovementForecast {
    /// The fixed degraded payload returned whenever no trained,
    /// feature-complete prediction is possible.
    pub fn neutral_fallback() -> Self {
        Self {
            prediction: Movement::Neutral,
            confidence: 0.0,
            probabilities: ClassProbabilities {
                bullish: 0.33,
                bearish: 0.33,
                neutral: 0.34,
            },
            features: Vec::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == 0.0 && self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_thresholds() {
        // 3% rise, 3% drop, then flat.
        let closes = vec![100.0, 103.0, 99.91, 100.0, 100.5];
        let labels = label_series(&closes, 1, 0.02);
        assert_eq!(labels[0], Movement::Bullish);
        assert_eq!(labels[1], Movement::Bearish);
        assert_eq!(labels[2], Movement::Neutral);
        // Last position has no future bar.
        assert_eq!(labels[4], Movement::Neutral);
    }

    #[test]
    fn test_tail_is_neutral_by_convention() {
        // Strong uptrend everywhere: only the unobservable tail is Neutral.
        let closes: Vec<f64> = (0..30).map(|i| 100.0 * 1.05f64.powi(i)).collect();
        let lookahead = 5;
        let labels = label_series(&closes, lookahead, 0.02);

        for (i, label) in labels.iter().enumerate() {
            if i + lookahead >= closes.len() {
                assert_eq!(*label, Movement::Neutral, "tail row {i} must be Neutral");
            } else {
                assert_eq!(*label, Movement::Bullish, "observed row {i} must be Bullish");
            }
        }
    }

    #[test]
    fn test_moves_inside_threshold_are_neutral() {
        let closes = vec![100.0, 101.9, 99.95, 100.0];
        let labels = label_series(&closes, 1, 0.02);
        assert_eq!(labels[0], Movement::Neutral);
        assert_eq!(labels[1], Movement::Neutral);
    }

    #[test]
    fn test_nan_future_labels_neutral() {
        let closes = vec![100.0, f64::NAN, 103.0, 104.0];
        let labels = label_series(&closes, 1, 0.02);
        assert_eq!(labels[0], Movement::Neutral);
        assert_eq!(labels[1], Movement::Neutral);
    }

    #[test]
    fn test_class_index_round_trip() {
        for class in CLASSES {
            assert_eq!(Movement::from_index(class.as_index()), class);
        }
    }

    #[test]
    fn test_forecast_serializes_names_and_probabilities() {
        let forecast = MovementForecast {
            prediction: Movement::Bullish,
            confidence: 0.6,
            probabilities: ClassProbabilities {
                bullish: 0.6,
                bearish: 0.1,
                neutral: 0.3,
            },
            features: vec![FeatureValue {
                name: "rsi",
                value: 55.0,
            }],
        };

        let json = serde_json::to_value(&forecast).unwrap();
        assert_eq!(json["prediction"], "Bullish");
        assert_eq!(json["confidence"], 0.6);
        assert_eq!(json["probabilities"]["Bullish"], 0.6);
        assert_eq!(json["probabilities"]["Neutral"], 0.3);
        assert_eq!(json["features"][0]["name"], "rsi");
        assert_eq!(json["features"][0]["value"], 55.0);
    }

    #[test]
    fn test_neutral_fallback_shape() {
        let fallback = MovementForecast::neutral_fallback();
        assert_eq!(fallback.prediction, Movement::Neutral);
        assert_eq!(fallback.confidence, 0.0);
        assert_eq!(fallback.probabilities.bullish, 0.33);
        assert_eq!(fallback.probabilities.bearish, 0.33);
        assert_eq!(fallback.probabilities.neutral, 0.34);
        assert!(fallback.features.is_empty());
        assert!(fallback.is_fallback());
    }
}
