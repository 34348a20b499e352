use crate::domain::market::indicators::IndicatorRow;
use crate::domain::ml::movement::FeatureValue;

/// Ordered list of the model's feature names.
///
/// This single constant is consumed by both the fit and the predict paths;
/// the column order of every feature matrix and vector in the crate follows
/// it exactly. Any change here invalidates a trained classifier.
pub const FEATURE_NAMES: [&str; 17] = [
    "price_change",
    "price_change_5",
    "price_change_10",
    "open_close_ratio",
    "body_size",
    "gap_up",
    "gap_down",
    "volatility",
    "price_vs_sma5",
    "price_vs_sma10",
    "price_vs_sma20",
    "rsi",
    "macd",
    "macd_signal",
    "macd_histogram",
    "volume_ratio",
    "bb_position",
];

fn raw_values(row: &IndicatorRow) -> [Option<f64>; 17] {
    [
        row.price_change,
        row.price_change_5,
        row.price_change_10,
        row.open_close_ratio,
        row.body_size,
        row.gap_up,
        row.gap_down,
        row.volatility,
        row.price_vs_sma5,
        row.price_vs_sma10,
        row.price_vs_sma20,
        row.rsi,
        row.macd,
        row.macd_signal,
        row.macd_histogram,
        row.volume_ratio,
        row.bb_position,
    ]
}

/// Extract the ordered feature vector from one indicator row.
///
/// Returns `None` when any required feature is missing or non-finite; such
/// rows are dropped before training and treated as not predictable at
/// inference.
pub fn feature_vector(row: &IndicatorRow) -> Option<Vec<f64>> {
    let mut vector = Vec::with_capacity(FEATURE_NAMES.len());
    for value in raw_values(row) {
        match value {
            Some(v) if v.is_finite() => vector.push(v),
            _ => return None,
        }
    }
    Some(vector)
}

/// Pair a complete feature vector with its names for reporting to callers.
pub fn feature_values(vector: &[f64]) -> Vec<FeatureValue> {
    debug_assert_eq!(vector.len(), FEATURE_NAMES.len());
    FEATURE_NAMES
        .iter()
        .zip(vector.iter())
        .map(|(name, &value)| FeatureValue { name, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_row() -> IndicatorRow {
        IndicatorRow {
            price_change: Some(0.01),
            price_change_5: Some(0.05),
            price_change_10: Some(0.1),
            open_close_ratio: Some(1.002),
            body_size: Some(0.002),
            gap_up: Some(1.0),
            gap_down: Some(0.0),
            volatility: Some(0.015),
            sma_5: Some(101.0),
            sma_10: Some(100.5),
            sma_20: Some(100.0),
            price_vs_sma5: Some(0.001),
            price_vs_sma10: Some(0.006),
            price_vs_sma20: Some(0.011),
            rsi: Some(62.0),
            macd: Some(0.4),
            macd_signal: Some(0.3),
            macd_histogram: Some(0.1),
            volume_sma: Some(1000.0),
            volume_ratio: Some(1.2),
            bb_upper: Some(104.0),
            bb_middle: Some(100.0),
            bb_lower: Some(96.0),
            bb_position: Some(0.7),
        }
    }

    #[test]
    fn test_vector_length_matches_registry() {
        let vector = feature_vector(&complete_row()).unwrap();
        assert_eq!(vector.len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_vector_order_follows_registry() {
        let vector = feature_vector(&complete_row()).unwrap();
        // price_change is column 0, bb_position is the last column.
        assert_eq!(vector[0], 0.01);
        assert_eq!(vector[11], 62.0);
        assert_eq!(vector[16], 0.7);
    }

    #[test]
    fn test_missing_feature_drops_row() {
        let mut row = complete_row();
        row.rsi = None;
        assert!(feature_vector(&row).is_none());
    }

    #[test]
    fn test_non_finite_feature_drops_row() {
        let mut row = complete_row();
        row.macd = Some(f64::NAN);
        assert!(feature_vector(&row).is_none());
    }

    #[test]
    fn test_missing_auxiliary_field_is_tolerated() {
        // SMA levels and band edges are reported for introspection but are
        // not part of the model's feature set.
        let mut row = complete_row();
        row.sma_5 = None;
        row.bb_upper = None;
        assert!(feature_vector(&row).is_some());
    }

    #[test]
    fn test_feature_values_pairing() {
        let vector = feature_vector(&complete_row()).unwrap();
        let values = feature_values(&vector);
        assert_eq!(values.len(), FEATURE_NAMES.len());
        assert_eq!(values[0].name, "price_change");
        assert_eq!(values[0].value, 0.01);
        assert_eq!(values[16].name, "bb_position");
        assert_eq!(values[16].value, 0.7);
    }
}
