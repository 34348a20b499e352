use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One time-ordered OHLCV observation.
///
/// Bars are immutable once produced by the market-data layer and arrive in
/// strictly chronological order; the pipeline trusts that ordering and never
/// re-sorts. Malformed numeric fields coerce to NaN so that a single bad bar
/// degrades to missing indicator values instead of aborting the whole series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Build a bar from a loosely-typed record as returned by market-data
    /// providers (JSON numbers or numeric strings).
    ///
    /// Returns `None` only when the record is not an object at all. Missing
    /// or non-numeric fields become NaN.
    pub fn from_record(record: &Value) -> Option<Self> {
        let obj = record.as_object()?;
        Some(Self {
            open: coerce(obj.get("open")),
            high: coerce(obj.get("high")),
            low: coerce(obj.get("low")),
            close: coerce(obj.get("close")),
            volume: coerce(obj.get("volume")),
        })
    }
}

fn coerce(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
