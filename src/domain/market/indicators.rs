//! Technical indicator engine.
//!
//! Pure transformation from an ordered bar series to an equally long table of
//! per-bar indicator rows. Every rolling window and EMA uses only past and
//! current bars, so downstream labeling stays causal and leakage-free.
//!
//! Early rows carry `None` wherever a lookback window is not yet filled; this
//! is expected, not an error. Non-finite inputs (a malformed close, say)
//! likewise surface as `None` in every window that touches them.

use crate::domain::market::bar::Bar;
use statrs::statistics::Statistics;

/// Several indicators need a 20-bar lookback before they mean anything, so
/// shorter series produce no rows at all rather than partial ones.
pub const MIN_BARS: usize = 20;

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const VOLATILITY_WINDOW: usize = 10;
const VOLUME_WINDOW: usize = 10;
const BOLLINGER_WINDOW: usize = 20;
const BOLLINGER_WIDTH: f64 = 2.0;

/// One bar's position extended with derived technical fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorRow {
    pub price_change: Option<f64>,
    pub price_change_5: Option<f64>,
    pub price_change_10: Option<f64>,
    pub open_close_ratio: Option<f64>,
    pub body_size: Option<f64>,
    pub gap_up: Option<f64>,
    pub gap_down: Option<f64>,
    pub volatility: Option<f64>,
    pub sma_5: Option<f64>,
    pub sma_10: Option<f64>,
    pub sma_20: Option<f64>,
    pub price_vs_sma5: Option<f64>,
    pub price_vs_sma10: Option<f64>,
    pub price_vs_sma20: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub volume_sma: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_position: Option<f64>,
}

/// Compute the indicator table for an ordered bar series.
///
/// Returns one row per input bar, or an empty table when fewer than
/// [`MIN_BARS`] bars are supplied.
pub fn compute_indicators(bars: &[Bar]) -> Vec<IndicatorRow> {
    if bars.len() < MIN_BARS {
        return Vec::new();
    }

    let n = bars.len();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let price_change: Vec<Option<f64>> = (0..n).map(|i| pct_change(&closes, i, 1)).collect();
    let ema_fast = ema_series(&closes, MACD_FAST);
    let ema_slow = ema_series(&closes, MACD_SLOW);
    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();
    let signal_line = ema_of_series(&macd_line, MACD_SIGNAL);

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let close = closes[i];
        let open = opens[i];

        let sma_5 = rolling_mean(&closes, i, 5);
        let sma_10 = rolling_mean(&closes, i, 10);
        let sma_20 = rolling_mean(&closes, i, BOLLINGER_WINDOW);

        let bb_std = rolling_std(&closes, i, BOLLINGER_WINDOW);
        let (bb_upper, bb_lower) = match (sma_20, bb_std) {
            (Some(mid), Some(sd)) => (
                Some(mid + BOLLINGER_WIDTH * sd),
                Some(mid - BOLLINGER_WIDTH * sd),
            ),
            _ => (None, None),
        };
        let bb_position = match (bb_upper, bb_lower) {
            (Some(upper), Some(lower)) if upper - lower > 0.0 && close.is_finite() => {
                Some((close - lower) / (upper - lower))
            }
            _ => None,
        };

        let volume_sma = rolling_mean(&volumes, i, VOLUME_WINDOW);
        let volume_ratio = match volume_sma {
            Some(mean) if mean > 0.0 && volumes[i].is_finite() => Some(volumes[i] / mean),
            _ => None,
        };

        // Gap flags mirror a strict comparison against the previous close;
        // a missing neighbor compares false and yields 0, not a hole.
        let (gap_up, gap_down) = if i == 0 {
            (Some(0.0), Some(0.0))
        } else {
            let prev_close = closes[i - 1];
            (
                Some(if open > prev_close { 1.0 } else { 0.0 }),
                Some(if open < prev_close { 1.0 } else { 0.0 }),
            )
        };

        let macd_histogram = match (macd_line[i], signal_line[i]) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        };

        rows.push(IndicatorRow {
            price_change: price_change[i],
            price_change_5: pct_change(&closes, i, 5),
            price_change_10: pct_change(&closes, i, 10),
            open_close_ratio: safe_ratio(close, open),
            body_size: safe_ratio((close - open).abs(), open),
            gap_up,
            gap_down,
            volatility: rolling_std_of_options(&price_change, i, VOLATILITY_WINDOW),
            sma_5,
            sma_10,
            sma_20,
            price_vs_sma5: relative_to(close, sma_5),
            price_vs_sma10: relative_to(close, sma_10),
            price_vs_sma20: relative_to(close, sma_20),
            rsi: rsi(&closes, i, RSI_PERIOD),
            macd: macd_line[i],
            macd_signal: signal_line[i],
            macd_histogram,
            volume_sma,
            volume_ratio,
            bb_upper,
            bb_middle: sma_20,
            bb_lower,
            bb_position,
        });
    }

    rows
}

/// Return over `k` bars: `close[i] / close[i-k] - 1`.
fn pct_change(closes: &[f64], i: usize, k: usize) -> Option<f64> {
    if i < k {
        return None;
    }
    let current = closes[i];
    let past = closes[i - k];
    if current.is_finite() && past.is_finite() && past != 0.0 {
        Some(current / past - 1.0)
    } else {
        None
    }
}

/// Relative deviation of the close from a moving average.
fn relative_to(close: f64, average: Option<f64>) -> Option<f64> {
    match average {
        Some(avg) if avg != 0.0 && close.is_finite() => Some(close / avg - 1.0),
        _ => None,
    }
}

fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if numerator.is_finite() && denominator.is_finite() && denominator != 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

fn window<'a>(values: &'a [f64], i: usize, period: usize) -> Option<&'a [f64]> {
    if i + 1 < period {
        return None;
    }
    let w = &values[i + 1 - period..=i];
    if w.iter().all(|v| v.is_finite()) {
        Some(w)
    } else {
        None
    }
}

fn rolling_mean(values: &[f64], i: usize, period: usize) -> Option<f64> {
    window(values, i, period).map(|w| w.iter().mean())
}

/// Sample (n-1) standard deviation over the trailing window.
fn rolling_std(values: &[f64], i: usize, period: usize) -> Option<f64> {
    window(values, i, period).map(|w| w.iter().std_dev())
}

fn rolling_std_of_options(values: &[Option<f64>], i: usize, period: usize) -> Option<f64> {
    if i + 1 < period {
        return None;
    }
    let w: Option<Vec<f64>> = values[i + 1 - period..=i].iter().copied().collect();
    let w = w?;
    if w.iter().all(|v| v.is_finite()) {
        Some(w.iter().std_dev())
    } else {
        None
    }
}

/// RSI from the simple average gain / average loss over the trailing window,
/// mapped to the 0-100 oscillator via `100 - 100 / (1 + RS)`.
fn rsi(closes: &[f64], i: usize, period: usize) -> Option<f64> {
    if i < period {
        return None;
    }
    let mut gains = 0.0;
    let mut losses = 0.0;
    for j in i + 1 - period..=i {
        let delta = closes[j] - closes[j - 1];
        if !delta.is_finite() {
            return None;
        }
        if delta > 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }
    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        // Flat window has no defined RS; an all-gain window saturates at 100.
        if avg_gain == 0.0 {
            None
        } else {
            Some(100.0)
        }
    } else {
        let rs = avg_gain / avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}

/// Recursive EMA with `alpha = 2 / (span + 1)`, seeded on the first finite
/// value. Non-finite inputs leave the running state untouched and emit `None`
/// for their own row.
fn ema_series(values: &[f64], span: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                let next = match state {
                    Some(prev) => alpha * v + (1.0 - alpha) * prev,
                    None => v,
                };
                state = Some(next);
                Some(next)
            } else {
                None
            }
        })
        .collect()
}

fn ema_of_series(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|v| match v {
            Some(v) if v.is_finite() => {
                let next = match state {
                    Some(prev) => alpha * v + (1.0 - alpha) * prev,
                    None => *v,
                };
                state = Some(next);
                Some(next)
            }
            _ => None,
        })
        .collect()
}
