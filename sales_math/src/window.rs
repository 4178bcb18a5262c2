//! Trailing window operations over a series history
//!
//! Every function here looks backwards from the end of a history slice, so the
//! same code derives features for a training row (history = values before the
//! row) and for a recursive forecast step (history = observed values followed
//! by earlier predictions).

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Aggregate applied over a rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStat {
    Mean,
    Max,
    Min,
}

impl WindowStat {
    /// Short name used in feature column names
    pub fn name(&self) -> &'static str {
        match self {
            WindowStat::Mean => "mean",
            WindowStat::Max => "max",
            WindowStat::Min => "min",
        }
    }

    /// Aggregate a window of values
    pub fn apply(&self, values: &[f64]) -> Result<f64> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(format!(
                "Cannot compute rolling {} over an empty window",
                self.name()
            )));
        }

        let value = match self {
            WindowStat::Mean => values.iter().sum::<f64>() / values.len() as f64,
            WindowStat::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            WindowStat::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        };

        Ok(value)
    }
}

/// Value `lag` steps before the position following `history`.
///
/// `lag_value(&[1.0, 2.0, 3.0], 1)` is `3.0`. Returns `None` when the history
/// is too short or `lag` is zero.
pub fn lag_value(history: &[f64], lag: usize) -> Option<f64> {
    if lag == 0 || lag > history.len() {
        return None;
    }
    Some(history[history.len() - lag])
}

/// The `window` most recent values of the series lagged by `lag`.
///
/// Only full windows are returned.
pub fn lagged_window(history: &[f64], lag: usize, window: usize) -> Option<&[f64]> {
    if lag == 0 || window == 0 {
        return None;
    }
    let end = history.len().checked_sub(lag - 1)?;
    let start = end.checked_sub(window)?;
    Some(&history[start..end])
}

/// Rolling aggregate of the lagged series at the position following `history`
pub fn lagged_rolling(history: &[f64], lag: usize, window: usize, stat: WindowStat) -> Option<f64> {
    lagged_window(history, lag, window).and_then(|values| stat.apply(values).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_value() {
        let history = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(lag_value(&history, 1), Some(4.0));
        assert_eq!(lag_value(&history, 4), Some(1.0));
        assert_eq!(lag_value(&history, 5), None);
        assert_eq!(lag_value(&history, 0), None);
    }

    #[test]
    fn test_lagged_window() {
        let history = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(lagged_window(&history, 1, 3), Some(&[3.0, 4.0, 5.0][..]));
        assert_eq!(lagged_window(&history, 2, 3), Some(&[2.0, 3.0, 4.0][..]));
        assert_eq!(lagged_window(&history, 1, 5), Some(&history[..]));
        assert_eq!(lagged_window(&history, 1, 6), None);
        assert_eq!(lagged_window(&history, 3, 4), None);
    }

    #[test]
    fn test_lagged_rolling_stats() {
        let history = [4.0, 1.0, 7.0, 2.0];
        assert_eq!(lagged_rolling(&history, 1, 3, WindowStat::Max), Some(7.0));
        assert_eq!(lagged_rolling(&history, 1, 3, WindowStat::Min), Some(1.0));
        assert_eq!(lagged_rolling(&history, 1, 4, WindowStat::Mean), Some(3.5));
        assert_eq!(lagged_rolling(&history, 1, 5, WindowStat::Mean), None);
    }

    #[test]
    fn test_empty_window_is_error() {
        assert!(matches!(
            WindowStat::Mean.apply(&[]),
            Err(MathError::InsufficientData(_))
        ));
    }
}
