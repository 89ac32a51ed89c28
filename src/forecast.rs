use serde::Deserialize;

use crate::dispatch::ChartKind;
use crate::error::ForecastError;
use crate::ir::{AxisValue, ChartData, ChartSpec};

/// Produces future values for a numeric series. Implementations are opaque
/// to the pipeline and may fail for any reason they choose to report.
pub trait Forecaster {
    fn forecast(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError>;
}

/// Holt's linear method: exponential smoothing with an additive trend and
/// no seasonal component.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HoltLinear {
    /// Level smoothing constant in `(0, 1]`.
    pub alpha: f64,
    /// Trend smoothing constant in `(0, 1]`.
    pub beta: f64,
}

impl Default for HoltLinear {
    fn default() -> Self {
        Self { alpha: 0.5, beta: 0.3 }
    }
}

impl HoltLinear {
    pub const MIN_HISTORY: usize = 2;
}

impl Forecaster for HoltLinear {
    fn forecast(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon);
        }
        if history.len() < Self::MIN_HISTORY {
            return Err(ForecastError::NotEnoughHistory {
                needed: Self::MIN_HISTORY,
                found: history.len(),
            });
        }

        let mut level = history[0];
        let mut trend = history[1] - history[0];
        for &y in &history[1..] {
            let prev_level = level;
            level = self.alpha * y + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
        }

        let predicted: Vec<f64> = (1..=horizon).map(|h| level + h as f64 * trend).collect();
        if predicted.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFinite);
        }
        Ok(predicted)
    }
}

/// A column's history followed by its predicted continuation.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub column: String,
    pub history: Vec<f64>,
    pub predicted: Vec<f64>,
}

impl Forecast {
    /// Line chart over period index: history first, then predictions.
    pub fn to_chart(&self) -> ChartSpec {
        let points = self
            .history
            .iter()
            .chain(&self.predicted)
            .enumerate()
            .map(|(i, &v)| (AxisValue::Number(i as f64), v))
            .collect();

        ChartSpec {
            kind: ChartKind::Line,
            title: format!("Forecast of {} ({} periods)", self.column, self.predicted.len()),
            x_label: Some("Period".to_string()),
            y_label: Some(self.column.clone()),
            data: ChartData::Line { points },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holt_follows_linear_trend() {
        let model = HoltLinear::default();
        let predicted = model.forecast(&[10.0, 20.0, 30.0, 40.0], 3).unwrap();
        assert_eq!(predicted.len(), 3);
        for (got, want) in predicted.iter().zip([50.0, 60.0, 70.0]) {
            assert!((got - want).abs() < 1e-9, "got {}, want {}", got, want);
        }
    }

    #[test]
    fn test_holt_flat_series_stays_flat() {
        let predicted = HoltLinear::default().forecast(&[5.0, 5.0, 5.0], 2).unwrap();
        assert_eq!(predicted, vec![5.0, 5.0]);
    }

    #[test]
    fn test_holt_rejects_short_history_and_zero_horizon() {
        let model = HoltLinear::default();
        assert_eq!(
            model.forecast(&[1.0], 3),
            Err(ForecastError::NotEnoughHistory { needed: 2, found: 1 })
        );
        assert_eq!(model.forecast(&[1.0, 2.0], 0), Err(ForecastError::InvalidHorizon));
    }

    #[test]
    fn test_holt_config_defaults() {
        let model: HoltLinear = serde_json::from_str(r#"{"alpha": 0.8}"#).unwrap();
        assert_eq!(model.alpha, 0.8);
        assert_eq!(model.beta, 0.3);
    }

    #[test]
    fn test_forecast_to_chart() {
        let forecast = Forecast {
            column: "Sales".to_string(),
            history: vec![1.0, 2.0],
            predicted: vec![3.0],
        };
        let chart = forecast.to_chart();
        assert_eq!(chart.kind, ChartKind::Line);
        match chart.data {
            ChartData::Line { points } => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[2], (AxisValue::Number(2.0), 3.0));
            }
            other => panic!("Expected line data, got {:?}", other),
        }
    }
}
