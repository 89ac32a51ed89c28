use log::{debug, info};

use crate::classify::{classify, classify_values, ColumnKind, Schema};
use crate::clean::clean;
use crate::compare::compare;
use crate::data::Table;
use crate::dispatch::{render, ChartKind, ChartRequest};
use crate::error::{ChartError, PipelineError};
use crate::filter::{apply, FilterSpec};
use crate::forecast::{Forecast, Forecaster};
use crate::insight::{summarize, InsightReport};
use crate::ir::{ChartSpec, Comparison};
use crate::normalize::normalize_table;

/// What the one-time cleaning pass did to the source table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub affected_columns: Vec<String>,
    pub dropped_rows: usize,
}

/// Explicit state for one analysis session.
///
/// The baseline is normalized and cleaned once; every filter starts from it,
/// and every chart, comparison, insight and forecast reads the active view.
#[derive(Debug, Clone)]
pub struct Session {
    baseline: Table,
    view: Table,
    filter: FilterSpec,
    cleaning: CleaningReport,
    aliases: Vec<String>,
    last_insights: Option<InsightReport>,
}

impl Session {
    pub fn new(raw: Table) -> Result<Self, PipelineError> {
        if raw.columns().is_empty() {
            return Err(PipelineError::EmptySource);
        }

        let normalized = normalize_table(raw);
        let cleaned = clean(normalized.table);
        info!(
            "Loaded {} rows x {} columns ({} dropped for missing values)",
            cleaned.table.len(),
            cleaned.table.columns().len(),
            cleaned.dropped_rows
        );

        Ok(Self {
            view: cleaned.table.clone(),
            baseline: cleaned.table,
            filter: FilterSpec::default(),
            cleaning: CleaningReport {
                affected_columns: cleaned.affected_columns,
                dropped_rows: cleaned.dropped_rows,
            },
            aliases: normalized.aliases,
            last_insights: None,
        })
    }

    pub fn baseline(&self) -> &Table {
        &self.baseline
    }

    /// The table every request currently runs against.
    pub fn view(&self) -> &Table {
        &self.view
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn cleaning_report(&self) -> &CleaningReport {
        &self.cleaning
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn last_insights(&self) -> Option<&InsightReport> {
        self.last_insights.as_ref()
    }

    /// Replace the active filter. Always filters the baseline, never the
    /// current view. An empty result leaves the session untouched.
    pub fn apply_filter(&mut self, spec: FilterSpec) -> Result<&Table, PipelineError> {
        let filtered = apply(&self.baseline, &spec);
        if filtered.is_empty() && !self.baseline.is_empty() {
            return Err(PipelineError::NoDataAfterFilter {
                filter: spec.to_string(),
            });
        }
        debug!("Active view now {} rows under {}", filtered.len(), spec);
        self.view = filtered;
        self.filter = spec;
        Ok(&self.view)
    }

    pub fn clear_filter(&mut self) {
        self.view = self.baseline.clone();
        self.filter = FilterSpec::default();
    }

    /// Classification of the active view, computed fresh on every call.
    pub fn schema(&self) -> Schema {
        classify(&self.view)
    }

    pub fn summarize(&mut self) -> &InsightReport {
        self.last_insights.insert(summarize(&self.view))
    }

    pub fn render(&self, request: &ChartRequest) -> Result<ChartSpec, PipelineError> {
        Ok(render(request, &self.view)?)
    }

    pub fn compare(
        &self,
        left: &ChartRequest,
        right: &ChartRequest,
    ) -> Result<Comparison, PipelineError> {
        Ok(compare(left, right, &self.view)?)
    }

    /// Forecast `horizon` periods of a numeric column in row order.
    pub fn forecast(
        &self,
        column: &str,
        horizon: usize,
        model: &dyn Forecaster,
    ) -> Result<Forecast, PipelineError> {
        let idx = self
            .view
            .column_index(column)
            .ok_or_else(|| ChartError::UnknownColumn {
                column: column.to_string(),
            })?;
        if classify_values(self.view.column(idx)) != ColumnKind::Numeric {
            return Err(ChartError::NonNumericAxis {
                kind: ChartKind::Line,
                column: self.view.columns()[idx].clone(),
            }
            .into());
        }

        let history: Vec<f64> = self.view.column(idx).filter_map(|v| v.as_f64()).collect();
        let predicted = model.forecast(&history, horizon)?;
        Ok(Forecast {
            column: self.view.columns()[idx].clone(),
            history,
            predicted,
        })
    }
}
