// Core structs: price series, merged table, events, impact results
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One closing price on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closing prices of a single instrument, strictly increasing by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub name: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(name: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        // last duplicate of a date wins
        points.sort_by_key(|p| p.date);
        points.reverse();
        points.dedup_by_key(|p| p.date);
        points.reverse();
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "KRW")]
    pub krw: f64,
    #[serde(rename = "JPY")]
    pub jpy: f64,
    #[serde(rename = "KRW_Ret")]
    pub krw_ret: Option<f64>,
    #[serde(rename = "JPY_Ret")]
    pub jpy_ret: Option<f64>,
    #[serde(rename = "KRW_MA20")]
    pub krw_ma20: Option<f64>,
    #[serde(rename = "KRW_MA60")]
    pub krw_ma60: Option<f64>,
}

/// Date-indexed join of the KRW and JPY series, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTable {
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn new(rows: Vec<MergedRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Rows with `from <= date <= to`, located by binary search.
    pub fn slice_dates(&self, from: NaiveDate, to: NaiveDate) -> &[MergedRow] {
        let start = self.rows.partition_point(|r| r.date < from);
        let end = self.rows.partition_point(|r| r.date <= to);
        if start >= end {
            return &[];
        }
        &self.rows[start..end]
    }

    pub fn krw_prices(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.krw).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

/// A named group of event dates, as written in the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EventCategory {
    pub event_type: String,
    pub dates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketEvent {
    pub event_type: String,
    pub date: NaiveDate,
}

/// Pre/post event statistics for one analyzed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    #[serde(rename = "Event_Type")]
    pub event_type: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Pre_Corr")]
    pub pre_corr: Option<f64>,
    #[serde(rename = "Post_Corr")]
    pub post_corr: Option<f64>,
    #[serde(rename = "Corr_Change")]
    pub corr_change: Option<f64>,
    #[serde(rename = "Pre_Vol")]
    pub pre_vol: Option<f64>,
    #[serde(rename = "Post_Vol")]
    pub post_vol: Option<f64>,
    #[serde(rename = "Vol_Change")]
    pub vol_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    OutOfRange {
        min: NaiveDate,
        max: NaiveDate,
    },
    InsufficientData {
        pre_rows: usize,
        post_rows: usize,
        required: usize,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::OutOfRange { min, max } => {
                write!(f, "out of range (data covers {} ~ {})", min, max)
            }
            SkipReason::InsufficientData {
                pre_rows,
                post_rows,
                required,
            } => write!(
                f,
                "insufficient data (pre: {}, post: {}, need {})",
                pre_rows, post_rows, required
            ),
        }
    }
}

/// What happened to a single configured event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Analyzed(ImpactResult),
    Skipped {
        event_type: String,
        date: String,
        reason: SkipReason,
    },
    Failed {
        event_type: String,
        date: String,
        detail: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventImpactReport {
    pub outcomes: Vec<EventOutcome>,
}

impl EventImpactReport {
    pub fn results(&self) -> Vec<ImpactResult> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                EventOutcome::Analyzed(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EventOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EventOutcome::Failed { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagCorrelation {
    #[serde(rename = "Lag")]
    pub lag: usize,
    #[serde(rename = "Correlation")]
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LagAnalysis {
    InsufficientData { rows: usize, required: usize },
    Profile(Vec<LagCorrelation>),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response status {0}")]
    InvalidResponse(reqwest::StatusCode),
    #[error("malformed payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing input file: {0:?}")]
    MissingInput(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no usable rows in {0}")]
    EmptySeries(String),
    #[error("merge produced no rows with both prices present")]
    EmptyMerge,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("event window around {0} overflows the calendar")]
    WindowOverflow(NaiveDate),
    #[error("merged table is empty")]
    EmptyTable,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("chart write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("nothing to plot: {0}")]
    NoData(&'static str),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
