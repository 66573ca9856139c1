// Analyzer module: event impact windows, lag cross-correlation and the numeric kernels behind them.

pub mod event_impact;
pub mod lag_correlation;
pub mod stats;

pub use event_impact::analyze_event_impact;
pub use lag_correlation::analyze_lag_correlation;

use crate::config::AnalysisConfig;
use crate::model::{AnalysisError, EventCategory, EventImpactReport, LagAnalysis, MergedTable};

/// Trait defining the interface for the event analyzer.
pub trait Analyzer {
    fn event_impact(
        &self,
        table: &MergedTable,
        events: &[EventCategory],
    ) -> Result<EventImpactReport, AnalysisError>;
    fn lag_correlation(&self, table: &MergedTable) -> LagAnalysis;
}

/// Analyzer bound to one set of window parameters.
pub struct AnalyzerImpl {
    cfg: AnalysisConfig,
}

impl AnalyzerImpl {
    pub fn new(cfg: AnalysisConfig) -> Self {
        Self { cfg }
    }
}

impl Analyzer for AnalyzerImpl {
    fn event_impact(
        &self,
        table: &MergedTable,
        events: &[EventCategory],
    ) -> Result<EventImpactReport, AnalysisError> {
        analyze_event_impact(table, events, &self.cfg)
    }

    fn lag_correlation(&self, table: &MergedTable) -> LagAnalysis {
        analyze_lag_correlation(table, self.cfg.max_lag)
    }
}
