mod analyzer;
mod collector;
mod config;
mod model;
mod parser;
mod processor;
mod storage;
mod utils;
mod visualizer;

use analyzer::{Analyzer, AnalyzerImpl};
use collector::{collect_all, YahooQuoteSource};
use config::{load_config, AppConfig};
use model::{LagAnalysis, PipelineError};
use storage::FlatFileStorage;
use tracing::{error, info, warn};
use utils::format_optional;

const IMPACT_HEADER: &str =
    "Event_Type  Date        Pre_Corr  Post_Corr  Corr_Change  Pre_Vol  Post_Vol  Vol_Change";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            std::process::exit(1);
        }
    };

    info!("==================================================");
    info!("   KRW/JPY policy event impact analysis");
    info!("==================================================");

    match run(&config).await {
        Ok(charts_dir) => {
            info!("[Success] all phases completed");
            info!("Charts: {}", charts_dir.display());
        }
        Err(e) => {
            error!("[Fail] pipeline aborted: {}", e);
            std::process::exit(1);
        }
    }
}

/// Runs acquisition, merge, analysis and rendering strictly in sequence.
async fn run(config: &AppConfig) -> Result<std::path::PathBuf, PipelineError> {
    let storage = FlatFileStorage::new(&config.data_dir)?;

    info!(">>> Data Collection");
    match YahooQuoteSource::new() {
        Ok(source) => {
            collect_all(&source, config, &storage).await?;
        }
        Err(e) => warn!("HTTP client unavailable, using existing raw tables: {}", e),
    }

    info!(">>> Data Processing");
    processor::load_and_merge(&storage, &config.tickers, &config.merge)?;

    info!(">>> Statistical Analysis");
    analyze(&storage, config)?;

    info!(">>> Visualization");
    visualizer::render_all(&storage, config)?;

    Ok(std::fs::canonicalize(storage.charts_dir())
        .unwrap_or_else(|_| storage.charts_dir().to_path_buf()))
}

/// Reads the persisted merged table, so the phase also works on a table produced earlier.
fn analyze(storage: &FlatFileStorage, config: &AppConfig) -> Result<(), PipelineError> {
    let table = storage.load_merged()?;
    let analyzer = AnalyzerImpl::new(config.analysis.clone());

    let report = analyzer.event_impact(&table, &config.events)?;
    let results = report.results();
    info!(
        "Events: {} analyzed, {} skipped, {} failed",
        results.len(),
        report.skipped_count(),
        report.failed_count()
    );

    if results.is_empty() {
        warn!("No event produced an impact result");
        storage.clear_impact()?;
    } else {
        info!("{}", IMPACT_HEADER);
        for r in &results {
            info!(
                "{:<11} {}  {:>8}  {:>9}  {:>11}  {:>7}  {:>8}  {:>10}",
                r.event_type,
                r.date,
                format_optional(r.pre_corr),
                format_optional(r.post_corr),
                format_optional(r.corr_change),
                format_optional(r.pre_vol),
                format_optional(r.post_vol),
                format_optional(r.vol_change)
            );
        }
        let path = storage.save_impact(&results)?;
        info!("Impact results saved: {}", path.display());
    }

    match analyzer.lag_correlation(&table) {
        LagAnalysis::Profile(profile) => {
            let path = storage.save_lag(&profile)?;
            info!("Lag profile saved: {}", path.display());
        }
        LagAnalysis::InsufficientData { rows, required } => {
            warn!("Lag analysis skipped: {} rows, {} required", rows, required);
        }
    }

    Ok(())
}
