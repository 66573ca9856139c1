use crate::model::{ConfigError, EventCategory};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct TickerConfig {
    /// File stem of the raw table, e.g. `USDKRW`.
    pub name: String,
    /// Market symbol passed to the quote source, e.g. `KRW=X`.
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tickers {
    pub krw: TickerConfig,
    pub jpy: TickerConfig,
}

impl Tickers {
    pub fn iter(&self) -> impl Iterator<Item = &TickerConfig> {
        [&self.krw, &self.jpy].into_iter()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window_days: u32,
    pub min_samples: usize,
    pub max_lag: usize,
    pub annualization_days: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: 14,
            min_samples: 5,
            max_lag: 5,
            annualization_days: 252.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub short_ma: usize,
    pub long_ma: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            short_ma: 20,
            long_ma: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub bollinger_window: usize,
    pub bollinger_k: f64,
    pub event_colors: HashMap<String, String>,
}

impl ChartConfig {
    pub fn color_for(&self, event_type: &str) -> &str {
        self.event_colors
            .get(event_type)
            .map(String::as_str)
            .unwrap_or("gray")
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        let event_colors = HashMap::from([
            ("RATE_CHECK".to_string(), "red".to_string()),
            ("NPS_MEETING".to_string(), "green".to_string()),
        ]);
        Self {
            bollinger_window: 20,
            bollinger_k: 2.0,
            event_colors,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub tickers: Tickers,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub events: Vec<EventCategory>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end_date <= self.start_date {
            return Err(ConfigError::Invalid(format!(
                "end_date {} must be after start_date {}",
                self.end_date, self.start_date
            )));
        }
        if self.analysis.window_days == 0 {
            return Err(ConfigError::Invalid("analysis.window_days must be positive".into()));
        }
        if self.analysis.min_samples < 2 {
            return Err(ConfigError::Invalid("analysis.min_samples must be at least 2".into()));
        }
        if self.merge.short_ma == 0 || self.merge.long_ma == 0 || self.chart.bollinger_window == 0 {
            return Err(ConfigError::Invalid("rolling windows must be positive".into()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tickers: Tickers {
                krw: TickerConfig {
                    name: "USDKRW".into(),
                    symbol: "KRW=X".into(),
                },
                jpy: TickerConfig {
                    name: "USDJPY".into(),
                    symbol: "JPY=X".into(),
                },
            },
            start_date: NaiveDate::from_ymd_opt(2022, 10, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap_or_default(),
            data_dir: default_data_dir(),
            events: vec![
                EventCategory {
                    event_type: "RATE_CHECK".into(),
                    dates: vec!["2023-10-04".into(), "2024-04-16".into(), "2024-04-17".into()],
                },
                EventCategory {
                    event_type: "NPS_MEETING".into(),
                    dates: vec!["2022-12-16".into(), "2023-04-13".into(), "2023-06-21".into()],
                },
            ],
            analysis: AnalysisConfig::default(),
            merge: MergeConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
