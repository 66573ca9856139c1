use crate::collector::traits::QuoteSource;
use crate::model::{FetchError, PricePoint};
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

/// Bars are stamped at exchange midnight; `gmtoffset` shifts them back to local time.
#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Daily closes from the Yahoo Finance chart endpoint (no API key).
pub struct YahooQuoteSource {
    client: Client,
}

impl YahooQuoteSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) FxEventImpact/0.1")
            .build()?;

        Ok(Self { client })
    }

    fn build_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let period1 = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0);
        let period2 = end.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0);
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            CHART_BASE_URL, symbol, period1, period2
        )
    }
}

/// Extracts (date, close) pairs, preferring adjusted close when the payload has one.
/// Null closes are dropped here; the parser would drop them anyway.
pub fn parse_chart_payload(body: &str) -> Result<Vec<PricePoint>, FetchError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;

    if let Some(err) = response.chart.error {
        return Err(FetchError::Payload(format!("{}: {}", err.code, err.description)));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::Payload("empty chart result".into()))?;

    let closes = match result.indicators.adjclose.into_iter().next() {
        Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
        _ => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
    };

    let offset = result.meta.gmtoffset;
    let points = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts.checked_add(offset)?, 0)?.date_naive();
            close.map(|close| PricePoint { date, close })
        })
        .collect();

    Ok(points)
}

#[async_trait::async_trait]
impl QuoteSource for YahooQuoteSource {
    async fn fetch_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let url = self.build_url(symbol, start, end);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::InvalidResponse(response.status()));
        }

        let body = response.text().await?;
        parse_chart_payload(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_adjusted_close_and_skips_nulls() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1672704000,1672790400,1672876800],
            "indicators":{
                "quote":[{"close":[1.0,2.0,3.0]}],
                "adjclose":[{"adjclose":[1270.5,null,1265.0]}]
            }}],"error":null}}"#;
        let points = parse_chart_payload(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2023, 1, 3).unwrap());
        assert_eq!(points[0].close, 1270.5);
        assert_eq!(points[1].close, 1265.0);
    }

    #[test]
    fn falls_back_to_close() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1672704000],
            "indicators":{"quote":[{"close":[131.2]}]}}],"error":null}}"#;
        let points = parse_chart_payload(body).unwrap();
        assert_eq!(points[0].close, 131.2);
    }

    #[test]
    fn summer_bars_keep_their_exchange_date() {
        // 2023-07-03 00:00 in London during BST is 2023-07-02 23:00 UTC
        let body = r#"{"chart":{"result":[{
            "meta":{"currency":"KRW","gmtoffset":3600},
            "timestamp":[1688338800,1688425200],
            "indicators":{"quote":[{"close":[1295.1,1301.4]}]}}],"error":null}}"#;
        let points = parse_chart_payload(body).unwrap();
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2023, 7, 3).unwrap());
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2023, 7, 4).unwrap());
    }

    #[test]
    fn reports_api_error() {
        let body = r#"{"chart":{"result":null,
            "error":{"code":"Not Found","description":"No data found"}}}"#;
        assert!(matches!(parse_chart_payload(body), Err(FetchError::Payload(_))));
    }

    #[test]
    fn builds_url_with_unix_periods() {
        let source = YahooQuoteSource::new().unwrap();
        let url = source.build_url(
            "KRW=X",
            NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 4).unwrap(),
        );
        assert!(url.ends_with(
            "/KRW=X?period1=1672704000&period2=1672790400&interval=1d&events=history"
        ));
    }
}
