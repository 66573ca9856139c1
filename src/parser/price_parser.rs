// Raw instrument table parsing with coercion of malformed cells
use crate::model::{PricePoint, PriceSeries};
use crate::utils::{parse_date, parse_number};
use csv::ReaderBuilder;
use tracing::info;

pub trait Parser {
    fn parse(&self, name: &str, text: &str) -> PriceSeries;
}

/// Reads a flat table whose first column is a date and second column a closing price.
/// Header lines, unparseable dates and non-numeric prices are dropped rather than rejected.
pub struct PriceTableParser;

impl PriceTableParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for PriceTableParser {
    fn parse(&self, name: &str, text: &str) -> PriceSeries {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut points = Vec::new();
        let mut dropped = 0usize;

        for record in reader.records() {
            let Ok(record) = record else {
                dropped += 1;
                continue;
            };
            let date = record.get(0).and_then(parse_date);
            let close = record.get(1).and_then(parse_number);
            match (date, close) {
                (Some(date), Some(close)) => points.push(PricePoint { date, close }),
                _ => dropped += 1,
            }
        }

        let series = PriceSeries::new(name, points);
        info!(
            "Parsed {}: {} rows kept, {} dropped",
            name,
            series.len(),
            dropped
        );
        series
    }
}
