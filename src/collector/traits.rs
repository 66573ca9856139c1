use crate::model::{FetchError, PricePoint};
use chrono::NaiveDate;

#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, FetchError>;
}
