pub mod fetcher;
pub mod traits;

pub use fetcher::YahooQuoteSource;
pub use traits::QuoteSource;

use crate::config::AppConfig;
use crate::model::StorageError;
use crate::storage::FlatFileStorage;
use tracing::{info, warn};

/// Downloads every configured ticker and writes one raw table per instrument.
/// A ticker that fails or returns nothing is logged and skipped; only storage errors abort.
pub async fn collect_all<S: QuoteSource>(
    source: &S,
    config: &AppConfig,
    storage: &FlatFileStorage,
) -> Result<usize, StorageError> {
    info!(
        "Collecting quotes ({} ~ {})",
        config.start_date, config.end_date
    );

    let mut written = 0;
    for ticker in config.tickers.iter() {
        info!(" > Fetching {} ({})...", ticker.name, ticker.symbol);
        let points = match source
            .fetch_closes(&ticker.symbol, config.start_date, config.end_date)
            .await
        {
            Ok(points) => points,
            Err(e) => {
                warn!("Fetching {} failed: {}", ticker.name, e);
                continue;
            }
        };

        if points.is_empty() {
            warn!("{} returned no rows", ticker.name);
            continue;
        }

        let path = storage.save_raw(&ticker.name, &points)?;
        info!(" > Saved {} rows to {}", points.len(), path.display());
        written += 1;
    }

    info!(
        "Collection finished: {} of {} instruments written",
        written,
        config.tickers.iter().count()
    );
    Ok(written)
}
