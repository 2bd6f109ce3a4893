use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::app::ports::HttpClientPort;
use crate::config::SourceConfig;
use crate::domain::RawTable;
use crate::error::{PipelineError, Result};
use crate::pipeline::ingestion::{filter_by_countries, synthetic};

/// Where the acquired rows came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Registry,
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct Acquisition {
    pub table: RawTable,
    pub origin: DataOrigin,
    pub dropped_rows: usize,
}

impl Acquisition {
    pub fn below_minimum(&self, min_expected_rows: usize) -> bool {
        self.table.len() < min_expected_rows
    }
}

pub struct IngestUseCase<H: HttpClientPort + ?Sized> {
    pub http: Arc<H>,
}

impl<H: HttpClientPort + ?Sized> IngestUseCase<H> {
    pub fn new(http: Arc<H>) -> Self {
        Self { http }
    }

    /// Downloads and parses the registry CSV. Any non-2xx status is an error.
    pub async fn download(&self, url: &str) -> Result<RawTable> {
        info!("Connecting to {}", url);
        let started = Instant::now();
        let resp = self.http.get(url).await?;
        crate::metrics::acquisition::download_duration(started.elapsed().as_secs_f64());

        if !resp.is_success() {
            return Err(PipelineError::Stage { message: format!("registry responded with HTTP {}", resp.status) });
        }
        let table = RawTable::from_reader(resp.bytes.as_slice())?;
        info!("Downloaded {} rows ({})", table.len(), resp.content_type);
        Ok(table)
    }

    /// Downloads the registry, falling back to the seeded synthetic dataset
    /// on any failure, then keeps only the configured countries.
    pub async fn acquire(&self, source: &SourceConfig) -> Result<Acquisition> {
        let (mut table, origin) = match self.download(&source.url).await {
            Ok(table) => (table, DataOrigin::Registry),
            Err(e) => {
                error!("Download failed: {}", e);
                info!("Generating {} synthetic rows (seed {})", source.synthetic_rows, source.synthetic_seed);
                crate::metrics::acquisition::synthetic_fallback();
                let table = synthetic::generate(source.synthetic_rows, source.synthetic_seed, &source.countries);
                (table, DataOrigin::Synthetic)
            }
        };
        crate::metrics::acquisition::rows_fetched(table.len());

        let dropped_rows = filter_by_countries(&mut table, &source.countries)?;
        crate::metrics::acquisition::rows_kept(table.len());

        let acquisition = Acquisition { table, origin, dropped_rows };
        if acquisition.below_minimum(source.min_expected_rows) {
            warn!(
                "Only {} rows after filtering (expected at least {})",
                acquisition.table.len(),
                source.min_expected_rows
            );
        } else {
            info!("{} rows after filtering (minimum {})", acquisition.table.len(), source.min_expected_rows);
        }
        Ok(acquisition)
    }
}
