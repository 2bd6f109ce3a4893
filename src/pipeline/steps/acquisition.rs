use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{PipelineStep, StepContext, StepResult};
use crate::app::ingest_use_case::{DataOrigin, IngestUseCase};
use crate::app::ports::HttpClientPort;
use crate::error::Result;
use crate::infra::http_client::ReqwestHttp;
use crate::pipeline::ingestion::write_snapshot;
use crate::pipeline::processing::conflation::COUNTRY_COLUMNS;

/// Downloads the registry (or synthesizes it), filters it to the target
/// countries and writes the raw snapshot.
#[derive(Default)]
pub struct AcquisitionStep {
    http: Option<Arc<dyn HttpClientPort>>,
}

impl AcquisitionStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given client instead of building a reqwest one
    pub fn with_http(http: Arc<dyn HttpClientPort>) -> Self {
        Self { http: Some(http) }
    }
}

#[async_trait]
impl PipelineStep for AcquisitionStep {
    async fn execute(&self, ctx: &StepContext) -> Result<StepResult> {
        let source = &ctx.config.source;
        let http: Arc<dyn HttpClientPort> = match &self.http {
            Some(http) => http.clone(),
            None => Arc::new(ReqwestHttp::new(source.timeout_seconds)?),
        };

        let acquisition = IngestUseCase::new(http).acquire(source).await?;
        let path = write_snapshot(&acquisition.table, &ctx.layout.raw_dir(), ctx.started_at)?;

        let countries = acquisition
            .table
            .first_column(&COUNTRY_COLUMNS)
            .map(|c| acquisition.table.distinct(c))
            .unwrap_or_default();
        println!("Total rows: {}", acquisition.table.len());
        println!("Columns: {}", acquisition.table.headers().join(", "));
        println!("Countries: {}", countries.join(", "));

        let origin = match acquisition.origin {
            DataOrigin::Registry => "registry",
            DataOrigin::Synthetic => "synthetic",
        };
        info!("📦 Snapshot of {} {} rows written", acquisition.table.len(), origin);

        Ok(StepResult::success(
            acquisition.table.len(),
            format!("{} rows saved to {}", acquisition.table.len(), path.display()),
        )
        .with_metadata("origin", origin)
        .with_metadata("dropped_rows", acquisition.dropped_rows)
        .with_metadata("snapshot", path.display()))
    }

    fn step_name(&self) -> &'static str {
        "scrape"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
