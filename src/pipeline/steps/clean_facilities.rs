use async_trait::async_trait;
use tracing::info;

use super::{PipelineStep, StepContext, StepResult};
use crate::constants::{COMPANIES_FILE, FACILITIES_FILE, LINKS_FILE};
use crate::domain::{Company, RawTable};
use crate::error::Result;
use crate::infra::csv_store::{read_records, require_inputs, write_records};
use crate::pipeline::ingestion::latest_snapshot;
use crate::pipeline::processing::conflation::extract_facilities;

/// Builds facilities and company links from the latest raw snapshot.
pub struct CleanFacilitiesStep;

#[async_trait]
impl PipelineStep for CleanFacilitiesStep {
    async fn execute(&self, ctx: &StepContext) -> Result<StepResult> {
        let companies_path = ctx.layout.cleaned(COMPANIES_FILE);
        require_inputs(&[companies_path.clone()])?;
        let companies: Vec<Company> = read_records(&companies_path)?;
        info!("{} companies loaded", companies.len());

        let snapshot = latest_snapshot(&ctx.layout.raw_dir())?;
        let raw = RawTable::read_path(&snapshot)?;
        info!("{} raw rows loaded from {}", raw.len(), snapshot.display());

        let extraction = extract_facilities(&raw, &companies);
        crate::metrics::resolution::facilities(extraction.rows_seen, extraction.facilities.len());
        crate::metrics::resolution::links(extraction.matched_links, extraction.fallback_links);

        write_records(&ctx.layout.cleaned(FACILITIES_FILE), &extraction.facilities)?;
        write_records(&ctx.layout.cleaned(LINKS_FILE), &extraction.links)?;

        Ok(StepResult::success(
            extraction.facilities.len(),
            format!("{} facilities, {} links", extraction.facilities.len(), extraction.links.len()),
        )
        .with_metadata("matched_links", extraction.matched_links)
        .with_metadata("fallback_links", extraction.fallback_links))
    }

    fn step_name(&self) -> &'static str {
        "clean_facilities"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["scrape", "clean_companies"]
    }
}
