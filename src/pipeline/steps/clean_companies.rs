use async_trait::async_trait;
use tracing::info;

use super::{PipelineStep, StepContext, StepResult};
use crate::constants::COMPANIES_FILE;
use crate::domain::RawTable;
use crate::error::Result;
use crate::infra::csv_store::write_records;
use crate::pipeline::ingestion::latest_snapshot;
use crate::pipeline::processing::conflation::extract_companies;

/// Cleans company names from the latest raw snapshot into `companies.csv`.
pub struct CleanCompaniesStep;

#[async_trait]
impl PipelineStep for CleanCompaniesStep {
    async fn execute(&self, ctx: &StepContext) -> Result<StepResult> {
        let snapshot = latest_snapshot(&ctx.layout.raw_dir())?;
        info!("Loading {}", snapshot.display());
        let raw = RawTable::read_path(&snapshot)?;
        info!("{} rows loaded", raw.len());

        let extraction = extract_companies(&raw);
        crate::metrics::resolution::companies(extraction.rows_seen, extraction.companies.len());

        let path = ctx.layout.cleaned(COMPANIES_FILE);
        write_records(&path, &extraction.companies)?;

        println!("Sample of cleaned companies:");
        for company in extraction.companies.iter().take(5) {
            println!("  {} | {} | {}", company.company_id, company.company_name, company.country);
        }

        Ok(StepResult::success(
            extraction.companies.len(),
            format!(
                "{} unique companies from {} rows",
                extraction.companies.len(),
                extraction.rows_seen
            ),
        )
        .with_metadata("name_column", extraction.name_column.unwrap_or_default()))
    }

    fn step_name(&self) -> &'static str {
        "clean_companies"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["scrape"]
    }
}
