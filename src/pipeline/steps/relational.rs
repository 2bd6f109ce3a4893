use async_trait::async_trait;
use tracing::{error, info, warn};

use super::{PipelineStep, StepContext, StepResult};
use crate::constants::{
    COMPANIES_FILE, FACILITIES_FILE, LINKS_FILE, RELATIONAL_COMPANIES_FILE, RELATIONAL_FACILITIES_FILE,
    RELATIONAL_LINKS_FILE,
};
use crate::domain::{Company, CompanyFacilityLink, Facility};
use crate::error::Result;
use crate::infra::csv_store::{read_records, require_inputs, write_records};
use crate::pipeline::processing::analytics::{companies_by_country, FacilityCountStats};
use crate::pipeline::processing::quality_gate::validate_integrity;
use crate::pipeline::processing::relational::assemble;

/// Validates the cleaned tables and writes the relational ones. Integrity
/// problems are reported but never stop the step.
pub struct RelationalStep;

#[async_trait]
impl PipelineStep for RelationalStep {
    async fn execute(&self, ctx: &StepContext) -> Result<StepResult> {
        let companies_path = ctx.layout.cleaned(COMPANIES_FILE);
        let facilities_path = ctx.layout.cleaned(FACILITIES_FILE);
        let links_path = ctx.layout.cleaned(LINKS_FILE);
        require_inputs(&[companies_path.clone(), facilities_path.clone(), links_path.clone()])?;

        let companies: Vec<Company> = read_records(&companies_path)?;
        let facilities: Vec<Facility> = read_records(&facilities_path)?;
        let links: Vec<CompanyFacilityLink> = read_records(&links_path)?;
        info!("Companies: {}", companies.len());
        info!("Facilities: {}", facilities.len());
        info!("Links: {}", links.len());

        let report = validate_integrity(&companies, &facilities, &links);
        crate::metrics::relational::integrity(report.errors.len(), report.warnings.len());
        for issue in &report.errors {
            error!("{}", issue);
        }
        for issue in &report.warnings {
            warn!("{}", issue);
        }
        if report.is_clean() {
            info!("All integrity checks passed");
        } else if !report.is_valid() {
            warn!("Integrity errors found, continuing anyway");
        }

        let tables = assemble(&companies, &facilities, &links, &ctx.run_date());
        write_records(&ctx.layout.output(RELATIONAL_COMPANIES_FILE), &tables.companies)?;
        write_records(&ctx.layout.output(RELATIONAL_FACILITIES_FILE), &tables.facilities)?;
        write_records(&ctx.layout.output(RELATIONAL_LINKS_FILE), &tables.links)?;
        crate::metrics::relational::companies(tables.companies.len());

        let counts: Vec<u64> = tables.companies.iter().map(|c| c.facility_count).collect();
        let stats = FacilityCountStats::compute(&counts);
        info!("Facilities per company (mean): {:.2}", stats.mean);
        info!("Facilities per company (max): {}", stats.max);
        println!("\nCompanies by country:");
        for (country, count) in companies_by_country(&tables.companies).iter().take(10) {
            println!("  {:15} : {:6} companies", country, count);
        }

        Ok(StepResult::success(
            tables.companies.len(),
            format!(
                "{} companies, {} facilities, {} links",
                tables.companies.len(),
                tables.facilities.len(),
                tables.links.len()
            ),
        )
        .with_metadata("integrity_errors", report.errors.len())
        .with_metadata("integrity_warnings", report.warnings.len()))
    }

    fn step_name(&self) -> &'static str {
        "relational"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["clean_companies", "clean_facilities"]
    }
}
