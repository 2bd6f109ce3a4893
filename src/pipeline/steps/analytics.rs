use async_trait::async_trait;
use tracing::info;

use super::{PipelineStep, StepContext, StepResult};
use crate::constants::{
    ANALYTICS_SUMMARY_FILE, CHART_EXTENSION, RELATIONAL_COMPANIES_FILE, RELATIONAL_FACILITIES_FILE,
};
use crate::domain::{RelationalCompany, RelationalFacility};
use crate::error::Result;
use crate::infra::csv_store::{read_records, require_inputs, write_records};
use crate::infra::svg_chart::BarChart;
use crate::pipeline::processing::analytics::{
    companies_by_country, histogram_bins, summary_metrics, top_sectors, FacilityCountStats, TOP_SECTORS,
};

pub const COUNTRY_CHART: &str = "companies_by_country";
pub const FACILITIES_CHART: &str = "facilities_per_company";
pub const SECTOR_CHART: &str = "sector_analysis";

/// Descriptive statistics and charts over the relational tables.
pub struct AnalyticsStep;

fn chart_file(ctx: &StepContext, stem: &str) -> std::path::PathBuf {
    ctx.layout.output(&format!("{}.{}", stem, CHART_EXTENSION))
}

#[async_trait]
impl PipelineStep for AnalyticsStep {
    async fn execute(&self, ctx: &StepContext) -> Result<StepResult> {
        let companies_path = ctx.layout.output(RELATIONAL_COMPANIES_FILE);
        let facilities_path = ctx.layout.output(RELATIONAL_FACILITIES_FILE);
        require_inputs(&[companies_path.clone(), facilities_path.clone()])?;

        let companies: Vec<RelationalCompany> = read_records(&companies_path)?;
        let facilities: Vec<RelationalFacility> = read_records(&facilities_path)?;
        println!("Loaded {} companies and {} facilities", companies.len(), facilities.len());

        let mut charts = 0;

        let by_country = companies_by_country(&companies);
        BarChart::vertical(
            "Companies by country",
            "Country",
            "Companies",
            by_country.iter().map(|(c, n)| (c.clone(), *n as f64)).collect(),
        )
        .write(&chart_file(ctx, COUNTRY_CHART))?;
        charts += 1;
        crate::metrics::analytics::chart_written();
        for (country, count) in &by_country {
            println!("  {:15} {:>8}", country, count);
        }

        let counts: Vec<u64> = companies.iter().map(|c| c.facility_count).collect();
        let bins = histogram_bins(&counts);
        BarChart::vertical(
            "Facilities per company",
            "Facilities",
            "Companies",
            bins.iter().map(|b| (b.label(), b.count as f64)).collect(),
        )
        .write(&chart_file(ctx, FACILITIES_CHART))?;
        charts += 1;
        crate::metrics::analytics::chart_written();

        let stats = FacilityCountStats::compute(&counts);
        info!("Total companies: {}", stats.total_companies);
        info!("Mean facilities: {:.2}", stats.mean);
        info!("Median facilities: {}", stats.median);
        info!("Max / min facilities: {} / {}", stats.max, stats.min);
        info!("Std deviation: {:.2}", stats.std_dev);
        info!("Total facilities: {}", stats.total_facilities);
        info!("Companies with 1 facility: {}", stats.single_facility_companies);
        info!("Companies with >5 facilities: {}", stats.companies_over_five);

        let sectors = top_sectors(&facilities, TOP_SECTORS);
        BarChart::horizontal(
            "Top 10 sectors",
            "Facilities",
            "Sector",
            sectors.iter().map(|(s, n)| (s.clone(), *n as f64)).collect(),
        )
        .write(&chart_file(ctx, SECTOR_CHART))?;
        charts += 1;
        crate::metrics::analytics::chart_written();

        let summary = summary_metrics(&companies, &facilities);
        write_records(&ctx.layout.output(ANALYTICS_SUMMARY_FILE), &summary)?;
        println!("\n{}", "=".repeat(50));
        for row in &summary {
            println!("{:40} : {:>10}", row.metric.replace('_', " "), row.value);
        }

        Ok(StepResult::success(companies.len(), format!("{} charts and summary written", charts))
            .with_metadata("charts", charts))
    }

    fn step_name(&self) -> &'static str {
        "analytics"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["relational"]
    }
}
