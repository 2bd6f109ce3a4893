use async_trait::async_trait;
use tracing::info;

use super::{PipelineStep, StepContext, StepResult};
use crate::constants::{
    AI_FULL_FILE, AI_SIMPLE_FILE, AI_STATISTICS_FILE, COMPANIES_FILE, RELATIONAL_COMPANIES_FILE,
    SUSTAINABILITY_BY_COUNTRY_FILE, TOP_SUSTAINABLE_FILE,
};
use crate::domain::{CompanyAnalysis, CompanyAnalysisSimple, CompanyProfile};
use crate::error::{PipelineError, Result};
use crate::infra::csv_store::{read_records, write_records};
use crate::pipeline::processing::sustainability::{
    analyze_company, compute_statistics, keyword_frequencies, sustainability_by_country, top_sustainable,
};

pub const TOP_COMPANIES: usize = 10;
pub const TOP_KEYWORDS: usize = 10;

/// Scores every company name for sustainability keywords.
pub struct SustainabilityStep;

#[async_trait]
impl PipelineStep for SustainabilityStep {
    async fn execute(&self, ctx: &StepContext) -> Result<StepResult> {
        let relational = ctx.layout.output(RELATIONAL_COMPANIES_FILE);
        let cleaned = ctx.layout.cleaned(COMPANIES_FILE);
        let source = if relational.exists() {
            relational
        } else if cleaned.exists() {
            info!("Relational companies not found, using {}", cleaned.display());
            cleaned
        } else {
            return Err(PipelineError::MissingInput(vec![
                relational.display().to_string(),
                cleaned.display().to_string(),
            ]));
        };

        let profiles: Vec<CompanyProfile> = read_records(&source)?;
        info!("Loaded {} companies from {}", profiles.len(), source.display());

        let mut results: Vec<CompanyAnalysis> = Vec::with_capacity(profiles.len());
        for (idx, profile) in profiles.iter().enumerate() {
            let analysis = analyze_company(profile);
            crate::metrics::sustainability::company_scored(analysis.has_sustainability, analysis.sustainability_score);
            results.push(analysis);
            if (idx + 1) % 1000 == 0 {
                info!("  Processed {}/{} companies", idx + 1, profiles.len());
            }
        }

        let simple: Vec<CompanyAnalysisSimple> = results.iter().map(CompanyAnalysisSimple::from).collect();
        let stats = compute_statistics(&results);
        write_records(&ctx.layout.output(AI_FULL_FILE), &results)?;
        write_records(&ctx.layout.output(AI_SIMPLE_FILE), &simple)?;
        write_records(&ctx.layout.output(AI_STATISTICS_FILE), std::slice::from_ref(&stats))?;
        write_records(&ctx.layout.output(TOP_SUSTAINABLE_FILE), &top_sustainable(&results, TOP_COMPANIES))?;
        write_records(
            &ctx.layout.output(SUSTAINABILITY_BY_COUNTRY_FILE),
            &sustainability_by_country(&results),
        )?;

        println!("Companies analysed: {}", stats.total_companies);
        println!("Sustainable companies: {}", stats.sustainable_companies);
        println!("Sustainability rate: {:.1}%", stats.sustainability_rate);
        println!("Average score: {:.3}", stats.avg_sustainability_score);

        let keywords = keyword_frequencies(&results);
        if !keywords.is_empty() {
            info!("Top {} sustainability keywords:", TOP_KEYWORDS);
            for (keyword, count) in keywords.iter().take(TOP_KEYWORDS) {
                info!("  {:20} : {:5}", keyword, count);
            }
        }

        Ok(StepResult::success(
            results.len(),
            format!("{} of {} companies flagged", stats.sustainable_companies, stats.total_companies),
        )
        .with_metadata("sustainability_rate", format!("{:.1}", stats.sustainability_rate)))
    }

    fn step_name(&self) -> &'static str {
        "ai"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["relational"]
    }
}
