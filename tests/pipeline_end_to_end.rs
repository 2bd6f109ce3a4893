use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

use oar_pipeline::app::ports::{HttpClientPort, HttpGetResult};
use oar_pipeline::config::PipelineConfig;
use oar_pipeline::domain::{CompanyAnalysisSimple, RelationalCompany, RelationalLink};
use oar_pipeline::error::PipelineError;
use oar_pipeline::infra::csv_store::read_records;
use oar_pipeline::pipeline::steps::{
    AcquisitionStep, AnalyticsStep, CleanCompaniesStep, CleanFacilitiesStep, ExportStep, PipelineStep,
    RelationalStep, StepContext, SustainabilityStep,
};

const REGISTRY_CSV: &str = "\
name,country,address,lat,lng,sector
Green Knit Ltd,Maroc,1 Rue Atlas,33.57,-7.59,Apparel
Green Knit Ltd,Morocco,2 Rue Atlas,34.02,-6.84,apparel
Bravo Textil S.A.,Spain,Calle Mayor 1,40.41,-3.70,
Berlin Mode GmbH,Germany,Hauptstr 1,52.52,13.40,Apparel
";

struct FakeHttp {
    status: u16,
    body: &'static str,
}

#[async_trait]
impl HttpClientPort for FakeHttp {
    async fn get(&self, _url: &str) -> oar_pipeline::error::Result<HttpGetResult> {
        Ok(HttpGetResult {
            status: self.status,
            bytes: self.body.as_bytes().to_vec(),
            content_type: "text/csv".to_string(),
        })
    }
}

fn context(root: &Path, synthetic_rows: usize) -> StepContext {
    let mut config = PipelineConfig::default();
    config.paths.data_root = root.to_path_buf();
    config.source.url = "http://registry.invalid/facilities.csv".to_string();
    config.source.synthetic_rows = synthetic_rows;
    config.source.min_expected_rows = 1;
    StepContext::new(config)
}

async fn run_all(ctx: &StepContext, http: Arc<dyn HttpClientPort>) -> Result<()> {
    let steps: Vec<Box<dyn PipelineStep>> = vec![
        Box::new(AcquisitionStep::with_http(http)),
        Box::new(CleanCompaniesStep),
        Box::new(CleanFacilitiesStep),
        Box::new(RelationalStep),
        Box::new(AnalyticsStep),
        Box::new(SustainabilityStep),
        Box::new(ExportStep),
    ];
    for step in &steps {
        let result = step.execute(ctx).await?;
        assert!(result.success, "step {} failed: {}", step.step_name(), result.message);
    }
    Ok(())
}

#[tokio::test]
async fn registry_download_flows_through_every_stage() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context(dir.path(), 10);
    run_all(&ctx, Arc::new(FakeHttp { status: 200, body: REGISTRY_CSV })).await?;

    let companies: Vec<RelationalCompany> = read_records(&ctx.layout.output("relational_companies.csv"))?;
    assert_eq!(companies.len(), 2);
    let green = companies.iter().find(|c| c.company_name == "Green Knit").expect("green company");
    assert_eq!(green.country, "Morocco");
    assert_eq!(green.facility_count, 2);
    assert_eq!(green.company_id.len(), 10);
    assert!(companies.iter().all(|c| c.country != "Germany"));

    let links: Vec<RelationalLink> = read_records(&ctx.layout.output("relational_links.csv"))?;
    assert_eq!(links.len(), 3);
    assert!(links.iter().all(|l| l.relationship_type == "ownership"));

    let analysis: Vec<CompanyAnalysisSimple> = read_records(&ctx.layout.output("ai_analysis_simple.csv"))?;
    let flagged: Vec<&str> =
        analysis.iter().filter(|a| a.has_sustainability).map(|a| a.company_name.as_str()).collect();
    assert_eq!(flagged, vec!["Green Knit"]);

    for chart in ["companies_by_country.svg", "facilities_per_company.svg", "sector_analysis.svg"] {
        assert!(ctx.layout.output(chart).is_file(), "missing chart {}", chart);
    }

    let bundle = ctx
        .layout
        .export_dir()
        .join(format!("oar_pipeline_{}", ctx.started_at.format("%Y%m%d_%H%M")));
    for file in [
        "companies_final.csv",
        "facilities_final.csv",
        "relationships_final.csv",
        "ai_analysis_final.csv",
        "data_summary.json",
        "oar_dataset.xlsx",
        "README.md",
        "visualizations/sector_analysis.svg",
    ] {
        assert!(bundle.join(file).is_file(), "missing bundle file {}", file);
    }

    let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(bundle.join("data_summary.json"))?)?;
    assert_eq!(summary["summary"]["total_companies"], 2);
    assert_eq!(summary["summary"]["sustainable_companies"], 1);
    assert_eq!(summary["metadata"]["countries_covered"], serde_json::json!(["Morocco", "Spain"]));
    assert!(summary["companies"][0]["facility_count"].is_u64());

    let report = fs::read_dir(ctx.layout.logs_dir())?
        .filter_map(|e| e.ok())
        .find(|e| e.file_name().to_string_lossy().starts_with("pipeline_report_"))
        .expect("pipeline report written");
    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(report.path())?)?;
    assert_eq!(report["status"], "completed");
    assert_eq!(report["statistics"]["total_companies"], 2);
    assert_eq!(report["outputs"]["data/cleaned"]["file_count"], 3);
    Ok(())
}

#[tokio::test]
async fn unreachable_registry_uses_synthetic_rows() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context(dir.path(), 60);
    run_all(&ctx, Arc::new(FakeHttp { status: 503, body: "" })).await?;

    let companies: Vec<RelationalCompany> = read_records(&ctx.layout.output("relational_companies.csv"))?;
    assert!(!companies.is_empty());
    let allowed = PipelineConfig::default().source.countries;
    assert!(companies.iter().all(|c| allowed.contains(&c.country)));
    Ok(())
}

#[tokio::test]
async fn downstream_stage_names_every_missing_input() {
    let dir = tempdir().unwrap();
    let ctx = context(dir.path(), 10);

    match RelationalStep.execute(&ctx).await {
        Err(PipelineError::MissingInput(paths)) => {
            assert_eq!(paths.len(), 3);
            assert!(paths.iter().any(|p| p.ends_with("company_facilities.csv")));
        }
        other => panic!("expected missing input, got {:?}", other.map(|r| r.message)),
    }

    assert!(matches!(ExportStep.execute(&ctx).await, Err(PipelineError::MissingInput(paths)) if paths.len() == 4));
}

#[tokio::test]
async fn sustainability_falls_back_to_cleaned_companies() -> Result<()> {
    let dir = tempdir()?;
    let ctx = context(dir.path(), 10);
    fs::create_dir_all(ctx.layout.cleaned_dir())?;
    fs::write(
        ctx.layout.cleaned("companies.csv"),
        "company_id,company_name,country,original_name\nabc1234567,Eco Verde,Italy,Eco Verde SpA\n",
    )?;

    let result = SustainabilityStep.execute(&ctx).await?;
    assert!(result.success);

    let analysis: Vec<CompanyAnalysisSimple> = read_records(&ctx.layout.output("ai_analysis_simple.csv"))?;
    assert_eq!(analysis.len(), 1);
    assert!(analysis[0].has_sustainability);
    assert!((analysis[0].sustainability_score - 0.4).abs() < 1e-9);
    assert!(analysis[0].ai_summary.starts_with("Eco Verde is a company based in Italy."));
    Ok(())
}
