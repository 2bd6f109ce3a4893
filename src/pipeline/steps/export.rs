use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{PipelineStep, StepContext, StepResult};
use crate::config::DataLayout;
use crate::constants::{
    AI_SIMPLE_FILE, CHART_EXTENSION, CLEANED_DIR, DATA_SOURCE_NAME, OUTPUTS_DIR, PIPELINE_NAME, PIPELINE_VERSION,
    RAW_DIR, RELATIONAL_COMPANIES_FILE, RELATIONAL_FACILITIES_FILE, RELATIONAL_LINKS_FILE, TARGET_COUNTRIES,
};
use crate::domain::{CellValue, RawTable};
use crate::error::Result;
use crate::infra::csv_store::require_inputs;
use crate::infra::xlsx_writer::{write_workbook, SheetSpec};

pub const JSON_COMPANY_LIMIT: usize = 1000;
pub const JSON_FACILITY_LIMIT: usize = 500;
pub const SHEET_ROW_LIMIT: usize = 10_000;
pub const REPORT_FILE_LIMIT: usize = 10;

/// Headline figures shared by the JSON summary, the workbook and the README.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub total_companies: usize,
    pub total_facilities: usize,
    pub total_relationships: usize,
    pub sustainable_companies: usize,
    pub sustainability_rate: f64,
    #[serde(skip)]
    pub countries: Vec<String>,
}

impl ExportSummary {
    pub fn compute(companies: &RawTable, facilities: &RawTable, links: &RawTable, analysis: &RawTable) -> Self {
        let sustainable = analysis
            .rows()
            .filter(|r| {
                r.get("has_sustainability")
                    .is_some_and(|v| CellValue::infer(v) == CellValue::Bool(true))
            })
            .count();
        let rate = if analysis.is_empty() {
            0.0
        } else {
            sustainable as f64 / analysis.len() as f64 * 100.0
        };
        let countries: BTreeSet<String> = companies.rows().filter_map(|r| r.get("country")).map(String::from).collect();

        Self {
            total_companies: companies.len(),
            total_facilities: facilities.len(),
            total_relationships: links.len(),
            sustainable_companies: sustainable,
            sustainability_rate: rate,
            countries: countries.into_iter().collect(),
        }
    }
}

pub fn data_summary_json(
    summary: &ExportSummary,
    companies: &RawTable,
    facilities: &RawTable,
    at: DateTime<Local>,
) -> serde_json::Value {
    json!({
        "metadata": {
            "export_date": at.to_rfc3339(),
            "pipeline_version": PIPELINE_VERSION,
            "data_source": DATA_SOURCE_NAME,
            "countries_covered": summary.countries,
        },
        "summary": summary,
        "companies": companies.to_json_records(JSON_COMPANY_LIMIT),
        "sample_facilities": facilities.to_json_records(JSON_FACILITY_LIMIT),
    })
}

pub fn workbook_summary(summary: &ExportSummary, at: DateTime<Local>) -> Vec<(String, String)> {
    vec![
        ("Export date".to_string(), at.format("%Y-%m-%d %H:%M").to_string()),
        ("Companies".to_string(), summary.total_companies.to_string()),
        ("Facilities".to_string(), summary.total_facilities.to_string()),
        ("Sustainable companies".to_string(), summary.sustainable_companies.to_string()),
        ("Sustainability rate".to_string(), format!("{:.1}%", summary.sustainability_rate)),
        ("Countries covered".to_string(), summary.countries.len().to_string()),
    ]
}

pub fn render_readme(summary: &ExportSummary, chart_count: usize, at: DateTime<Local>) -> String {
    format!(
        "# OAR Data Pipeline - Final Export

## Export date
{date}

## Contents

### CSV files
1. `companies_final.csv` - {companies} companies
2. `facilities_final.csv` - {facilities} facilities
3. `relationships_final.csv` - {links} relationships
4. `ai_analysis_final.csv` - sustainability analysis

### Structured files
1. `data_summary.json` - JSON summary with metadata
2. `oar_dataset.xlsx` - spreadsheet workbook

### Visualizations
{charts} charts in `visualizations/`

## Key figures

- **Companies**: {companies}
- **Facilities**: {facilities}
- **Sustainable companies**: {sustainable}
- **Sustainability rate**: {rate:.1}%
- **Countries covered**: {country_count}

## Pipeline

- **Version**: {version}
- **Source**: {source}
- **Target countries**: {targets}

## Data dictionary

### Companies
- company_id: stable identifier
- company_name: cleaned name
- country: normalized country
- facility_count: number of linked facilities
- record_source: producing pipeline

### Facilities
- facility_id: stable identifier
- facility_name: cleaned facility name
- latitude/longitude: coordinates
- country/sector/address: descriptive fields

### AI analysis
- has_sustainability: keyword detected in the name
- sustainability_score: keyword score (0-1)
- ai_summary: generated summary
",
        date = at.format("%Y-%m-%d %H:%M:%S"),
        companies = summary.total_companies,
        facilities = summary.total_facilities,
        links = summary.total_relationships,
        charts = chart_count,
        sustainable = summary.sustainable_companies,
        rate = summary.sustainability_rate,
        country_count = summary.countries.len(),
        version = PIPELINE_VERSION,
        source = DATA_SOURCE_NAME,
        targets = TARGET_COUNTRIES.join(", "),
    )
}

/// Copies every chart image from `outputs_dir` into `target`.
pub fn copy_charts(outputs_dir: &Path, target: &Path) -> Result<usize> {
    fs::create_dir_all(target)?;
    let mut copied = 0;
    for entry in fs::read_dir(outputs_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(CHART_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name() {
            fs::copy(&path, target.join(name))?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderListing {
    pub file_count: usize,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStatistics {
    pub total_companies: usize,
    pub countries: usize,
    pub avg_facilities_per_company: f64,
}

/// Run report written to `logs/pipeline_report_<ts>.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub timestamp: String,
    pub pipeline_name: String,
    pub status: String,
    pub execution_time: String,
    pub outputs: BTreeMap<String, FolderListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ReportStatistics>,
}

fn list_folder(dir: &Path) -> Result<Option<FolderListing>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut files: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    let file_count = files.len();
    files.truncate(REPORT_FILE_LIMIT);
    Ok(Some(FolderListing { file_count, files }))
}

pub fn build_report(layout: &DataLayout, at: DateTime<Local>) -> Result<PipelineReport> {
    let mut outputs = BTreeMap::new();
    for (key, dir) in [
        (RAW_DIR, layout.raw_dir()),
        (CLEANED_DIR, layout.cleaned_dir()),
        (OUTPUTS_DIR, layout.outputs_dir()),
    ] {
        if let Some(listing) = list_folder(&dir)? {
            outputs.insert(key.to_string(), listing);
        }
    }

    let companies_path = layout.output(RELATIONAL_COMPANIES_FILE);
    let statistics = if companies_path.exists() {
        let companies = RawTable::read_path(&companies_path)?;
        let countries = companies.distinct("country").len();
        let counts: Vec<f64> = companies
            .rows()
            .map(|r| r.get("facility_count").and_then(|v| v.parse::<f64>().ok()).unwrap_or(1.0))
            .collect();
        let avg = if counts.is_empty() { 0.0 } else { counts.iter().sum::<f64>() / counts.len() as f64 };
        Some(ReportStatistics {
            total_companies: companies.len(),
            countries,
            avg_facilities_per_company: avg,
        })
    } else {
        None
    };

    Ok(PipelineReport {
        timestamp: at.to_rfc3339(),
        pipeline_name: PIPELINE_NAME.to_string(),
        status: "completed".to_string(),
        execution_time: at.format("%Y-%m-%d %H:%M:%S").to_string(),
        outputs,
        statistics,
    })
}

pub fn write_report(layout: &DataLayout, at: DateTime<Local>) -> Result<PathBuf> {
    let report = build_report(layout, at)?;
    let logs_dir = layout.logs_dir();
    fs::create_dir_all(&logs_dir)?;
    let path = logs_dir.join(format!("pipeline_report_{}.json", at.format("%Y%m%d_%H%M%S")));
    fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    info!("Report saved: {}", path.display());
    Ok(path)
}

/// Builds the timestamped export bundle and the run report.
pub struct ExportStep;

impl ExportStep {
    fn bundle_dir(ctx: &StepContext) -> PathBuf {
        ctx.layout
            .export_dir()
            .join(format!("oar_pipeline_{}", ctx.started_at.format("%Y%m%d_%H%M")))
    }
}

#[async_trait]
impl PipelineStep for ExportStep {
    async fn execute(&self, ctx: &StepContext) -> Result<StepResult> {
        let inputs = [
            (ctx.layout.output(RELATIONAL_COMPANIES_FILE), "companies_final.csv"),
            (ctx.layout.output(RELATIONAL_FACILITIES_FILE), "facilities_final.csv"),
            (ctx.layout.output(RELATIONAL_LINKS_FILE), "relationships_final.csv"),
            (ctx.layout.output(AI_SIMPLE_FILE), "ai_analysis_final.csv"),
        ];
        let paths: Vec<PathBuf> = inputs.iter().map(|(p, _)| p.clone()).collect();
        require_inputs(&paths)?;

        let companies = RawTable::read_path(&inputs[0].0)?;
        let facilities = RawTable::read_path(&inputs[1].0)?;
        let links = RawTable::read_path(&inputs[2].0)?;
        let analysis = RawTable::read_path(&inputs[3].0)?;
        println!("Companies: {}", companies.len());
        println!("Facilities: {}", facilities.len());
        println!("Links: {}", links.len());
        println!("AI analyses: {}", analysis.len());

        let bundle = Self::bundle_dir(ctx);
        fs::create_dir_all(&bundle)?;
        info!("📁 Export directory: {}", bundle.display());

        for (source, name) in &inputs {
            fs::copy(source, bundle.join(name))?;
            crate::metrics::export::file_written();
        }

        let summary = ExportSummary::compute(&companies, &facilities, &links, &analysis);
        let json = data_summary_json(&summary, &companies, &facilities, ctx.started_at);
        fs::write(bundle.join("data_summary.json"), serde_json::to_string_pretty(&json)?)?;
        crate::metrics::export::file_written();

        let sheets = [
            SheetSpec { name: "Companies", table: &companies, row_limit: SHEET_ROW_LIMIT },
            SheetSpec { name: "Facilities", table: &facilities, row_limit: SHEET_ROW_LIMIT },
            SheetSpec { name: "AI Analysis", table: &analysis, row_limit: SHEET_ROW_LIMIT },
        ];
        write_workbook(&bundle.join("oar_dataset.xlsx"), &sheets, &workbook_summary(&summary, ctx.started_at))?;
        crate::metrics::export::file_written();

        let charts = copy_charts(&ctx.layout.outputs_dir(), &bundle.join("visualizations"))?;
        fs::write(bundle.join("README.md"), render_readme(&summary, charts, ctx.started_at))?;
        crate::metrics::export::file_written();

        let report = write_report(&ctx.layout, ctx.started_at)?;
        println!("\nExport created in {}", bundle.display());
        println!("Report: {}", report.display());

        Ok(StepResult::success(summary.total_companies, format!("bundle written to {}", bundle.display()))
            .with_metadata("bundle", bundle.display())
            .with_metadata("report", report.display())
            .with_metadata("charts", charts))
    }

    fn step_name(&self) -> &'static str {
        "export"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["relational", "ai"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn table(csv: &str) -> RawTable {
        RawTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn summary_counts_sustainable_rows() {
        let companies = table("company_id,country\na,Spain\nb,France\nc,Spain\n");
        let analysis = table("company_id,has_sustainability\na,true\nb,false\nc,True\n");
        let summary = ExportSummary::compute(&companies, &RawTable::default(), &RawTable::default(), &analysis);
        assert_eq!(summary.sustainable_companies, 2);
        assert!((summary.sustainability_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.countries, vec!["France".to_string(), "Spain".to_string()]);
    }

    #[test]
    fn json_summary_is_typed() {
        let companies = table("company_id,facility_count,country\na,3,Spain\n");
        let summary = ExportSummary::compute(&companies, &RawTable::default(), &RawTable::default(), &RawTable::default());
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let json = data_summary_json(&summary, &companies, &RawTable::default(), at);
        assert_eq!(json["metadata"]["pipeline_version"], "1.0");
        assert_eq!(json["metadata"]["countries_covered"][0], "Spain");
        assert_eq!(json["summary"]["total_companies"], 1);
        assert_eq!(json["companies"][0]["facility_count"], 3);
        assert!(json["summary"].get("countries").is_none());
    }

    #[test]
    fn report_lists_sorted_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        fs::create_dir_all(layout.raw_dir()).unwrap();
        for name in ["b.csv", "a.csv"] {
            fs::write(layout.raw_dir().join(name), "x\n").unwrap();
        }
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let report = build_report(&layout, at).unwrap();
        let raw = &report.outputs["data/raw"];
        assert_eq!(raw.file_count, 2);
        assert_eq!(raw.files, vec!["a.csv".to_string(), "b.csv".to_string()]);
        assert!(report.statistics.is_none());
        assert!(!report.outputs.contains_key("data/cleaned"));
    }
}
