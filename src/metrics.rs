//! Metrics for the pipeline stages.
//!
//! Every stage binary installs a Prometheus recorder and renders a text
//! snapshot to `logs/metrics_<stage>.prom` before it exits. There is no HTTP
//! listener: stages are short-lived processes.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::error::Result;

static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Every metric name the pipeline records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Stage lifecycle
    StageRuns,
    StageFailures,
    StageDuration,
    StageRecordsProcessed,

    // Acquisition
    AcquisitionRowsFetched,
    AcquisitionRowsKept,
    AcquisitionSyntheticFallbacks,
    AcquisitionDownloadDuration,

    // Entity resolution
    CompaniesRowsSeen,
    CompaniesUnique,
    FacilitiesRowsSeen,
    FacilitiesUnique,
    LinksMatched,
    LinksFallback,

    // Relational assembly
    IntegrityErrors,
    IntegrityWarnings,
    RelationalCompanies,

    // Analytics
    AnalyticsChartsWritten,

    // Sustainability
    SustainabilityCompaniesScored,
    SustainabilityCompaniesFlagged,
    SustainabilityScore,

    // Export
    ExportFilesWritten,

    // Orchestrator
    OrchestratorPhasesSucceeded,
    OrchestratorPhasesFailed,
    OrchestratorPhaseTimeouts,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::StageRuns => "oar_stage_runs_total",
            MetricName::StageFailures => "oar_stage_failures_total",
            MetricName::StageDuration => "oar_stage_duration_seconds",
            MetricName::StageRecordsProcessed => "oar_stage_records_processed",

            MetricName::AcquisitionRowsFetched => "oar_acquisition_rows_fetched_total",
            MetricName::AcquisitionRowsKept => "oar_acquisition_rows_kept",
            MetricName::AcquisitionSyntheticFallbacks => "oar_acquisition_synthetic_fallbacks_total",
            MetricName::AcquisitionDownloadDuration => "oar_acquisition_download_duration_seconds",

            MetricName::CompaniesRowsSeen => "oar_companies_rows_seen_total",
            MetricName::CompaniesUnique => "oar_companies_unique",
            MetricName::FacilitiesRowsSeen => "oar_facilities_rows_seen_total",
            MetricName::FacilitiesUnique => "oar_facilities_unique",
            MetricName::LinksMatched => "oar_links_matched_total",
            MetricName::LinksFallback => "oar_links_fallback_total",

            MetricName::IntegrityErrors => "oar_integrity_errors",
            MetricName::IntegrityWarnings => "oar_integrity_warnings",
            MetricName::RelationalCompanies => "oar_relational_companies",

            MetricName::AnalyticsChartsWritten => "oar_analytics_charts_written_total",

            MetricName::SustainabilityCompaniesScored => "oar_sustainability_companies_scored_total",
            MetricName::SustainabilityCompaniesFlagged => "oar_sustainability_companies_flagged_total",
            MetricName::SustainabilityScore => "oar_sustainability_score",

            MetricName::ExportFilesWritten => "oar_export_files_written_total",

            MetricName::OrchestratorPhasesSucceeded => "oar_orchestrator_phases_succeeded_total",
            MetricName::OrchestratorPhasesFailed => "oar_orchestrator_phases_failed_total",
            MetricName::OrchestratorPhaseTimeouts => "oar_orchestrator_phase_timeouts_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            StageRuns,
            StageFailures,
            StageDuration,
            StageRecordsProcessed,
            AcquisitionRowsFetched,
            AcquisitionRowsKept,
            AcquisitionSyntheticFallbacks,
            AcquisitionDownloadDuration,
            CompaniesRowsSeen,
            CompaniesUnique,
            FacilitiesRowsSeen,
            FacilitiesUnique,
            LinksMatched,
            LinksFallback,
            IntegrityErrors,
            IntegrityWarnings,
            RelationalCompanies,
            AnalyticsChartsWritten,
            SustainabilityCompaniesScored,
            SustainabilityCompaniesFlagged,
            SustainabilityScore,
            ExportFilesWritten,
            OrchestratorPhasesSucceeded,
            OrchestratorPhasesFailed,
            OrchestratorPhaseTimeouts,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Installs the Prometheus recorder. Idempotent; a failed install is logged
/// and metrics calls become no-ops.
pub fn init() {
    if HANDLE.get().is_some() {
        return;
    }
    match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            debug!("Prometheus recorder installed");
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Current metrics in Prometheus text format, if a recorder is installed.
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

pub fn snapshot_path(logs_dir: &Path, stage: &str) -> PathBuf {
    logs_dir.join(format!("metrics_{}.prom", stage))
}

/// Writes the rendered metrics to `logs/metrics_<stage>.prom`.
pub fn write_snapshot(logs_dir: &Path, stage: &str) -> Result<Option<PathBuf>> {
    let Some(text) = render() else {
        return Ok(None);
    };
    fs::create_dir_all(logs_dir)?;
    let path = snapshot_path(logs_dir, stage);
    fs::write(&path, text)?;
    info!("Metrics snapshot written: {}", path.display());
    Ok(Some(path))
}

// ============================================================================
// Stage lifecycle
// ============================================================================

pub mod stage {
    use super::MetricName;

    pub fn run_started(stage: &'static str) {
        ::metrics::counter!(MetricName::StageRuns.as_str(), "stage" => stage).increment(1);
    }

    pub fn run_failed(stage: &'static str) {
        ::metrics::counter!(MetricName::StageFailures.as_str(), "stage" => stage).increment(1);
    }

    pub fn duration(stage: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage).record(secs);
    }

    pub fn records_processed(stage: &'static str, count: usize) {
        ::metrics::gauge!(MetricName::StageRecordsProcessed.as_str(), "stage" => stage).set(count as f64);
    }
}

pub mod acquisition {
    use super::MetricName;

    pub fn rows_fetched(count: usize) {
        ::metrics::counter!(MetricName::AcquisitionRowsFetched.as_str()).increment(count as u64);
    }

    pub fn rows_kept(count: usize) {
        ::metrics::gauge!(MetricName::AcquisitionRowsKept.as_str()).set(count as f64);
    }

    pub fn synthetic_fallback() {
        ::metrics::counter!(MetricName::AcquisitionSyntheticFallbacks.as_str()).increment(1);
    }

    pub fn download_duration(secs: f64) {
        ::metrics::histogram!(MetricName::AcquisitionDownloadDuration.as_str()).record(secs);
    }
}

pub mod resolution {
    use super::MetricName;

    pub fn companies(rows_seen: usize, unique: usize) {
        ::metrics::counter!(MetricName::CompaniesRowsSeen.as_str()).increment(rows_seen as u64);
        ::metrics::gauge!(MetricName::CompaniesUnique.as_str()).set(unique as f64);
    }

    pub fn facilities(rows_seen: usize, unique: usize) {
        ::metrics::counter!(MetricName::FacilitiesRowsSeen.as_str()).increment(rows_seen as u64);
        ::metrics::gauge!(MetricName::FacilitiesUnique.as_str()).set(unique as f64);
    }

    pub fn links(matched: usize, fallback: usize) {
        ::metrics::counter!(MetricName::LinksMatched.as_str()).increment(matched as u64);
        ::metrics::counter!(MetricName::LinksFallback.as_str()).increment(fallback as u64);
    }
}

pub mod relational {
    use super::MetricName;

    pub fn integrity(errors: usize, warnings: usize) {
        ::metrics::gauge!(MetricName::IntegrityErrors.as_str()).set(errors as f64);
        ::metrics::gauge!(MetricName::IntegrityWarnings.as_str()).set(warnings as f64);
    }

    pub fn companies(count: usize) {
        ::metrics::gauge!(MetricName::RelationalCompanies.as_str()).set(count as f64);
    }
}

pub mod analytics {
    use super::MetricName;

    pub fn chart_written() {
        ::metrics::counter!(MetricName::AnalyticsChartsWritten.as_str()).increment(1);
    }
}

pub mod sustainability {
    use super::MetricName;

    pub fn company_scored(flagged: bool, score: f64) {
        ::metrics::counter!(MetricName::SustainabilityCompaniesScored.as_str()).increment(1);
        if flagged {
            ::metrics::counter!(MetricName::SustainabilityCompaniesFlagged.as_str()).increment(1);
        }
        ::metrics::histogram!(MetricName::SustainabilityScore.as_str()).record(score);
    }
}

pub mod export {
    use super::MetricName;

    pub fn file_written() {
        ::metrics::counter!(MetricName::ExportFilesWritten.as_str()).increment(1);
    }
}

pub mod orchestrator {
    use super::MetricName;

    pub fn phase_succeeded() {
        ::metrics::counter!(MetricName::OrchestratorPhasesSucceeded.as_str()).increment(1);
    }

    pub fn phase_failed() {
        ::metrics::counter!(MetricName::OrchestratorPhasesFailed.as_str()).increment(1);
    }

    pub fn phase_timed_out() {
        ::metrics::counter!(MetricName::OrchestratorPhaseTimeouts.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn metric_names_are_unique_and_prefixed() {
        let names: Vec<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| n.starts_with("oar_")));
    }

    #[test]
    fn snapshot_path_is_per_stage() {
        let path = snapshot_path(Path::new("logs"), "relational");
        assert_eq!(path, PathBuf::from("logs/metrics_relational.prom"));
    }
}
