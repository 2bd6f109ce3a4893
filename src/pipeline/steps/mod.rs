use async_trait::async_trait;
use chrono::{DateTime, Local};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::{DataLayout, PipelineConfig};
use crate::error::Result;

/// Command line shared by every stage binary.
#[derive(Parser, Debug)]
pub struct StageArgs {
    /// Path to the configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Everything a step needs to find its inputs and stamp its outputs.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub config: PipelineConfig,
    pub layout: DataLayout,
    pub started_at: DateTime<Local>,
}

impl StepContext {
    pub fn new(config: PipelineConfig) -> Self {
        let layout = config.layout();
        Self { config, layout, started_at: Local::now() }
    }

    /// Run date stamped on relational rows
    pub fn run_date(&self) -> String {
        self.started_at.format("%Y-%m-%d").to_string()
    }
}

/// Common trait for all pipeline steps
#[async_trait]
pub trait PipelineStep: Send + Sync {
    async fn execute(&self, ctx: &StepContext) -> Result<StepResult>;

    fn step_name(&self) -> &'static str;

    /// Steps whose outputs this one reads
    fn dependencies(&self) -> Vec<&'static str>;
}

/// Result of executing a pipeline step
#[derive(Debug, Clone)]
pub struct StepResult {
    pub success: bool,
    pub processed_count: usize,
    pub message: String,
    pub metadata: BTreeMap<String, String>,
}

impl StepResult {
    pub fn success(processed: usize, message: String) -> Self {
        Self { success: true, processed_count: processed, message, metadata: BTreeMap::new() }
    }

    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Metadata as `key=value` pairs in key order, for the completion log.
    pub fn metadata_line(&self) -> String {
        self.metadata.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(", ")
    }
}

/// Runs one step with its banner, timing and stage metrics.
pub async fn run_step(step: &dyn PipelineStep, ctx: &StepContext) -> Result<StepResult> {
    let name = step.step_name();
    println!("\n{}", "=".repeat(60));
    println!(" {}", name.replace('_', " ").to_uppercase());
    println!("{}", "=".repeat(60));
    info!("🔄 Starting step '{}' (depends on: {:?})", name, step.dependencies());

    crate::metrics::stage::run_started(name);
    let started = Instant::now();
    let outcome = step.execute(ctx).await;
    crate::metrics::stage::duration(name, started.elapsed().as_secs_f64());

    match &outcome {
        Ok(result) if result.success => {
            crate::metrics::stage::records_processed(name, result.processed_count);
            info!(
                "✅ Step '{}' completed in {:.1}s: {} ({} records)",
                name,
                started.elapsed().as_secs_f64(),
                result.message,
                result.processed_count
            );
            if !result.metadata.is_empty() {
                info!("   {}", result.metadata_line());
            }
        }
        Ok(result) => {
            crate::metrics::stage::run_failed(name);
            error!("❌ Step '{}' reported failure: {}", name, result.message);
        }
        Err(e) => {
            crate::metrics::stage::run_failed(name);
            error!("❌ Step '{}' failed: {}", name, e);
        }
    }
    outcome
}

/// Entry point shared by the stage binaries: loads `.env` and configuration,
/// sets up logging and metrics, runs the step and maps the outcome to an
/// exit code. Failures are also written to stderr for the orchestrator.
pub async fn run_step_main<S: PipelineStep>(step: S, config_path: Option<&Path>) -> ExitCode {
    dotenv::dotenv().ok();
    crate::logging::init_logging();
    crate::metrics::init();

    let config = match PipelineConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let ctx = StepContext::new(config);

    let outcome = run_step(&step, &ctx).await;

    if let Err(e) = crate::metrics::write_snapshot(&ctx.layout.logs_dir(), step.step_name()) {
        warn!("Could not write metrics snapshot: {}", e);
    }

    match outcome {
        Ok(result) if result.success => ExitCode::SUCCESS,
        Ok(result) => {
            eprintln!("ERROR: {}", result.message);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

pub mod acquisition;
pub mod analytics;
pub mod clean_companies;
pub mod clean_facilities;
pub mod export;
pub mod relational;
pub mod sustainability;

pub use acquisition::AcquisitionStep;
pub use analytics::AnalyticsStep;
pub use clean_companies::CleanCompaniesStep;
pub use clean_facilities::CleanFacilitiesStep;
pub use export::ExportStep;
pub use relational::RelationalStep;
pub use sustainability::SustainabilityStep;
