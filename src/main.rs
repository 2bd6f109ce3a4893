use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

use oar_pipeline::app::ports::ContinuePromptPort;
use oar_pipeline::config::PipelineConfig;
use oar_pipeline::constants::PIPELINE_NAME;
use oar_pipeline::infra::stdin_prompt::{NonInteractivePrompt, StdinPrompt};
use oar_pipeline::pipeline::orchestrator::{default_phases, ensure_working_dirs, missing_binaries, Orchestrator};

#[derive(Parser)]
#[command(name = "oar_pipeline")]
#[command(about = "Runs the OAR pipeline stages in order, each as its own process")]
#[command(version)]
struct Cli {
    /// Path to the configuration file, forwarded to every stage
    #[arg(long)]
    config: Option<PathBuf>,
}

fn banner() {
    println!("{}", "=".repeat(60));
    println!(" {}", PIPELINE_NAME.to_uppercase());
    println!(" Open Apparel Registry: Morocco and Southern Europe");
    println!("{}", "=".repeat(60));
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = PipelineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let layout = config.layout();
    let (log_path, _guard) =
        oar_pipeline::logging::init_logging_with_file(&layout.logs_dir()).context("Failed to set up logging")?;
    oar_pipeline::metrics::init();

    banner();
    info!("Log file: {}", log_path.display());

    // Prerequisites
    ensure_working_dirs(&layout).context("Failed to create working directories")?;
    let exe = std::env::current_exe().context("Cannot locate the orchestrator executable")?;
    let bin_dir = exe.parent().context("Orchestrator executable has no parent directory")?;
    let phases = default_phases(bin_dir, cli.config.as_deref());

    let missing = missing_binaries(&phases);
    if !missing.is_empty() {
        for path in &missing {
            error!("Stage binary not found: {}", path.display());
        }
        error!("Prerequisites not met, aborting");
        return Ok(ExitCode::FAILURE);
    }
    info!("✅ Prerequisites satisfied");

    let prompt: Box<dyn ContinuePromptPort> = if config.orchestrator.interactive {
        Box::new(StdinPrompt)
    } else {
        Box::new(NonInteractivePrompt)
    };
    let timeout = Duration::from_secs(config.orchestrator.stage_timeout_seconds);
    let mut orchestrator = Orchestrator::new(phases, timeout, prompt);

    let summary = orchestrator.run().await;
    summary.print();

    if let Err(e) = oar_pipeline::metrics::write_snapshot(&layout.logs_dir(), "orchestrator") {
        warn!("Could not write metrics snapshot: {}", e);
    }

    Ok(ExitCode::from(summary.exit_code() as u8))
}
