use clap::Parser;
use std::process::ExitCode;

use oar_pipeline::pipeline::steps::{run_step_main, ExportStep, StageArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let args = StageArgs::parse();
    run_step_main(ExportStep, args.config.as_deref()).await
}
