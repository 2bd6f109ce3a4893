// Batch pipeline: raw snapshots, processing logic, stage steps and the
// orchestrator that runs the stage binaries

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod steps;

pub use orchestrator::{Orchestrator, Phase, RunSummary};
pub use steps::{PipelineStep, StepContext, StepResult};
