use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::app::ports::ContinuePromptPort;
use crate::config::DataLayout;
use crate::error::Result;

/// Phase names and their binaries, in run order.
pub const STAGE_BINARIES: [(&str, &str); 7] = [
    ("scrape", "oar-scrape"),
    ("clean-companies", "oar-clean-companies"),
    ("clean-facilities", "oar-clean-facilities"),
    ("relational", "oar-relational"),
    ("analytics", "oar-analytics"),
    ("ai", "oar-ai"),
    ("export", "oar-export"),
];

const STDOUT_LOG_THRESHOLD: usize = 100;
const STDOUT_EXCERPT: usize = 500;
const STDERR_EXCERPT: usize = 1000;

/// One subprocess in the pipeline.
#[derive(Debug, Clone)]
pub struct Phase {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Phase {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self { name: name.into(), program: program.into(), args }
    }
}

/// The seven stage binaries, expected next to the orchestrator executable.
/// A config path is forwarded to every stage.
pub fn default_phases(bin_dir: &Path, config: Option<&Path>) -> Vec<Phase> {
    let args = match config {
        Some(path) => vec!["--config".to_string(), path.display().to_string()],
        None => Vec::new(),
    };
    STAGE_BINARIES
        .iter()
        .map(|(name, binary)| {
            let program = bin_dir.join(format!("{}{}", binary, std::env::consts::EXE_SUFFIX));
            Phase::new(*name, program, args.clone())
        })
        .collect()
}

/// Creates whichever working directories are missing and returns them.
pub fn ensure_working_dirs(layout: &DataLayout) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for dir in layout.working_dirs() {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            warn!("Directory created: {}", dir.display());
            created.push(dir);
        }
    }
    Ok(created)
}

pub fn missing_binaries(phases: &[Phase]) -> Vec<PathBuf> {
    phases.iter().filter(|p| !p.program.is_file()).map(|p| p.program.clone()).collect()
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    Succeeded,
    Failed { exit_code: Option<i32> },
    TimedOut,
    SpawnFailed(String),
}

#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub name: String,
    pub outcome: PhaseOutcome,
    pub duration: Duration,
    pub stdout: String,
    pub stderr: String,
}

impl PhaseReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == PhaseOutcome::Succeeded
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<PhaseReport>,
    pub total_phases: usize,
}

impl RunSummary {
    pub fn successful(&self) -> usize {
        self.reports.iter().filter(|r| r.succeeded()).count()
    }

    pub fn skipped(&self) -> usize {
        self.total_phases.saturating_sub(self.reports.len())
    }

    pub fn all_succeeded(&self) -> bool {
        self.skipped() == 0 && self.reports.iter().all(PhaseReport::succeeded)
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    pub fn print(&self) {
        println!("\n{}", "=".repeat(60));
        println!("PIPELINE SUMMARY");
        println!("{}", "=".repeat(60));
        for report in &self.reports {
            let mark = if report.succeeded() { "✅" } else { "❌" };
            println!("  {} {:20} {:>8.1}s", mark, report.name, report.duration.as_secs_f64());
        }
        if self.skipped() > 0 {
            println!("  ⏭️  {} phase(s) not run", self.skipped());
        }
        println!("\nResult: {}/{} phases successful", self.successful(), self.total_phases);
        if self.all_succeeded() {
            println!("🎉 Pipeline completed successfully");
        } else {
            println!("⚠️  Pipeline finished with errors");
        }
    }
}

/// Runs the phases one after another, each in its own process.
pub struct Orchestrator {
    phases: Vec<Phase>,
    timeout: Duration,
    prompt: Box<dyn ContinuePromptPort>,
}

impl Orchestrator {
    pub fn new(phases: Vec<Phase>, timeout: Duration, prompt: Box<dyn ContinuePromptPort>) -> Self {
        Self { phases, timeout, prompt }
    }

    pub async fn run_phase(&self, phase: &Phase) -> PhaseReport {
        println!("\n🚀 Phase: {}", phase.name);
        info!("Running {} ({})", phase.name, phase.program.display());

        let started = Instant::now();
        let mut command = Command::new(&phase.program);
        command
            .args(&phase.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let execution = async {
            let child = command.spawn()?;
            child.wait_with_output().await
        };

        let (outcome, stdout, stderr) = match tokio::time::timeout(self.timeout, execution).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                let outcome = if output.status.success() {
                    PhaseOutcome::Succeeded
                } else {
                    PhaseOutcome::Failed { exit_code: output.status.code() }
                };
                (outcome, stdout, stderr)
            }
            Ok(Err(e)) => (PhaseOutcome::SpawnFailed(e.to_string()), String::new(), String::new()),
            Err(_) => (PhaseOutcome::TimedOut, String::new(), String::new()),
        };
        let duration = started.elapsed();

        match &outcome {
            PhaseOutcome::Succeeded => {
                crate::metrics::orchestrator::phase_succeeded();
                info!("✅ {} completed in {:.1}s", phase.name, duration.as_secs_f64());
                if stdout.chars().count() > STDOUT_LOG_THRESHOLD {
                    info!("Output:\n{}", excerpt(&stdout, STDOUT_EXCERPT));
                }
            }
            PhaseOutcome::Failed { exit_code } => {
                crate::metrics::orchestrator::phase_failed();
                match exit_code {
                    Some(code) => error!("❌ {} failed with exit code {}", phase.name, code),
                    None => error!("❌ {} was terminated by a signal", phase.name),
                }
                if !stderr.is_empty() {
                    error!("Error:\n{}", excerpt(&stderr, STDERR_EXCERPT));
                }
            }
            PhaseOutcome::TimedOut => {
                crate::metrics::orchestrator::phase_timed_out();
                crate::metrics::orchestrator::phase_failed();
                error!("⏰ {} timed out after {}s", phase.name, self.timeout.as_secs());
            }
            PhaseOutcome::SpawnFailed(reason) => {
                crate::metrics::orchestrator::phase_failed();
                error!("💥 Could not start {}: {}", phase.name, reason);
            }
        }

        PhaseReport { name: phase.name.clone(), outcome, duration, stdout, stderr }
    }

    /// Runs every phase in order. After a failure the prompt decides whether
    /// the remaining phases still run.
    pub async fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary { reports: Vec::new(), total_phases: self.phases.len() };
        let started = Instant::now();

        for idx in 0..self.phases.len() {
            let report = self.run_phase(&self.phases[idx]).await;
            let failed = !report.succeeded();
            let name = report.name.clone();
            summary.reports.push(report);

            let is_last = idx + 1 == self.phases.len();
            if failed && !is_last && !self.prompt.confirm_continue(&name) {
                warn!("Pipeline stopped after '{}'", name);
                break;
            }
        }

        info!("Total pipeline time: {:.1}s", started.elapsed().as_secs_f64());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPrompt(Vec<bool>);

    impl ContinuePromptPort for ScriptedPrompt {
        fn confirm_continue(&mut self, _failed_phase: &str) -> bool {
            if self.0.is_empty() {
                false
            } else {
                self.0.remove(0)
            }
        }
    }

    fn prompt(answers: Vec<bool>) -> Box<dyn ContinuePromptPort> {
        Box::new(ScriptedPrompt(answers))
    }

    fn sh(name: &str, script: &str) -> Phase {
        Phase::new(name, "/bin/sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("abc", 10), "abc");
        assert_eq!(excerpt("", 3), "");
    }

    #[test]
    fn default_phases_follow_stage_order() {
        let phases = default_phases(Path::new("/opt/bin"), Some(Path::new("cfg.toml")));
        let names: Vec<&str> = phases.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["scrape", "clean-companies", "clean-facilities", "relational", "analytics", "ai", "export"]
        );
        assert!(phases[0].program.starts_with("/opt/bin"));
        assert_eq!(phases[3].args, vec!["--config".to_string(), "cfg.toml".to_string()]);
    }

    #[test]
    fn missing_binaries_are_reported() {
        let phases = vec![sh("ok", "true"), Phase::new("gone", "/nonexistent/oar-gone", vec![])];
        assert_eq!(missing_binaries(&phases), vec![PathBuf::from("/nonexistent/oar-gone")]);
    }

    #[test]
    fn working_dirs_are_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let created = ensure_working_dirs(&layout).unwrap();
        assert_eq!(created.len(), layout.working_dirs().len());
        assert!(ensure_working_dirs(&layout).unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_phases_succeed() {
        let phases = vec![sh("one", "echo one"), sh("two", "echo two")];
        let mut orchestrator =
            Orchestrator::new(phases, Duration::from_secs(10), prompt(vec![]));
        let summary = orchestrator.run().await;
        assert_eq!(summary.successful(), 2);
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.reports[0].stdout.trim(), "one");
    }

    #[tokio::test]
    async fn failure_captures_exit_code_and_stderr() {
        let orchestrator = Orchestrator::new(vec![], Duration::from_secs(10), prompt(vec![]));
        let report = orchestrator.run_phase(&sh("bad", "echo 'ERROR: boom' >&2; exit 3")).await;
        assert_eq!(report.outcome, PhaseOutcome::Failed { exit_code: Some(3) });
        assert!(report.stderr.contains("ERROR: boom"));
    }

    #[tokio::test]
    async fn declining_the_prompt_skips_remaining_phases() {
        let phases = vec![sh("a", "exit 1"), sh("b", "true"), sh("c", "true")];
        let mut orchestrator =
            Orchestrator::new(phases, Duration::from_secs(10), prompt(vec![false]));
        let summary = orchestrator.run().await;
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn continuing_after_failure_still_exits_nonzero() {
        let phases = vec![sh("a", "exit 1"), sh("b", "true")];
        let mut orchestrator =
            Orchestrator::new(phases, Duration::from_secs(10), prompt(vec![true]));
        let summary = orchestrator.run().await;
        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.successful(), 1);
        assert_eq!(summary.skipped(), 0);
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn slow_phase_times_out() {
        let orchestrator = Orchestrator::new(vec![], Duration::from_millis(200), prompt(vec![]));
        let report = orchestrator.run_phase(&sh("slow", "sleep 5")).await;
        assert_eq!(report.outcome, PhaseOutcome::TimedOut);
        assert!(report.duration < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn unstartable_phase_is_a_failure() {
        let orchestrator = Orchestrator::new(vec![], Duration::from_secs(1), prompt(vec![]));
        let report = orchestrator.run_phase(&Phase::new("gone", "/nonexistent/oar-gone", vec![])).await;
        assert!(matches!(report.outcome, PhaseOutcome::SpawnFailed(_)));
        assert!(!report.succeeded());
    }
}
