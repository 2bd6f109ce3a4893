use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Pipeline configuration. Every field has a default, so an absent
/// `config.toml` yields a working setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub source: SourceConfig,
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub countries: Vec<String>,
    pub synthetic_rows: usize,
    pub synthetic_seed: u64,
    pub min_expected_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub stage_timeout_seconds: u64,
    pub interactive: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { data_root: PathBuf::from(".") }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_SOURCE_URL.to_string(),
            timeout_seconds: 120,
            countries: constants::TARGET_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            synthetic_rows: 15_000,
            synthetic_seed: 42,
            min_expected_rows: 10_000,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { stage_timeout_seconds: 600, interactive: true }
    }
}

impl PipelineConfig {
    /// Loads configuration from `path`, or from `OAR_PIPELINE_CONFIG`, or from
    /// `config.toml`. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var("OAR_PIPELINE_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(|e| {
                PipelineError::Config(format!("Failed to read config file '{}': {}", config_path.display(), e))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var("OAR_SOURCE_URL") {
            config.source.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.countries.is_empty() {
            return Err(PipelineError::Config("source.countries must not be empty".to_string()));
        }
        if self.orchestrator.stage_timeout_seconds == 0 {
            return Err(PipelineError::Config("orchestrator.stage_timeout_seconds must be positive".to_string()));
        }
        Ok(())
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.paths.data_root)
    }
}

/// Resolves the fixed relative file layout against a data root.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(constants::RAW_DIR)
    }

    pub fn cleaned_dir(&self) -> PathBuf {
        self.root.join(constants::CLEANED_DIR)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join(constants::OUTPUTS_DIR)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.root.join(constants::EXPORT_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(constants::LOGS_DIR)
    }

    pub fn cleaned(&self, file: &str) -> PathBuf {
        self.cleaned_dir().join(file)
    }

    pub fn output(&self, file: &str) -> PathBuf {
        self.outputs_dir().join(file)
    }

    /// Directories the orchestrator makes sure exist before the first stage.
    pub fn working_dirs(&self) -> Vec<PathBuf> {
        vec![self.raw_dir(), self.cleaned_dir(), self.outputs_dir(), self.logs_dir()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config.orchestrator.stage_timeout_seconds, 600);
        assert_eq!(config.source.synthetic_seed, 42);
        assert_eq!(config.source.countries.len(), 7);
        assert_eq!(config.paths.data_root, PathBuf::from("."));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            [orchestrator]
            stage_timeout_seconds = 30

            [source]
            url = "http://localhost:1/none.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.orchestrator.stage_timeout_seconds, 30);
        assert!(config.orchestrator.interactive);
        assert_eq!(config.source.url, "http://localhost:1/none.csv");
        assert_eq!(config.source.min_expected_rows, 10_000);
    }

    #[test]
    fn rejects_empty_country_list() {
        let config = PipelineConfig::from_toml("[source]\ncountries = []").unwrap();
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn layout_resolves_fixed_paths() {
        let layout = DataLayout::new("/tmp/run");
        assert_eq!(layout.cleaned("companies.csv"), PathBuf::from("/tmp/run/data/cleaned/companies.csv"));
        assert_eq!(layout.output("x.csv"), PathBuf::from("/tmp/run/data/outputs/x.csv"));
        assert_eq!(layout.working_dirs().len(), 4);
    }
}
