use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing input files: {}", .0.join(", "))]
    MissingInput(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stage error: {message}")]
    Stage { message: String },
}

impl PipelineError {
    pub fn missing<P: AsRef<std::path::Path>>(path: P) -> Self {
        PipelineError::MissingInput(vec![path.as_ref().display().to_string()])
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
