use async_trait::async_trait;

use crate::error::Result;

// Ingest-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// Orchestrator-side ports

/// Asks the operator whether the pipeline should go on after a failed phase.
pub trait ContinuePromptPort: Send {
    fn confirm_continue(&mut self, failed_phase: &str) -> bool;
}
