pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

// Layered boundaries for application logic and infrastructure adapters
pub mod app;
pub mod infra;

// Record shapes shared across stages
pub mod domain;
