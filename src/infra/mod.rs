// Adapters for the outside world: HTTP, files, spreadsheets, charts, stdin

pub mod csv_store;
pub mod http_client;
pub mod stdin_prompt;
pub mod svg_chart;
pub mod xlsx_writer;
