//! Fixed names shared by every stage so that each one finds the files
//! written by the stage before it.

// Directory layout, relative to the configured data root
pub const RAW_DIR: &str = "data/raw";
pub const CLEANED_DIR: &str = "data/cleaned";
pub const OUTPUTS_DIR: &str = "data/outputs";
pub const EXPORT_DIR: &str = "final_export";
pub const LOGS_DIR: &str = "logs";

// Acquisition
pub const RAW_SNAPSHOT_PREFIX: &str = "oar_raw_";
pub const DEFAULT_SOURCE_URL: &str = "https://data.openapparel.org/facilities.csv";
pub const TARGET_COUNTRIES: [&str; 7] = ["Morocco", "Spain", "Portugal", "Italy", "France", "Greece", "Malta"];

// Cleaned tables
pub const COMPANIES_FILE: &str = "companies.csv";
pub const FACILITIES_FILE: &str = "facilities.csv";
pub const LINKS_FILE: &str = "company_facilities.csv";

// Relational tables
pub const RELATIONAL_COMPANIES_FILE: &str = "relational_companies.csv";
pub const RELATIONAL_FACILITIES_FILE: &str = "relational_facilities.csv";
pub const RELATIONAL_LINKS_FILE: &str = "relational_links.csv";
pub const RECORD_SOURCE: &str = "OAR Pipeline v1.0";
pub const RELATIONSHIP_OWNERSHIP: &str = "ownership";

// Analysis outputs
pub const ANALYTICS_SUMMARY_FILE: &str = "analytics_summary.csv";
pub const AI_FULL_FILE: &str = "ai_analysis_full.csv";
pub const AI_SIMPLE_FILE: &str = "ai_analysis_simple.csv";
pub const AI_STATISTICS_FILE: &str = "ai_statistics.csv";
pub const TOP_SUSTAINABLE_FILE: &str = "top_sustainable_companies.csv";
pub const SUSTAINABILITY_BY_COUNTRY_FILE: &str = "sustainability_by_country.csv";
pub const CHART_EXTENSION: &str = "svg";

// Export
pub const PIPELINE_NAME: &str = "OAR Data Science Pipeline";
pub const PIPELINE_VERSION: &str = "1.0";
pub const DATA_SOURCE_NAME: &str = "Open Apparel Registry";

// Placeholders for missing values
pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_FACILITY: &str = "Unknown Facility";
pub const UNKNOWN_COMPANY_ID: &str = "UNKNOWN";
pub const NOT_AVAILABLE: &str = "N/A";
