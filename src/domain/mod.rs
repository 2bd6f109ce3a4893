//! Record shapes shared across stages. Each struct maps one-to-one onto the
//! columns of the CSV file that carries it between stages.

pub mod raw;

use serde::{Deserialize, Serialize};

pub use raw::{CellValue, RawTable};

/// A cleaned, deduplicated company (`data/cleaned/companies.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Stable identifier derived from cleaned name and normalized country
    pub company_id: String,
    pub company_name: String,
    pub country: String,
    /// Raw name as it appeared in the source, used for facility linkage
    #[serde(default)]
    pub original_name: String,
}

/// A cleaned, deduplicated facility (`data/cleaned/facilities.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Stable identifier derived from name and coordinates
    pub facility_id: String,
    pub facility_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    #[serde(default)]
    pub address: String,
    pub sector: String,
}

/// Ownership link between a company and a facility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyFacilityLink {
    pub company_id: String,
    pub facility_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalCompany {
    pub company_id: String,
    pub company_name: String,
    pub country: String,
    #[serde(default)]
    pub original_name: String,
    pub record_source: String,
    pub created_date: String,
    pub facility_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalFacility {
    pub facility_id: String,
    pub facility_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    #[serde(default)]
    pub address: String,
    pub sector: String,
    pub record_source: String,
    pub created_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalLink {
    pub company_id: String,
    pub facility_id: String,
    pub relationship_type: String,
    pub created_date: String,
}

/// The subset of company columns the sustainability stage needs. Reads both
/// the relational table and, as a fallback, the cleaned table (where
/// `facility_count` is absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_id: String,
    pub company_name: String,
    pub country: String,
    #[serde(default)]
    pub facility_count: u64,
}

/// Keyword-scoring outcome for one company name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityAnalysis {
    pub has_sustainability: bool,
    /// min(matched / 5, 1.0); a saturating scale, not a probability
    pub sustainability_score: f64,
    pub keywords_found: Vec<String>,
    pub keyword_count: usize,
}

/// One row of `ai_analysis_full.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    pub company_id: String,
    pub company_name: String,
    pub country: String,
    pub has_sustainability: bool,
    pub sustainability_score: f64,
    /// `;`-joined keyword list
    pub keywords_found: String,
    pub keyword_count: usize,
    pub ai_summary: String,
    pub facility_count: u64,
}

/// One row of `ai_analysis_simple.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAnalysisSimple {
    pub company_id: String,
    pub company_name: String,
    pub country: String,
    pub has_sustainability: bool,
    pub sustainability_score: f64,
    pub ai_summary: String,
}

impl From<&CompanyAnalysis> for CompanyAnalysisSimple {
    fn from(a: &CompanyAnalysis) -> Self {
        Self {
            company_id: a.company_id.clone(),
            company_name: a.company_name.clone(),
            country: a.country.clone(),
            has_sustainability: a.has_sustainability,
            sustainability_score: a.sustainability_score,
            ai_summary: a.ai_summary.clone(),
        }
    }
}
