//! Entity resolution: turns raw registry rows into deduplicated companies and
//! facilities with stable identifiers, and links each facility to a company.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::constants::{UNKNOWN, UNKNOWN_COMPANY_ID};
use crate::domain::{Company, CompanyFacilityLink, Facility, RawTable};
use crate::pipeline::processing::identity::{company_id, dedup_by_key, facility_id};
use crate::pipeline::processing::normalize::{
    clean_company_name, clean_facility_name, normalize_country, parse_coordinate,
};

/// Columns that may carry the company name, in order of preference.
pub const COMPANY_NAME_COLUMNS: [&str; 3] = ["company_name", "name", "company"];
/// Columns tried, in order, when looking up a facility's owning company.
pub const LINK_LOOKUP_COLUMNS: [&str; 4] = ["company_name", "name", "company", "organization"];
pub const FACILITY_NAME_COLUMNS: [&str; 2] = ["facility_name", "name"];
pub const COUNTRY_COLUMNS: [&str; 2] = ["country", "country_name"];
pub const LATITUDE_COLUMNS: [&str; 2] = ["lat", "latitude"];
pub const LONGITUDE_COLUMNS: [&str; 3] = ["lon", "lng", "longitude"];

#[derive(Debug, Clone)]
pub struct CompanyExtraction {
    pub companies: Vec<Company>,
    /// Rows read before deduplication
    pub rows_seen: usize,
    /// Column the names were read from
    pub name_column: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FacilityExtraction {
    pub facilities: Vec<Facility>,
    pub links: Vec<CompanyFacilityLink>,
    pub rows_seen: usize,
    /// Rows linked by exact original-name match
    pub matched_links: usize,
    /// Rows that fell back to the first known company
    pub fallback_links: usize,
}

/// Picks the company-name column: the first preferred column present, else
/// the first column of the table.
fn company_name_column(raw: &RawTable) -> Option<String> {
    if let Some(col) = raw.first_column(&COMPANY_NAME_COLUMNS) {
        return Some(col.to_string());
    }
    let fallback = raw.headers().first().cloned();
    if let Some(col) = &fallback {
        warn!("Company column not found, using first column: {}", col);
    }
    fallback
}

/// Cleans every row into a company and keeps the first row per identifier.
pub fn extract_companies(raw: &RawTable) -> CompanyExtraction {
    let name_column = company_name_column(raw);

    let companies: Vec<Company> = raw
        .rows()
        .map(|row| {
            let raw_name = name_column.as_deref().and_then(|c| row.get(c));
            let company_name = clean_company_name(raw_name);
            let country = normalize_country(row.get_any(&COUNTRY_COLUMNS));
            Company {
                company_id: company_id(&company_name, &country),
                company_name,
                country,
                original_name: raw_name.unwrap_or_default().to_string(),
            }
        })
        .collect();

    let rows_seen = companies.len();
    let companies = dedup_companies(companies);
    info!("Companies cleaned: {} unique out of {} rows", companies.len(), rows_seen);

    CompanyExtraction { companies, rows_seen, name_column }
}

pub fn dedup_companies(companies: Vec<Company>) -> Vec<Company> {
    dedup_by_key(companies, |c| c.company_id.clone())
}

pub fn dedup_facilities(facilities: Vec<Facility>) -> Vec<Facility> {
    dedup_by_key(facilities, |f| f.facility_id.clone())
}

pub fn dedup_links(links: Vec<CompanyFacilityLink>) -> Vec<CompanyFacilityLink> {
    dedup_by_key(links, |l| l.clone())
}

/// Exact-match index from lower-cased, trimmed original company names to
/// company ids. When several companies share a name the last one wins.
#[derive(Debug, Default)]
pub struct CompanyIndex {
    by_original_name: HashMap<String, String>,
    fallback_id: Option<String>,
}

impl CompanyIndex {
    pub fn build(companies: &[Company]) -> Self {
        let mut by_original_name = HashMap::with_capacity(companies.len());
        for company in companies {
            let key = company.original_name.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            by_original_name.insert(key, company.company_id.clone());
        }
        Self {
            by_original_name,
            fallback_id: companies.first().map(|c| c.company_id.clone()),
        }
    }

    pub fn lookup(&self, raw_name: &str) -> Option<&str> {
        self.by_original_name.get(&raw_name.trim().to_lowercase()).map(String::as_str)
    }

    /// Identifier assigned when no lookup column matches: the first company
    /// seen, a known-imprecise placeholder.
    pub fn fallback(&self) -> &str {
        self.fallback_id.as_deref().unwrap_or(UNKNOWN_COMPANY_ID)
    }

    pub fn len(&self) -> usize {
        self.by_original_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_original_name.is_empty()
    }
}

/// Builds facilities from raw rows and links each one to a company.
pub fn extract_facilities(raw: &RawTable, companies: &[Company]) -> FacilityExtraction {
    let index = CompanyIndex::build(companies);
    debug!("Company index built with {} original names", index.len());

    let mut facilities = Vec::with_capacity(raw.len());
    let mut links = Vec::with_capacity(raw.len());
    let mut matched_links = 0;
    let mut fallback_links = 0;

    for (idx, row) in raw.rows().enumerate() {
        let facility_name = match row.get_first_present(&FACILITY_NAME_COLUMNS) {
            Some(cell) => clean_facility_name(cell),
            None => clean_facility_name(Some(format!("Facility_{}", idx).as_str())),
        };

        let latitude = parse_coordinate(row.get_any(&LATITUDE_COLUMNS));
        let longitude = parse_coordinate(row.get_any(&LONGITUDE_COLUMNS));
        let id = facility_id(&facility_name, latitude, longitude);

        let matched = LINK_LOOKUP_COLUMNS
            .iter()
            .filter_map(|col| row.get(col))
            .find_map(|name| index.lookup(name));
        let owner = match matched {
            Some(company) => {
                matched_links += 1;
                company.to_string()
            }
            None => {
                fallback_links += 1;
                index.fallback().to_string()
            }
        };

        facilities.push(Facility {
            facility_id: id.clone(),
            facility_name,
            latitude,
            longitude,
            country: normalize_country(row.get_any(&COUNTRY_COLUMNS)),
            address: row.get("address").map(|a| a.trim().to_string()).unwrap_or_default(),
            sector: row.get("sector").unwrap_or(UNKNOWN).to_string(),
        });
        links.push(CompanyFacilityLink { company_id: owner, facility_id: id });

        if (idx + 1) % 1000 == 0 {
            info!("  Processed {}/{} facilities", idx + 1, raw.len());
        }
    }

    let rows_seen = facilities.len();
    let facilities = dedup_facilities(facilities);
    let links = dedup_links(links);

    if fallback_links > 0 {
        warn!(
            "{} facility rows had no exact company match and were linked to the fallback company {}",
            fallback_links,
            index.fallback()
        );
    }
    info!("Facilities: {}", facilities.len());
    info!("Links: {}", links.len());

    FacilityExtraction { facilities, links, rows_seen, matched_links, fallback_links }
}
