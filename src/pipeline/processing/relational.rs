//! Assembly of the relational tables from the cleaned ones.

use std::collections::HashMap;

use crate::constants::{RECORD_SOURCE, RELATIONSHIP_OWNERSHIP};
use crate::domain::{
    Company, CompanyFacilityLink, Facility, RelationalCompany, RelationalFacility, RelationalLink,
};

#[derive(Debug, Clone, Default)]
pub struct RelationalTables {
    pub companies: Vec<RelationalCompany>,
    pub facilities: Vec<RelationalFacility>,
    pub links: Vec<RelationalLink>,
}

/// Number of links per company id.
pub fn facility_counts(links: &[CompanyFacilityLink]) -> HashMap<&str, u64> {
    let mut counts = HashMap::new();
    for link in links {
        *counts.entry(link.company_id.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Stamps every row with the record source and `created_date`, and gives
/// each company its link count (0 when it has none).
pub fn assemble(
    companies: &[Company],
    facilities: &[Facility],
    links: &[CompanyFacilityLink],
    created_date: &str,
) -> RelationalTables {
    let counts = facility_counts(links);

    let companies = companies
        .iter()
        .map(|c| RelationalCompany {
            company_id: c.company_id.clone(),
            company_name: c.company_name.clone(),
            country: c.country.clone(),
            original_name: c.original_name.clone(),
            record_source: RECORD_SOURCE.to_string(),
            created_date: created_date.to_string(),
            facility_count: counts.get(c.company_id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    let facilities = facilities
        .iter()
        .map(|f| RelationalFacility {
            facility_id: f.facility_id.clone(),
            facility_name: f.facility_name.clone(),
            latitude: f.latitude,
            longitude: f.longitude,
            country: f.country.clone(),
            address: f.address.clone(),
            sector: f.sector.clone(),
            record_source: RECORD_SOURCE.to_string(),
            created_date: created_date.to_string(),
        })
        .collect();

    let links = links
        .iter()
        .map(|l| RelationalLink {
            company_id: l.company_id.clone(),
            facility_id: l.facility_id.clone(),
            relationship_type: RELATIONSHIP_OWNERSHIP.to_string(),
            created_date: created_date.to_string(),
        })
        .collect();

    RelationalTables { companies, facilities, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: &str) -> Company {
        Company {
            company_id: id.to_string(),
            company_name: id.to_uppercase(),
            country: "Malta".to_string(),
            original_name: id.to_string(),
        }
    }

    fn link(c: &str, f: &str) -> CompanyFacilityLink {
        CompanyFacilityLink { company_id: c.to_string(), facility_id: f.to_string() }
    }

    #[test]
    fn counts_default_to_zero() {
        let links = vec![link("a", "f1"), link("a", "f2"), link("b", "f3")];
        let tables = assemble(&[company("a"), company("b"), company("c")], &[], &links, "2024-05-01");

        let counts: Vec<u64> = tables.companies.iter().map(|c| c.facility_count).collect();
        assert_eq!(counts, vec![2, 1, 0]);
        assert!(tables.companies.iter().all(|c| c.record_source == "OAR Pipeline v1.0"));
        assert!(tables.links.iter().all(|l| l.relationship_type == "ownership"));
        assert_eq!(tables.links[0].created_date, "2024-05-01");
    }

    #[test]
    fn dangling_links_are_kept() {
        let links = vec![link("ghost", "f1")];
        let tables = assemble(&[company("a")], &[], &links, "2024-05-01");
        assert_eq!(tables.links.len(), 1);
        assert_eq!(tables.companies[0].facility_count, 0);
    }
}
