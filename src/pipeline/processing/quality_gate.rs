use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::domain::{Company, CompanyFacilityLink, Facility};

/// Severity levels for integrity issues
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum IntegritySeverity {
    /// Orphaned rows: unusual but not invalid
    Warning,
    /// Duplicate keys or dangling references
    Error,
}

/// Types of integrity issues that can be detected
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum IntegrityIssueType {
    DuplicateCompanyId,
    DuplicateFacilityId,
    FacilityWithoutLink,
    CompanyWithoutLink,
    LinkToMissingCompany,
    LinkToMissingFacility,
}

/// One failed check, with the number of offending rows
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IntegrityIssue {
    pub issue_type: IntegrityIssueType,
    pub severity: IntegritySeverity,
    pub count: usize,
    pub description: String,
}

/// Outcome of the referential integrity checks. Purely informational: the
/// caller logs it and carries on.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub errors: Vec<IntegrityIssue>,
    pub warnings: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    fn push(&mut self, issue_type: IntegrityIssueType, count: usize, description: String) {
        if count == 0 {
            return;
        }
        let severity = issue_type.severity();
        let issue = IntegrityIssue { issue_type, severity, count, description };
        match severity {
            IntegritySeverity::Error => self.errors.push(issue),
            IntegritySeverity::Warning => self.warnings.push(issue),
        }
    }
}

impl IntegrityIssueType {
    pub fn severity(&self) -> IntegritySeverity {
        match self {
            IntegrityIssueType::FacilityWithoutLink | IntegrityIssueType::CompanyWithoutLink => {
                IntegritySeverity::Warning
            }
            _ => IntegritySeverity::Error,
        }
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            IntegritySeverity::Error => "ERROR",
            IntegritySeverity::Warning => "WARNING",
        };
        write!(f, "[{}] {}", tag, self.description)
    }
}

fn duplicate_count<'a>(ids: impl Iterator<Item = &'a str>) -> usize {
    let mut seen = HashSet::new();
    ids.filter(|id| !seen.insert(*id)).count()
}

/// Runs every integrity check independently. Never mutates its inputs and
/// never fails.
pub fn validate_integrity(
    companies: &[Company],
    facilities: &[Facility],
    links: &[CompanyFacilityLink],
) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    let dup_companies = duplicate_count(companies.iter().map(|c| c.company_id.as_str()));
    report.push(
        IntegrityIssueType::DuplicateCompanyId,
        dup_companies,
        format!("{} duplicate company ids", dup_companies),
    );

    let dup_facilities = duplicate_count(facilities.iter().map(|f| f.facility_id.as_str()));
    report.push(
        IntegrityIssueType::DuplicateFacilityId,
        dup_facilities,
        format!("{} duplicate facility ids", dup_facilities),
    );

    let linked_facilities: HashSet<&str> = links.iter().map(|l| l.facility_id.as_str()).collect();
    let linked_companies: HashSet<&str> = links.iter().map(|l| l.company_id.as_str()).collect();

    let orphan_facilities = facilities
        .iter()
        .filter(|f| !linked_facilities.contains(f.facility_id.as_str()))
        .count();
    report.push(
        IntegrityIssueType::FacilityWithoutLink,
        orphan_facilities,
        format!("{} facilities without a company link", orphan_facilities),
    );

    let orphan_companies = companies
        .iter()
        .filter(|c| !linked_companies.contains(c.company_id.as_str()))
        .count();
    report.push(
        IntegrityIssueType::CompanyWithoutLink,
        orphan_companies,
        format!("{} companies without facilities", orphan_companies),
    );

    let known_companies: HashSet<&str> = companies.iter().map(|c| c.company_id.as_str()).collect();
    let known_facilities: HashSet<&str> = facilities.iter().map(|f| f.facility_id.as_str()).collect();

    let dangling_companies = links
        .iter()
        .filter(|l| !known_companies.contains(l.company_id.as_str()))
        .count();
    report.push(
        IntegrityIssueType::LinkToMissingCompany,
        dangling_companies,
        format!("{} links reference a nonexistent company", dangling_companies),
    );

    let dangling_facilities = links
        .iter()
        .filter(|l| !known_facilities.contains(l.facility_id.as_str()))
        .count();
    report.push(
        IntegrityIssueType::LinkToMissingFacility,
        dangling_facilities,
        format!("{} links reference a nonexistent facility", dangling_facilities),
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: &str) -> Company {
        Company {
            company_id: id.to_string(),
            company_name: format!("Company {}", id),
            country: "France".to_string(),
            original_name: String::new(),
        }
    }

    fn facility(id: &str) -> Facility {
        Facility {
            facility_id: id.to_string(),
            facility_name: format!("Facility {}", id),
            latitude: 0.0,
            longitude: 0.0,
            country: "France".to_string(),
            address: String::new(),
            sector: "Textile".to_string(),
        }
    }

    fn link(c: &str, f: &str) -> CompanyFacilityLink {
        CompanyFacilityLink { company_id: c.to_string(), facility_id: f.to_string() }
    }

    #[test]
    fn consistent_tables_pass() {
        let report = validate_integrity(&[company("c1")], &[facility("f1")], &[link("c1", "f1")]);
        assert!(report.is_clean());
        assert!(report.is_valid());
    }

    #[test]
    fn dangling_facility_reference_is_exactly_one_error() {
        let companies = vec![company("c1")];
        let facilities = vec![facility("f1")];
        let links = vec![link("c1", "f1"), link("c1", "f-missing")];

        let report = validate_integrity(&companies, &facilities, &links);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].issue_type, IntegrityIssueType::LinkToMissingFacility);
        assert_eq!(report.errors[0].count, 1);
        assert!(report.warnings.is_empty());
        assert!(!report.is_valid());
    }

    #[test]
    fn orphans_are_warnings_not_errors() {
        let companies = vec![company("c1"), company("c2")];
        let facilities = vec![facility("f1"), facility("f2")];
        let links = vec![link("c1", "f1")];

        let report = validate_integrity(&companies, &facilities, &links);

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().all(|w| w.severity == IntegritySeverity::Warning));
    }

    #[test]
    fn duplicates_and_dangling_companies_are_counted() {
        let companies = vec![company("c1"), company("c1"), company("c1")];
        let facilities = vec![facility("f1"), facility("f1")];
        let links = vec![link("c1", "f1"), link("ghost", "f1")];

        let report = validate_integrity(&companies, &facilities, &links);

        let types: Vec<_> = report.errors.iter().map(|e| (e.issue_type, e.count)).collect();
        assert_eq!(
            types,
            vec![
                (IntegrityIssueType::DuplicateCompanyId, 2),
                (IntegrityIssueType::DuplicateFacilityId, 1),
                (IntegrityIssueType::LinkToMissingCompany, 1),
            ]
        );
    }

    #[test]
    fn inputs_are_left_untouched() {
        let companies = vec![company("c1"), company("c1")];
        let before = companies.clone();
        let _ = validate_integrity(&companies, &[], &[]);
        assert_eq!(companies, before);
    }
}
