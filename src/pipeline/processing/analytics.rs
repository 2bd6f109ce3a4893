//! Descriptive statistics over the relational tables.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::constants::{NOT_AVAILABLE, UNKNOWN};
use crate::domain::{RelationalCompany, RelationalFacility};
use crate::pipeline::processing::normalize::title_case;

/// Above this maximum the facilities-per-company histogram switches from one
/// bin per value to equal-width bins.
pub const PER_VALUE_BIN_LIMIT: u64 = 10;
pub const EQUAL_WIDTH_BINS: usize = 20;
pub const TOP_SECTORS: usize = 10;

/// Counts occurrences of each key, most frequent first. Ties are ordered by
/// key so output is stable across runs.
pub fn count_by<'a, I>(keys: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().map(|(k, c)| (k.to_string(), c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

pub fn companies_by_country(companies: &[RelationalCompany]) -> Vec<(String, usize)> {
    count_by(companies.iter().map(|c| c.country.as_str()))
}

pub fn normalize_sector(sector: &str) -> String {
    let trimmed = sector.trim();
    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else {
        title_case(trimmed)
    }
}

/// Sectors ranked by facility count, truncated to `limit`.
pub fn top_sectors(facilities: &[RelationalFacility], limit: usize) -> Vec<(String, usize)> {
    let normalized: Vec<String> = facilities.iter().map(|f| normalize_sector(&f.sector)).collect();
    let mut ranked = count_by(normalized.iter().map(String::as_str));
    ranked.truncate(limit);
    ranked
}

/// Facilities-per-company statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacilityCountStats {
    pub total_companies: usize,
    pub mean: f64,
    pub median: f64,
    pub max: u64,
    pub min: u64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    pub total_facilities: u64,
    pub single_facility_companies: usize,
    pub companies_over_five: usize,
}

impl FacilityCountStats {
    pub fn compute(counts: &[u64]) -> Self {
        if counts.is_empty() {
            return Self::default();
        }

        let n = counts.len();
        let total: u64 = counts.iter().sum();
        let mean = total as f64 / n as f64;

        let mut sorted = counts.to_vec();
        sorted.sort_unstable();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
        } else {
            sorted[n / 2] as f64
        };

        let std_dev = if n > 1 {
            let sq: f64 = counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum();
            (sq / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        Self {
            total_companies: n,
            mean,
            median,
            max: sorted[n - 1],
            min: sorted[0],
            std_dev,
            total_facilities: total,
            single_facility_companies: counts.iter().filter(|&&c| c == 1).count(),
            companies_over_five: counts.iter().filter(|&&c| c > 5).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn label(&self) -> String {
        if (self.upper - self.lower - 1.0).abs() < f64::EPSILON && self.lower.fract() == 0.0 {
            format!("{}", self.lower as u64)
        } else {
            format!("{:.1}-{:.1}", self.lower, self.upper)
        }
    }
}

/// Bins facility counts: one bin per integer value when the maximum is at
/// most 10, else 20 equal-width bins over `[min, max]` with the last bin
/// closed on the right.
pub fn histogram_bins(counts: &[u64]) -> Vec<HistogramBin> {
    let (Some(&min), Some(&max)) = (counts.iter().min(), counts.iter().max()) else {
        return Vec::new();
    };

    if max <= PER_VALUE_BIN_LIMIT {
        return (min..=max)
            .map(|value| HistogramBin {
                lower: value as f64,
                upper: value as f64 + 1.0,
                count: counts.iter().filter(|&&c| c == value).count(),
            })
            .collect();
    }

    let width = (max - min) as f64 / EQUAL_WIDTH_BINS as f64;
    let mut bins: Vec<HistogramBin> = (0..EQUAL_WIDTH_BINS)
        .map(|i| HistogramBin {
            lower: min as f64 + width * i as f64,
            upper: min as f64 + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for &c in counts {
        let idx = (((c - min) as f64 / width) as usize).min(EQUAL_WIDTH_BINS - 1);
        bins[idx].count += 1;
    }
    bins
}

/// One `Metric,Value` row of `analytics_summary.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetric {
    #[serde(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl SummaryMetric {
    fn new(metric: &str, value: impl ToString) -> Self {
        Self { metric: metric.to_string(), value: value.to_string() }
    }
}

pub fn summary_metrics(companies: &[RelationalCompany], facilities: &[RelationalFacility]) -> Vec<SummaryMetric> {
    let countries: BTreeSet<&str> = companies.iter().map(|c| c.country.as_str()).collect();
    let avg = if companies.is_empty() {
        0.0
    } else {
        companies.iter().map(|c| c.facility_count).sum::<u64>() as f64 / companies.len() as f64
    };
    let multi = companies.iter().filter(|c| c.facility_count > 1).count();
    let top_country = companies_by_country(companies)
        .into_iter()
        .next()
        .map(|(c, _)| c)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let top_sector = top_sectors(facilities, 1)
        .into_iter()
        .next()
        .map(|(s, _)| s)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    vec![
        SummaryMetric::new("total_companies", companies.len()),
        SummaryMetric::new("total_facilities", facilities.len()),
        SummaryMetric::new("countries_covered", countries.len()),
        SummaryMetric::new("avg_facilities_per_company", format!("{:.2}", avg)),
        SummaryMetric::new("companies_with_multiple_facilities", multi),
        SummaryMetric::new("top_country", top_country),
        SummaryMetric::new("top_sector", top_sector),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(country: &str, facilities: u64) -> RelationalCompany {
        RelationalCompany {
            company_id: format!("{}-{}", country, facilities),
            company_name: "Co".to_string(),
            country: country.to_string(),
            original_name: String::new(),
            record_source: "test".to_string(),
            created_date: "2024-01-01".to_string(),
            facility_count: facilities,
        }
    }

    fn facility(sector: &str) -> RelationalFacility {
        RelationalFacility {
            facility_id: "f".to_string(),
            facility_name: "F".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            country: "France".to_string(),
            address: String::new(),
            sector: sector.to_string(),
            record_source: "test".to_string(),
            created_date: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn stats_over_known_counts() {
        let stats = FacilityCountStats::compute(&[1, 1, 2, 4, 7]);
        assert_eq!(stats.total_companies, 5);
        assert_eq!(stats.total_facilities, 15);
        assert!((stats.mean - 3.0).abs() < 1e-9);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.max, 7);
        assert_eq!(stats.min, 1);
        assert!((stats.std_dev - 2.5495097567963922).abs() < 1e-9);
        assert_eq!(stats.single_facility_companies, 2);
        assert_eq!(stats.companies_over_five, 1);
    }

    #[test]
    fn stats_of_empty_and_single_inputs() {
        assert_eq!(FacilityCountStats::compute(&[]), FacilityCountStats::default());
        let one = FacilityCountStats::compute(&[3]);
        assert_eq!(one.std_dev, 0.0);
        assert_eq!(one.median, 3.0);
        assert_eq!(FacilityCountStats::compute(&[1, 4]).median, 2.5);
    }

    #[test]
    fn small_counts_get_one_bin_per_value() {
        let bins = histogram_bins(&[0, 1, 1, 3]);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 2, 0, 1]);
        assert_eq!(bins[1].label(), "1");
    }

    #[test]
    fn large_counts_get_twenty_bins() {
        let bins = histogram_bins(&[0, 5, 20, 40]);
        assert_eq!(bins.len(), EQUAL_WIDTH_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins[EQUAL_WIDTH_BINS - 1].count, 1);
        assert!(histogram_bins(&[]).is_empty());
    }

    #[test]
    fn sectors_are_normalized_before_ranking() {
        let facilities = vec![facility(" textile"), facility("TEXTILE"), facility(""), facility("Food")];
        let top = top_sectors(&facilities, 10);
        assert_eq!(top[0], ("Textile".to_string(), 2));
        assert!(top.contains(&("Unknown".to_string(), 1)));
    }

    #[test]
    fn summary_rows_cover_every_metric() {
        let companies = vec![company("France", 2), company("France", 1), company("Spain", 0)];
        let facilities = vec![facility("Textile"), facility("Food"), facility("Textile")];
        let rows = summary_metrics(&companies, &facilities);
        let get = |name: &str| rows.iter().find(|r| r.metric == name).map(|r| r.value.clone());
        assert_eq!(get("total_companies").as_deref(), Some("3"));
        assert_eq!(get("countries_covered").as_deref(), Some("2"));
        assert_eq!(get("avg_facilities_per_company").as_deref(), Some("1.00"));
        assert_eq!(get("companies_with_multiple_facilities").as_deref(), Some("1"));
        assert_eq!(get("top_country").as_deref(), Some("France"));
        assert_eq!(get("top_sector").as_deref(), Some("Textile"));

        let empty = summary_metrics(&[], &[]);
        assert_eq!(empty.iter().find(|r| r.metric == "top_country").map(|r| r.value.as_str()), Some("N/A"));
    }
}
