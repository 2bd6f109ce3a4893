//! Keyword-based sustainability heuristic over company names.
//!
//! Deterministic and stateless: the same name always yields the same flag,
//! score and keyword list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::constants::NOT_AVAILABLE;
use crate::domain::{CompanyAnalysis, CompanyProfile, SustainabilityAnalysis};

/// Matches needed for a full score.
pub const SATURATION_MATCHES: f64 = 5.0;
/// Keywords quoted in a multi-match summary.
pub const SUMMARY_KEYWORD_LIMIT: usize = 3;

pub const SUSTAINABILITY_KEYWORDS: &[&str] = &[
    // English
    "sustainable", "green", "eco", "ecological", "environment",
    "renewable", "recycle", "recycled", "organic", "natural",
    "clean", "energy", "carbon", "zero waste", "ethical",
    "fair", "responsible", "conscious", "climate", "planet",
    // French
    "durable", "vert", "écologique", "environnement", "renouvelable",
    "recyclé", "bio", "biologique", "naturel", "propre",
    "énergie", "carbone", "zéro déchet", "éthique", "équitable",
    "responsable", "climat", "planète",
    // Spanish / Portuguese / Italian
    "sostenible", "verde", "ecologico", "ambiental", "renovable",
    "reciclado", "organico", "naturale", "energia", "carbono",
    "ético",
];

static KEYWORD_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    SUSTAINABILITY_KEYWORDS
        .iter()
        .map(|k| {
            let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(k))).expect("keyword pattern is valid");
            (*k, pattern)
        })
        .collect()
});

/// Splits camel-case humps and lower-cases, so `EcoTextiles` reads as
/// `eco textiles` and the whole-word pattern for `eco` matches it.
fn searchable_text(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_lowercase();
        out.extend(c.to_lowercase());
    }
    out
}

/// Flags sustainability keywords in a company name using whole-word,
/// case-insensitive matching.
pub fn detect_sustainability_keywords(company_name: &str) -> SustainabilityAnalysis {
    let text = searchable_text(company_name);
    let keywords_found: Vec<String> = KEYWORD_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&text))
        .map(|(keyword, _)| keyword.to_string())
        .collect();

    let keyword_count = keywords_found.len();
    SustainabilityAnalysis {
        has_sustainability: keyword_count > 0,
        sustainability_score: (keyword_count as f64 / SATURATION_MATCHES).min(1.0),
        keywords_found,
        keyword_count,
    }
}

/// Two-sentence summary: one about size and location, one about the keyword
/// findings.
pub fn generate_company_summary(
    company_name: &str,
    country: &str,
    facility_count: u64,
    analysis: &SustainabilityAnalysis,
) -> String {
    let intro = if facility_count > 0 {
        format!(
            "{} is a company based in {} with {} facility(ies).",
            company_name, country, facility_count
        )
    } else {
        format!("{} is a company based in {}.", company_name, country)
    };

    let finding = match analysis.keywords_found.as_slice() {
        [] => "No explicit mention of sustainability in the company name.".to_string(),
        [only] => format!("It appears committed to sustainability (keyword: {}).", only),
        many => {
            let shown: Vec<&str> = many.iter().take(SUMMARY_KEYWORD_LIMIT).map(String::as_str).collect();
            format!(
                "It shows a strong commitment to sustainability (keywords: {}).",
                shown.join(", ")
            )
        }
    };

    format!("{} {}", intro, finding)
}

pub fn analyze_company(profile: &CompanyProfile) -> CompanyAnalysis {
    let analysis = detect_sustainability_keywords(&profile.company_name);
    let ai_summary =
        generate_company_summary(&profile.company_name, &profile.country, profile.facility_count, &analysis);
    CompanyAnalysis {
        company_id: profile.company_id.clone(),
        company_name: profile.company_name.clone(),
        country: profile.country.clone(),
        has_sustainability: analysis.has_sustainability,
        sustainability_score: analysis.sustainability_score,
        keywords_found: analysis.keywords_found.join(";"),
        keyword_count: analysis.keyword_count,
        ai_summary,
        facility_count: profile.facility_count,
    }
}

/// Row of `ai_statistics.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SustainabilityStatistics {
    pub total_companies: usize,
    pub sustainable_companies: usize,
    pub sustainability_rate: f64,
    pub avg_sustainability_score: f64,
    pub top_country_sustainability: String,
}

/// Row of `sustainability_by_country.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySustainability {
    pub country: String,
    pub sustainability_rate: f64,
    pub avg_sustainability_score: f64,
    pub total_companies: usize,
}

/// Row of `top_sustainable_companies.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSustainableCompany {
    pub company_name: String,
    pub country: String,
    pub sustainability_score: f64,
    pub keywords_found: String,
}

pub fn compute_statistics(results: &[CompanyAnalysis]) -> SustainabilityStatistics {
    let total = results.len();
    let sustainable = results.iter().filter(|r| r.has_sustainability).count();
    let (rate, avg_score) = if total == 0 {
        (0.0, 0.0)
    } else {
        let score_sum: f64 = results.iter().map(|r| r.sustainability_score).sum();
        (sustainable as f64 / total as f64 * 100.0, score_sum / total as f64)
    };

    // Ties go to the alphabetically first country so the result is stable
    let mut per_country: BTreeMap<&str, usize> = BTreeMap::new();
    for r in results.iter().filter(|r| r.has_sustainability) {
        *per_country.entry(r.country.as_str()).or_default() += 1;
    }
    let top_country = per_country
        .iter()
        .fold(None::<(&str, usize)>, |best, (country, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((*country, *count)),
        })
        .map(|(c, _)| c.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    SustainabilityStatistics {
        total_companies: total,
        sustainable_companies: sustainable,
        sustainability_rate: rate,
        avg_sustainability_score: avg_score,
        top_country_sustainability: top_country,
    }
}

/// Highest-scoring companies, ties kept in input order.
pub fn top_sustainable(results: &[CompanyAnalysis], limit: usize) -> Vec<TopSustainableCompany> {
    let mut ranked: Vec<&CompanyAnalysis> = results.iter().collect();
    ranked.sort_by(|a, b| b.sustainability_score.total_cmp(&a.sustainability_score));
    ranked
        .into_iter()
        .take(limit)
        .map(|r| TopSustainableCompany {
            company_name: r.company_name.clone(),
            country: r.country.clone(),
            sustainability_score: r.sustainability_score,
            keywords_found: r.keywords_found.clone(),
        })
        .collect()
}

pub fn sustainability_by_country(results: &[CompanyAnalysis]) -> Vec<CountrySustainability> {
    let mut groups: BTreeMap<&str, (usize, usize, f64)> = BTreeMap::new();
    for r in results {
        let entry = groups.entry(r.country.as_str()).or_insert((0, 0, 0.0));
        entry.0 += 1;
        if r.has_sustainability {
            entry.1 += 1;
        }
        entry.2 += r.sustainability_score;
    }

    groups
        .into_iter()
        .map(|(country, (total, flagged, score_sum))| CountrySustainability {
            country: country.to_string(),
            sustainability_rate: flagged as f64 / total as f64 * 100.0,
            avg_sustainability_score: score_sum / total as f64,
            total_companies: total,
        })
        .collect()
}

/// Keyword frequencies across all results, most frequent first.
pub fn keyword_frequencies(results: &[CompanyAnalysis]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in results {
        for keyword in r.keywords_found.split(';').filter(|k| !k.is_empty()) {
            *counts.entry(keyword).or_default() += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().map(|(k, c)| (k.to_string(), c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}
