use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{UNKNOWN, UNKNOWN_FACILITY};

/// Corporate suffixes stripped from the end of company names, applied in order.
const CORPORATE_SUFFIXES: [&str; 8] = ["inc", "ltd", "llc", "gmbh", "sa", "s.a", "limited", "corp"];

/// Accented letters kept by facility-name cleaning; all other non-ASCII is dropped.
const KEPT_ACCENTS: &str = "àâäéèêëîïôöùûüç";

static SUFFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    CORPORATE_SUFFIXES
        .iter()
        .map(|s| Regex::new(&format!(r"(?i)\s+{}\.?$", regex::escape(s))).expect("suffix pattern is valid"))
        .collect()
});

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s&-]").expect("punctuation pattern is valid"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Upper-cases the first letter of every run of letters and lower-cases the
/// rest, so `o'neil & sons-ltd` becomes `O'Neil & Sons-Ltd`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Cleans a raw company name: strips corporate suffixes, replaces punctuation
/// other than `&` and `-` with spaces, collapses whitespace and title-cases.
pub fn clean_company_name(name: Option<&str>) -> String {
    let Some(raw) = name else {
        return UNKNOWN.to_string();
    };

    let mut cleaned = raw.to_string();
    for pattern in SUFFIX_PATTERNS.iter() {
        cleaned = pattern.replace(&cleaned, "").into_owned();
    }

    let cleaned = PUNCTUATION.replace_all(&cleaned, " ");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    title_case(cleaned.trim())
}

/// Cleans a raw facility name: collapses whitespace, drops non-ASCII except a
/// small set of French accents, and title-cases.
pub fn clean_facility_name(name: Option<&str>) -> String {
    let Some(raw) = name else {
        return UNKNOWN_FACILITY.to_string();
    };

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let kept: String = collapsed
        .chars()
        .filter(|c| c.is_ascii() || KEPT_ACCENTS.contains(*c))
        .collect();
    title_case(kept.trim())
}

/// Trims and title-cases a country, then maps known non-English spellings to
/// the English name. Unlisted values pass through title-cased.
pub fn normalize_country(country: Option<&str>) -> String {
    let Some(raw) = country else {
        return UNKNOWN.to_string();
    };

    let titled = title_case(raw.trim());
    match titled.as_str() {
        "Maroc" => "Morocco".to_string(),
        "España" | "Espana" | "Espagne" => "Spain".to_string(),
        "Italie" | "Italia" => "Italy".to_string(),
        "Grece" | "Grèce" => "Greece".to_string(),
        "Malte" => "Malta".to_string(),
        _ => titled,
    }
}

/// Parses a coordinate cell. Missing, malformed and non-finite values all
/// coerce to `0.0`.
pub fn parse_coordinate(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
