use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::hash::Hash;

pub const COMPANY_ID_LEN: usize = 10;
pub const FACILITY_ID_LEN: usize = 12;

fn short_digest(canonical: &str, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(len);
    id
}

/// Stable company key: SHA-256 of `name|country`, trimmed and lower-cased,
/// truncated to 10 hex chars.
pub fn company_id(name: &str, country: &str) -> String {
    let canonical = format!("{}|{}", name.trim(), country.trim()).to_lowercase();
    short_digest(&canonical, COMPANY_ID_LEN)
}

/// Stable facility key: SHA-256 of `name|lat|lon` with coordinates fixed to
/// 6 decimals, truncated to 12 hex chars. Facilities that agree on all three
/// at that precision share an id.
pub fn facility_id(name: &str, latitude: f64, longitude: f64) -> String {
    let canonical = format!("{}|{:.6}|{:.6}", name, latitude, longitude);
    short_digest(&canonical, FACILITY_ID_LEN)
}

/// Keeps the first item for every distinct key, preserving input order.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}
