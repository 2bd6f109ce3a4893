//! Deterministic stand-in dataset used when the registry download fails.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::domain::RawTable;

pub const SYNTHETIC_COLUMNS: [&str; 9] = [
    "id", "name", "facility_name", "country", "address", "lat", "lon", "company_name", "sector",
];
pub const SYNTHETIC_SECTORS: [&str; 3] = ["Textile", "Electronics", "Food"];
/// Consecutive synthetic rows sharing one corporate owner.
pub const FACILITIES_PER_CORPORATE: usize = 5;

/// Builds `rows` synthetic registry rows from a seeded generator, so the same
/// seed always gives the same table.
pub fn generate(rows: usize, seed: u64, countries: &[String]) -> RawTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = RawTable::new(SYNTHETIC_COLUMNS);

    for i in 0..rows {
        let country = countries.choose(&mut rng).cloned().unwrap_or_default();
        let lat: f64 = rng.gen_range(30.0..50.0);
        let lon: f64 = rng.gen_range(-10.0..10.0);
        let sector = SYNTHETIC_SECTORS.choose(&mut rng).copied().unwrap_or_default();

        table.push_row(vec![
            i.to_string(),
            format!("Company_{}", i),
            format!("Factory_{}", i),
            country,
            format!("123 Street {}, City", i),
            lat.to_string(),
            lon.to_string(),
            format!("Corporate_{}", i / FACILITIES_PER_CORPORATE),
            sector.to_string(),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TARGET_COUNTRIES;

    fn countries() -> Vec<String> {
        TARGET_COUNTRIES.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn same_seed_same_table() {
        assert_eq!(generate(50, 42, &countries()), generate(50, 42, &countries()));
        assert_ne!(generate(50, 42, &countries()), generate(50, 7, &countries()));
    }

    #[test]
    fn rows_follow_the_synthetic_shape() {
        let table = generate(12, 42, &countries());
        assert_eq!(table.len(), 12);
        assert_eq!(table.headers().len(), SYNTHETIC_COLUMNS.len());

        for (i, row) in table.rows().enumerate() {
            assert_eq!(row.get("name"), Some(format!("Company_{}", i).as_str()));
            assert_eq!(row.get("company_name"), Some(format!("Corporate_{}", i / 5).as_str()));
            let lat: f64 = row.get("lat").unwrap().parse().unwrap();
            let lon: f64 = row.get("lon").unwrap().parse().unwrap();
            assert!((30.0..50.0).contains(&lat));
            assert!((-10.0..10.0).contains(&lon));
            assert!(TARGET_COUNTRIES.contains(&row.get("country").unwrap()));
            assert!(SYNTHETIC_SECTORS.contains(&row.get("sector").unwrap()));
        }
    }
}
