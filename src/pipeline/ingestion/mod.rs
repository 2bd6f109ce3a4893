// Pipeline ingestion: country filtering and raw snapshot files

pub mod synthetic;

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

use crate::constants::RAW_SNAPSHOT_PREFIX;
use crate::domain::RawTable;
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::conflation::COUNTRY_COLUMNS;
use crate::pipeline::processing::normalize::normalize_country;

/// Keeps only rows whose normalized country is in `countries`. Returns the
/// number of rows dropped.
pub fn filter_by_countries(raw: &mut RawTable, countries: &[String]) -> Result<usize> {
    if raw.first_column(&COUNTRY_COLUMNS).is_none() {
        return Err(PipelineError::Stage {
            message: format!("source data has none of the country columns {:?}", COUNTRY_COLUMNS),
        });
    }

    info!("Filtering for countries: {:?}", countries);
    let before = raw.len();
    raw.retain(|row| {
        let country = normalize_country(row.get_any(&COUNTRY_COLUMNS));
        countries.iter().any(|c| *c == country)
    });
    info!("{} rows after filtering", raw.len());
    Ok(before - raw.len())
}

pub fn snapshot_file_name(at: DateTime<Local>) -> String {
    format!("{}{}.csv", RAW_SNAPSHOT_PREFIX, at.format("%Y%m%d_%H%M"))
}

/// Writes the snapshot as `oar_raw_<YYYYmmdd_HHMM>.csv` under `raw_dir`.
pub fn write_snapshot(raw: &RawTable, raw_dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    let path = raw_dir.join(snapshot_file_name(at));
    raw.write_path(&path)?;
    info!("Snapshot saved: {}", path.display());
    Ok(path)
}

/// Most recently modified raw snapshot in `raw_dir`.
pub fn latest_snapshot(raw_dir: &Path) -> Result<PathBuf> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;

    if raw_dir.is_dir() {
        for entry in fs::read_dir(raw_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_snapshot = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(RAW_SNAPSHOT_PREFIX) && n.ends_with(".csv"));
            if !is_snapshot {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            if latest.as_ref().map_or(true, |(t, _)| modified > *t) {
                latest = Some((modified, path));
            }
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| PipelineError::missing(raw_dir.join(format!("{}*.csv", RAW_SNAPSHOT_PREFIX))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn countries() -> Vec<String> {
        vec!["Morocco".to_string(), "Spain".to_string()]
    }

    #[test]
    fn filter_normalizes_before_matching() {
        let mut raw = RawTable::from_reader(
            "name,country\nA, maroc \nB,Germany\nC,ESPAÑA\nD,\n".as_bytes(),
        )
        .unwrap();
        let dropped = filter_by_countries(&mut raw, &countries()).unwrap();
        assert_eq!(dropped, 2);
        let names: Vec<_> = raw.rows().filter_map(|r| r.get("name")).collect();
        assert_eq!(names, vec!["A", "C"]);
        // Values are written back unchanged
        assert_eq!(raw.rows().next().unwrap().get("country"), Some(" maroc "));
    }

    #[test]
    fn filter_requires_a_country_column() {
        let mut raw = RawTable::from_reader("name\nA\n".as_bytes()).unwrap();
        assert!(filter_by_countries(&mut raw, &countries()).is_err());
    }

    #[test]
    fn snapshot_names_carry_minute_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 59).unwrap();
        assert_eq!(snapshot_file_name(at), "oar_raw_20240309_1405.csv");
    }

    #[test]
    fn latest_snapshot_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(latest_snapshot(dir.path()), Err(PipelineError::MissingInput(_))));

        fs::write(dir.path().join("notes.csv"), "x\n").unwrap();
        fs::write(dir.path().join("oar_raw_20240101_0000.csv"), "x\n").unwrap();
        let found = latest_snapshot(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "oar_raw_20240101_0000.csv");
    }
}
