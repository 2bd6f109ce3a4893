//! Typed CSV reads and writes for the tables passed between stages.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{PipelineError, Result};

pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let records = rdr.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(records)
}

/// Writes `records` with a header row, creating parent directories. The csv
/// writer derives the header from the first record, so an empty slice yields
/// an empty file.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    info!("Saved {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Fails with every missing path listed when any input is absent.
pub fn require_inputs(paths: &[PathBuf]) -> Result<()> {
    let missing: Vec<String> = paths
        .iter()
        .filter(|p| !p.exists())
        .map(|p| p.display().to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingInput(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CompanyFacilityLink;

    #[test]
    fn records_survive_a_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/links.csv");
        let links = vec![
            CompanyFacilityLink { company_id: "c1".into(), facility_id: "f1".into() },
            CompanyFacilityLink { company_id: "c1".into(), facility_id: "f2".into() },
        ];
        write_records(&path, &links).unwrap();
        let back: Vec<CompanyFacilityLink> = read_records(&path).unwrap();
        assert_eq!(back, links);
    }

    #[test]
    fn missing_inputs_are_all_named() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.csv");
        fs::write(&present, "x\n").unwrap();
        let err = require_inputs(&[present, dir.path().join("b.csv"), dir.path().join("c.csv")]).unwrap_err();
        match err {
            PipelineError::MissingInput(files) => {
                assert_eq!(files.len(), 2);
                assert!(files[0].ends_with("b.csv"));
                assert!(files[1].ends_with("c.csv"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
