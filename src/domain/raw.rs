use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Header-addressed table of raw string cells, as read from the registry
/// export. Columns vary between sources, so rows stay untyped and every
/// lookup tolerates an absent column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    table: &'a RawTable,
    cells: &'a [String],
}

impl RawTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.trim().to_string()).or_insert(i);
        }
        Self { headers, index, rows: Vec::new() }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut table = Self::new(headers);
        for record in rdr.records() {
            let record = record?;
            table.push_row(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(table)
    }

    pub fn read_path(path: &Path) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn write_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// First of `candidates` that is a column of this table.
    pub fn first_column<'c>(&self, candidates: &[&'c str]) -> Option<&'c str> {
        candidates.iter().copied().find(|c| self.has_column(c))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(move |cells| RawRow { table: self, cells })
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(RawRow<'_>) -> bool,
    {
        let rows = std::mem::take(&mut self.rows);
        let table: &RawTable = self;
        let kept: Vec<Vec<String>> = rows
            .into_iter()
            .filter(|cells| keep(RawRow { table, cells }))
            .collect();
        self.rows = kept;
    }

    /// Distinct values of a column in first-seen order.
    pub fn distinct(&self, column: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.rows()
            .filter_map(|r| r.get(column))
            .filter(|v| seen.insert(v.to_string()))
            .map(|v| v.to_string())
            .collect()
    }
}

impl<'a> RawRow<'a> {
    /// Cell value, or `None` when the column is absent or the cell is empty.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = *self.table.index.get(column)?;
        self.cells.get(idx).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Value of the first candidate column that is present in the table,
    /// whether or not its cell is empty.
    pub fn get_first_present(&self, candidates: &[&str]) -> Option<Option<&'a str>> {
        self.table.first_column(candidates).map(|c| self.get(c))
    }

    /// Value of the first candidate column that has a non-empty cell.
    pub fn get_any(&self, candidates: &[&str]) -> Option<&'a str> {
        candidates.iter().find_map(|c| self.get(c))
    }
}

/// Typed reading of a CSV cell, used wherever the export needs numbers and
/// booleans rather than text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue<'a> {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
}

impl<'a> CellValue<'a> {
    pub fn infer(cell: &'a str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed {
            "true" | "True" | "TRUE" => return CellValue::Bool(true),
            "false" | "False" | "FALSE" => return CellValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Text(cell),
        }
    }

    /// Like [`CellValue::infer`], but identifier columns (`*_id`) stay text so
    /// an all-digit hash keeps its leading zeros.
    pub fn infer_in(column: &str, cell: &'a str) -> Self {
        if column.ends_with("_id") && !cell.trim().is_empty() {
            CellValue::Text(cell)
        } else {
            CellValue::infer(cell)
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Empty => serde_json::Value::Null,
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Int(i) => serde_json::Value::from(*i),
            CellValue::Float(f) => serde_json::Value::from(*f),
            CellValue::Text(s) => serde_json::Value::from(*s),
        }
    }
}

impl RawTable {
    /// First `limit` rows as JSON objects keyed by header, with typed values.
    pub fn to_json_records(&self, limit: usize) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .take(limit)
            .map(|cells| {
                let record: serde_json::Map<String, serde_json::Value> = self
                    .headers
                    .iter()
                    .zip(cells)
                    .map(|(h, c)| (h.clone(), CellValue::infer_in(h, c).to_json()))
                    .collect();
                serde_json::Value::Object(record)
            })
            .collect()
    }

    /// Raw cells of the first `limit` rows.
    pub fn head(&self, limit: usize) -> impl Iterator<Item = &[String]> {
        self.rows.iter().take(limit).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        let csv = "name,country,lat\nAcme,France,1.5\n,Spain,\nBeta,France,x\n";
        RawTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn empty_cells_and_absent_columns_read_as_none() {
        let table = sample();
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0].get("name"), Some("Acme"));
        assert_eq!(rows[1].get("name"), None);
        assert_eq!(rows[1].get("lat"), None);
        assert_eq!(rows[0].get("sector"), None);
    }

    #[test]
    fn first_present_column_distinguishes_absent_from_empty() {
        let table = sample();
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[1].get_first_present(&["facility_name", "name"]), Some(None));
        assert_eq!(rows[0].get_first_present(&["facility_name", "organization"]), None);
    }

    #[test]
    fn retain_and_distinct() {
        let mut table = sample();
        table.retain(|r| r.get("country") == Some("France"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.distinct("country"), vec!["France".to_string()]);
    }

    #[test]
    fn short_rows_are_padded() {
        let csv = "a,b,c\n1\n";
        let table = RawTable::from_reader(csv.as_bytes()).unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("a"), Some("1"));
        assert_eq!(row.get("c"), None);
    }

    #[test]
    fn write_then_read_keeps_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/raw.csv");
        let table = sample();
        table.write_path(&path).unwrap();
        let back = RawTable::read_path(&path).unwrap();
        assert_eq!(back.headers(), table.headers());
        assert_eq!(back.len(), 3);
    }

    #[test]
    fn cells_infer_types() {
        assert_eq!(CellValue::infer(""), CellValue::Empty);
        assert_eq!(CellValue::infer("True"), CellValue::Bool(true));
        assert_eq!(CellValue::infer("42"), CellValue::Int(42));
        assert_eq!(CellValue::infer("0.25"), CellValue::Float(0.25));
        assert_eq!(CellValue::infer("NaN"), CellValue::Text("NaN"));
        assert_eq!(CellValue::infer("Acme"), CellValue::Text("Acme"));
    }

    #[test]
    fn json_records_are_typed_and_limited() {
        let records = sample().to_json_records(2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], serde_json::json!("Acme"));
        assert_eq!(records[0]["lat"], serde_json::json!(1.5));
        assert!(records[1]["name"].is_null());
    }

    #[test]
    fn identifier_columns_stay_text() {
        assert_eq!(CellValue::infer_in("company_id", "0012345678"), CellValue::Text("0012345678"));
        assert_eq!(CellValue::infer_in("facility_count", "0012"), CellValue::Int(12));
        assert_eq!(CellValue::infer_in("company_id", ""), CellValue::Empty);
    }
}
