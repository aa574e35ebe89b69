use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde_json::Value;

use super::{DatasetError, HistoricalDataset};
use crate::logic::features::vector::parse_cell;
use crate::logic::features::{FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};

/// Read a CSV dataset from disk
pub fn read_csv_file(path: &Path) -> Result<HistoricalDataset, DatasetError> {
    let file = File::open(path)?;
    read_csv(file)
}

/// Read a CSV dataset with a header row.
/// Columns outside the feature layout are ignored, column order is free.
/// A short row reports its first absent field as missing.
pub fn read_csv<R: Read>(source: R) -> Result<HistoricalDataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();

    let mut columns = [0usize; FEATURE_COUNT];
    let mut missing = Vec::new();
    for (slot, &name) in columns.iter_mut().zip(FEATURE_LAYOUT.iter()) {
        match headers.iter().position(|h| h == name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);

        let mut values = [0.0f64; FEATURE_COUNT];
        let cells = columns.iter().zip(FEATURE_LAYOUT.iter());
        for (slot, (&col, &name)) in values.iter_mut().zip(cells) {
            let cell = record.get(col).unwrap_or("");
            *slot = parse_cell(name, cell)
                .map_err(|source| DatasetError::DataFormat { row, source })?;
        }
        rows.push(FeatureVector::from_values(values));
    }

    Ok(HistoricalDataset::new(rows))
}

/// Read a JSONL dataset from disk
pub fn read_jsonl_file(path: &Path) -> Result<HistoricalDataset, DatasetError> {
    let file = File::open(path)?;
    read_jsonl(BufReader::new(file))
}

/// Read one JSON object per line. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(source: R) -> Result<HistoricalDataset, DatasetError> {
    let mut rows = Vec::new();

    for (i, line) in source.lines().enumerate() {
        let line = line?;
        let row = i as u64 + 1;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)
            .map_err(|source| DatasetError::Json { line: row, source })?;
        let object = value.as_object().ok_or(DatasetError::NotAnObject { row })?;
        let vector = FeatureVector::from_json_object(object)
            .map_err(|source| DatasetError::DataFormat { row, source })?;
        rows.push(vector);
    }

    Ok(HistoricalDataset::new(rows))
}
