use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::{FieldValue, Observation};
use super::schema::ModelProfile;
use crate::config::MAX_IMPORT_ROWS;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a CSV file from disk and map it onto `profile`.
pub fn load_csv_file(path: &Path, profile: &ModelProfile) -> Result<Vec<Observation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading CSV file {}", path.display()))?;
    let rows = parse_csv(&text).context("parsing CSV")?;
    let rows = map_to_profile(rows, profile)
        .with_context(|| format!("CSV does not match the {} model", profile.id.display_name()))?;
    log::info!(
        "Imported {} observations from {}",
        rows.len(),
        path.display()
    );
    Ok(rows)
}

/// Parse raw CSV text, keeping at most [`MAX_IMPORT_ROWS`] data rows.
pub fn parse_csv(raw: &str) -> Result<Vec<Observation>, CoreError> {
    parse_csv_limited(raw, MAX_IMPORT_ROWS)
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// CSV layout: first non-blank line is the header, every following
/// non-blank line is one observation.
///
/// Header names are lower-cased with whitespace removed. Cells are zipped to
/// the header by position; blank cells are left out, numeric cells become
/// numbers, anything else stays text.
pub fn parse_csv_limited(raw: &str, max_rows: usize) -> Result<Vec<Observation>, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut records = Vec::new();
    for (line_no, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| CoreError::InvalidCsv(format!("line {}: {e}", line_no + 1)))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        records.push(record);
    }

    if records.len() < 2 {
        return Err(CoreError::EmptyFile);
    }

    let headers: Vec<String> = records[0].iter().map(normalize_header).collect();
    let data_rows = records.len() - 1;
    if data_rows > max_rows {
        log::warn!("CSV has {data_rows} data rows; keeping the first {max_rows}");
    }

    let observations = records[1..]
        .iter()
        .take(max_rows)
        .map(|record| {
            headers
                .iter()
                .zip(record.iter())
                .filter(|(key, cell)| !key.is_empty() && !cell.is_empty())
                .map(|(key, cell)| (key.clone(), FieldValue::coerce(cell)))
                .collect::<Observation>()
        })
        .collect();

    Ok(observations)
}

fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

/// Rename parsed keys to the profile's canonical keys (matching
/// case-insensitively) and check that every required field appears in at
/// least one row. Columns unknown to the profile are kept as-is.
pub fn map_to_profile(
    rows: Vec<Observation>,
    profile: &ModelProfile,
) -> Result<Vec<Observation>, CoreError> {
    let canonical: HashMap<String, &str> = profile
        .fields()
        .iter()
        .map(|f| (f.key.to_lowercase(), f.key.as_str()))
        .collect();

    let mapped: Vec<Observation> = rows
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|(key, value)| {
                    let key = canonical
                        .get(key.as_str())
                        .map(|k| k.to_string())
                        .unwrap_or_else(|| key.clone());
                    (key, value.clone())
                })
                .collect()
        })
        .collect();

    let missing_fields: Vec<String> = profile
        .required_keys()
        .filter(|key| !mapped.iter().any(|row| row.has_value(key)))
        .map(str::to_string)
        .collect();
    if !missing_fields.is_empty() {
        return Err(CoreError::ValidationError { missing_fields });
    }

    Ok(mapped)
}
