//! CSV ingestion for catch reports.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::{CatchRecord, Dataset, SpeciesCatch};
use crate::error::{Result, TrawlerError};
use crate::schema::{ColumnLayout, SchemaDescriptor};

/// Load a catch report from a file; the file name becomes the dataset label.
pub fn load_path(path: &Path, schema: &SchemaDescriptor) -> Result<Dataset> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TrawlerError::DatasetNotFound(path.display().to_string())
        } else {
            TrawlerError::Io(e)
        }
    })?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_reader(file, &label, schema)
}

/// Load a catch report from any CSV source.
pub fn load_reader<R: Read>(reader: R, label: &str, schema: &SchemaDescriptor) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let layout = schema.resolve(&headers)?;

    let mut records = Vec::new();
    for (idx, row) in rdr.records().enumerate() {
        let row = row?;
        records.push(parse_row(idx + 1, &row, &layout)?);
    }

    tracing::debug!(
        "Loaded {} trawlers ({} species columns) from {}",
        records.len(),
        layout.species.len(),
        label
    );

    Dataset::new(label, layout.species_labels(), records)
}

fn parse_row(row: usize, record: &StringRecord, layout: &ColumnLayout) -> Result<CatchRecord> {
    let cell = |idx: usize| record.get(idx).unwrap_or("");

    let name = cell(layout.name);
    if name.is_empty() {
        return Err(TrawlerError::invalid_data(row, "trawler name is empty"));
    }

    let days_cell = cell(layout.fishing_days);
    if days_cell.is_empty() {
        return Err(TrawlerError::invalid_data(
            row,
            format!("missing fishing days for '{}'", name),
        ));
    }
    let fishing_days = parse_number(row, name, "Fishing Days", days_cell)?;

    let species_catch = layout
        .species
        .iter()
        .map(|(idx, label)| parse_amount(row, name, label, cell(*idx)).map(|kg| SpeciesCatch::new(label, kg)))
        .collect::<Result<Vec<_>>>()?;

    let subtotals = layout
        .subtotals
        .iter()
        .map(|(idx, label)| parse_amount(row, name, label, cell(*idx)).map(|kg| SpeciesCatch::new(label, kg)))
        .collect::<Result<Vec<_>>>()?;

    let mut parsed = CatchRecord::new(name, fishing_days, species_catch);
    parsed.subtotals = subtotals;

    if let Some(idx) = layout.total {
        let total_cell = cell(idx);
        if !total_cell.is_empty() {
            parsed = parsed.total(parse_number(row, name, "Total", total_cell)?);
        }
    }

    Ok(parsed)
}

/// Catch amount where an empty cell means nothing was landed
fn parse_amount(row: usize, trawler: &str, column: &str, cell: &str) -> Result<f64> {
    if cell.is_empty() {
        return Ok(0.0);
    }
    parse_number(row, trawler, column, cell)
}

fn parse_number(row: usize, trawler: &str, column: &str, cell: &str) -> Result<f64> {
    let cleaned: String = cell.chars().filter(|c| *c != ',').collect();
    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(TrawlerError::invalid_data(
            row,
            format!("'{}' for '{}' is not a number: '{}'", column, trawler, cell),
        )),
    }
}
