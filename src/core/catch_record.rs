use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, TrawlerError};

/// Catch weight for one species (or subtotal) column, in kilograms
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeciesCatch {
    pub species: String,
    pub kg: f64,
}

impl SpeciesCatch {
    pub fn new(species: impl Into<String>, kg: f64) -> Self {
        Self {
            species: species.into(),
            kg,
        }
    }
}

/// One trawler's row in a catch report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatchRecord {
    /// Trawler name, unique within a dataset
    pub name: String,

    /// Days the trawler operated
    pub fishing_days: f64,

    /// Per-species catch in header order
    #[serde(default)]
    pub species_catch: Vec<SpeciesCatch>,

    /// Subtotal columns carried through from the source table
    #[serde(default)]
    pub subtotals: Vec<SpeciesCatch>,

    /// Total catch (kg), supplied or summed from `species_catch`
    pub total_catch: f64,
}

impl CatchRecord {
    /// Create a record whose total is the sum of its species catch
    pub fn new(
        name: impl Into<String>,
        fishing_days: f64,
        species_catch: Vec<SpeciesCatch>,
    ) -> Self {
        let total_catch = species_catch.iter().map(|s| s.kg).sum();
        Self {
            name: name.into(),
            fishing_days,
            species_catch,
            subtotals: Vec::new(),
            total_catch,
        }
    }

    /// Create a record from a precomputed total, without species detail
    pub fn with_total(name: impl Into<String>, total_catch: f64, fishing_days: f64) -> Self {
        Self {
            name: name.into(),
            fishing_days,
            species_catch: Vec::new(),
            subtotals: Vec::new(),
            total_catch,
        }
    }

    /// Override the derived total with a supplied one
    pub fn total(mut self, total_catch: f64) -> Self {
        self.total_catch = total_catch;
        self
    }

    pub fn catch_of(&self, species: &str) -> Option<f64> {
        self.species_catch
            .iter()
            .find(|s| s.species == species)
            .map(|s| s.kg)
    }

    /// Sum of the catch for the given species; labels the record lacks count as zero
    pub fn species_sum(&self, labels: &[String]) -> f64 {
        labels.iter().filter_map(|l| self.catch_of(l)).sum()
    }

    fn validate(&self, row: usize, species: &[String]) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TrawlerError::invalid_data(row, "trawler name is empty"));
        }
        check_amount(row, &self.name, "fishing days", self.fishing_days)?;
        check_amount(row, &self.name, "total catch", self.total_catch)?;

        let labels = self.species_catch.iter().map(|s| s.species.as_str());
        if !labels.eq(species.iter().map(String::as_str)) {
            return Err(TrawlerError::Schema(format!(
                "trawler '{}' does not carry the dataset's species columns",
                self.name
            )));
        }
        for catch in self.species_catch.iter().chain(&self.subtotals) {
            check_amount(row, &self.name, &catch.species, catch.kg)?;
        }
        Ok(())
    }
}

fn check_amount(row: usize, trawler: &str, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(TrawlerError::invalid_data(
            row,
            format!("{} for '{}' must be a non-negative number, got {}", field, trawler, value),
        ));
    }
    Ok(())
}

/// Immutable snapshot of one catch report.
///
/// All records share the same species columns and trawler names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "DatasetParts")]
pub struct Dataset {
    label: String,
    species: Vec<String>,
    records: Vec<CatchRecord>,
}

/// Unchecked wire form; deserialising goes through [`Dataset::new`]
#[derive(Deserialize)]
struct DatasetParts {
    label: String,
    species: Vec<String>,
    records: Vec<CatchRecord>,
}

impl TryFrom<DatasetParts> for Dataset {
    type Error = TrawlerError;

    fn try_from(parts: DatasetParts) -> Result<Self> {
        Dataset::new(parts.label, parts.species, parts.records)
    }
}

impl Dataset {
    /// Build a dataset, checking name uniqueness and the shared species schema.
    ///
    /// Rows are reported 1-based in errors.
    pub fn new(
        label: impl Into<String>,
        species: Vec<String>,
        records: Vec<CatchRecord>,
    ) -> Result<Self> {
        let mut names = HashSet::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            record.validate(row, &species)?;
            if !names.insert(record.name.as_str()) {
                return Err(TrawlerError::invalid_data(
                    row,
                    format!("duplicate trawler name '{}'", record.name),
                ));
            }
        }

        Ok(Self {
            label: label.into(),
            species,
            records,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn records(&self) -> &[CatchRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatchRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CatchRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}
