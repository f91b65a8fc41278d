use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::cache::DatasetFingerprint;
use crate::core::CatchRecord;
use crate::error::Result;
use crate::schema::columns;

/// A catch record together with its derived efficiency and rank
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedRecord {
    #[serde(flatten)]
    pub record: CatchRecord,

    /// Catch per fishing day; `None` when the record was excluded from ranking
    pub efficiency: Option<f64>,

    /// 1-based min-rank; `None` when the record was excluded from ranking
    pub rank: Option<u32>,
}

impl RankedRecord {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn is_ranked(&self) -> bool {
        self.rank.is_some()
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        match (self.rank, self.efficiency) {
            (Some(rank), Some(eff)) => format!("#{} {} ({:.2} kg/day)", rank, self.record.name, eff),
            _ => format!("{} (unranked)", self.record.name),
        }
    }
}

/// Read-only snapshot produced by the ranker
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedDataset {
    label: String,
    species: Vec<String>,
    fingerprint: DatasetFingerprint,
    records: Vec<RankedRecord>,
}

impl RankedDataset {
    pub(crate) fn new(
        label: String,
        species: Vec<String>,
        fingerprint: DatasetFingerprint,
        records: Vec<RankedRecord>,
    ) -> Self {
        Self {
            label,
            species,
            fingerprint,
            records,
        }
    }

    /// Same snapshot under another dataset label
    pub(crate) fn relabelled(&self, label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..self.clone()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    /// Fingerprint of the dataset this snapshot was ranked from
    pub fn fingerprint(&self) -> &DatasetFingerprint {
        &self.fingerprint
    }

    pub fn records(&self) -> &[RankedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedRecord> {
        self.records.iter()
    }

    pub fn get(&self, name: &str) -> Option<&RankedRecord> {
        self.records.iter().find(|r| r.record.name == name)
    }

    /// Trawler names in dataset order
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone {
        self.records.iter().map(|r| r.record.name.as_str())
    }

    /// Number of records that received a rank
    pub fn ranked_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_ranked()).count()
    }

    /// Subtotal column labels, taken from the first record
    pub fn subtotals(&self) -> Vec<String> {
        self.records
            .first()
            .map(|r| r.record.subtotals.iter().map(|s| s.species.clone()).collect())
            .unwrap_or_default()
    }

    /// Every column of the augmented table, in output order
    pub fn columns(&self) -> Vec<String> {
        let mut header = vec![columns::TRAWLER_NAME.to_string(), columns::FISHING_DAYS.to_string()];
        header.extend(self.species.iter().cloned());
        header.extend(self.subtotals());
        header.push(columns::TOTAL.to_string());
        header.push(columns::EFFICIENCY.to_string());
        header.push(columns::RANK.to_string());
        header
    }

    /// Write the augmented table as CSV.
    ///
    /// Excluded records leave the `Efficiency` and `Rank` cells empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let subtotals = self.subtotals();

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(true)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(writer);

        wtr.write_record(self.columns())?;

        for ranked in &self.records {
            let record = &ranked.record;
            let mut row = vec![record.name.clone(), record.fishing_days.to_string()];
            row.extend(record.species_catch.iter().map(|s| s.kg.to_string()));
            for label in &subtotals {
                let cell = record
                    .subtotals
                    .iter()
                    .find(|s| &s.species == label)
                    .map(|s| s.kg.to_string())
                    .unwrap_or_default();
                row.push(cell);
            }
            row.push(record.total_catch.to_string());
            row.push(ranked.efficiency.map(|e| e.to_string()).unwrap_or_default());
            row.push(ranked.rank.map(|r| r.to_string()).unwrap_or_default());
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        Ok(())
    }
}
