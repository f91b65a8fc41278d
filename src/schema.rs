//! Column names and the schema descriptor for catch-report tables.
//!
//! Every table is normalised and validated here once, at load time. Code
//! downstream of the loader only sees typed records and never looks columns
//! up by name.

use std::collections::HashSet;

use crate::error::{Result, TrawlerError};

// ── Canonical columns ───────────────────────────────────────────────────────
pub mod columns {
    pub const TRAWLER_NAME: &str = "Trawler Name";
    pub const FISHING_DAYS: &str = "Fishing Days";
    pub const TOTAL: &str = "Total";
    pub const EFFICIENCY: &str = "Efficiency";
    pub const RANK: &str = "Rank";
}

// ── Header spellings seen in the wild ───────────────────────────────────────
pub mod aliases {
    pub const TOTAL_KG: &str = "Total (Kg)";
    pub const SERIAL_NO: &str = "Sl. No";
}

/// Prefix of per-group subtotal columns such as `Total Shrimp`
pub const SUBTOTAL_PREFIX: &str = "Total ";

/// Where each canonical column lives in the raw header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub name: usize,
    pub fishing_days: usize,
    pub total: Option<usize>,
    /// Species columns in header order
    pub species: Vec<(usize, String)>,
    /// Subtotal columns (kept, but neither species nor part of a derived total)
    pub subtotals: Vec<(usize, String)>,
}

impl ColumnLayout {
    pub fn species_labels(&self) -> Vec<String> {
        self.species.iter().map(|(_, label)| label.clone()).collect()
    }
}

/// Explicit description of the expected catch-report columns.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub identifier: &'static str,
    pub fishing_days: &'static str,
    pub total: &'static str,
    pub renames: &'static [(&'static str, &'static str)],
    pub dropped: &'static [&'static str],
    pub reserved: &'static [&'static str],
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::catch_report()
    }
}

impl SchemaDescriptor {
    pub fn catch_report() -> Self {
        Self {
            identifier: columns::TRAWLER_NAME,
            fishing_days: columns::FISHING_DAYS,
            total: columns::TOTAL,
            renames: &[(aliases::TOTAL_KG, columns::TOTAL)],
            dropped: &[aliases::SERIAL_NO],
            reserved: &[columns::EFFICIENCY, columns::RANK],
        }
    }

    /// Canonical name for a raw header, or `None` if the column is dropped.
    pub fn normalize_header(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if self.dropped.contains(&trimmed) {
            return None;
        }
        let renamed = self
            .renames
            .iter()
            .find(|(from, _)| *from == trimmed)
            .map(|(_, to)| *to)
            .unwrap_or(trimmed);
        Some(renamed.to_string())
    }

    /// Normalise a header row and map it onto a [`ColumnLayout`].
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> Result<ColumnLayout> {
        let mut seen = HashSet::new();
        let mut name = None;
        let mut fishing_days = None;
        let mut total = None;
        let mut species = Vec::new();
        let mut subtotals = Vec::new();

        for (idx, raw) in headers.iter().enumerate() {
            let Some(header) = self.normalize_header(raw.as_ref()) else {
                continue;
            };
            if header.is_empty() {
                return Err(TrawlerError::Schema(format!(
                    "column {} has an empty header",
                    idx + 1
                )));
            }
            if !seen.insert(header.clone()) {
                return Err(TrawlerError::Schema(format!(
                    "duplicate column '{}'",
                    header
                )));
            }
            if self.reserved.contains(&header.as_str()) {
                return Err(TrawlerError::Schema(format!(
                    "column '{}' is derived and must not appear in the input",
                    header
                )));
            }

            if header == self.identifier {
                name = Some(idx);
            } else if header == self.fishing_days {
                fishing_days = Some(idx);
            } else if header == self.total {
                total = Some(idx);
            } else if header.starts_with(SUBTOTAL_PREFIX) {
                subtotals.push((idx, header));
            } else {
                species.push((idx, header));
            }
        }

        let name = name.ok_or_else(|| Self::missing(self.identifier))?;
        let fishing_days = fishing_days.ok_or_else(|| Self::missing(self.fishing_days))?;

        if species.is_empty() && total.is_none() {
            return Err(TrawlerError::Schema(format!(
                "table needs at least one species column or a '{}' column",
                self.total
            )));
        }

        Ok(ColumnLayout {
            name,
            fishing_days,
            total,
            species,
            subtotals,
        })
    }

    fn missing(column: &str) -> TrawlerError {
        TrawlerError::Schema(format!("missing required column '{}'", column))
    }
}
