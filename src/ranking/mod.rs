pub mod efficiency;
pub mod top_n;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::RankedRecord;
use crate::error::{Result, TrawlerError};

pub use efficiency::{efficiency, min_ranks, rank};
pub use top_n::{sorted_by, top_n};

/// What to do with a trawler that reports zero fishing days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDaysPolicy {
    /// Fail the whole ranking with `DivisionByZero`
    #[default]
    Reject,
    /// Leave the record without efficiency and rank
    Exclude,
}

/// Column a top-N view is ordered by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "species")]
pub enum Metric {
    Efficiency,
    TotalCatch,
    FishingDays,
    Species(String),
    /// Sum over the selected species
    SpeciesSum(Vec<String>),
}

impl Metric {
    /// Build a metric from its short name (`efficiency`, `total`, `days`,
    /// `species`) and a species selection, as the hosts receive them.
    pub fn parse(name: &str, species: Vec<String>) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "efficiency" => Ok(Metric::Efficiency),
            "total" | "total_catch" => Ok(Metric::TotalCatch),
            "days" | "fishing_days" => Ok(Metric::FishingDays),
            "species" => match species.len() {
                0 => Err(TrawlerError::Other(
                    "metric 'species' needs at least one species".to_string(),
                )),
                1 => Ok(Metric::Species(species.into_iter().next().unwrap_or_default())),
                _ => Ok(Metric::SpeciesSum(species)),
            },
            other => Err(TrawlerError::Other(format!("unknown metric '{}'", other))),
        }
    }

    /// Metric value for a record; `None` for an unranked record's efficiency
    pub fn value(&self, ranked: &RankedRecord) -> Option<f64> {
        let record = &ranked.record;
        match self {
            Metric::Efficiency => ranked.efficiency,
            Metric::TotalCatch => Some(record.total_catch),
            Metric::FishingDays => Some(record.fishing_days),
            Metric::Species(label) => record.catch_of(label),
            Metric::SpeciesSum(labels) => Some(record.species_sum(labels)),
        }
    }

    /// Species columns the metric reads
    pub fn species(&self) -> &[String] {
        match self {
            Metric::Species(label) => std::slice::from_ref(label),
            Metric::SpeciesSum(labels) => labels,
            _ => &[],
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Efficiency => write!(f, "Efficiency"),
            Metric::TotalCatch => write!(f, "Total"),
            Metric::FishingDays => write!(f, "Fishing Days"),
            Metric::Species(label) => write!(f, "{}", label),
            Metric::SpeciesSum(labels) => write!(f, "{}", labels.join(" + ")),
        }
    }
}
