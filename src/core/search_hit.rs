use serde::{Deserialize, Serialize};
use crate::core::RankedRecord;

/// A trawler found by name search, with the figures the dashboard shows for it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Matched trawler name
    pub name: String,

    /// Rank of the matched trawler (`None` if it was excluded from ranking)
    pub rank: Option<u32>,

    /// Efficiency of the matched trawler
    pub efficiency: Option<f64>,

    /// Similarity between query and name (0.0 - 1.0)
    pub score: f64,
}

impl SearchHit {
    pub fn from_record(record: &RankedRecord, score: f64) -> Self {
        Self {
            name: record.record.name.clone(),
            rank: record.rank,
            efficiency: record.efficiency,
            score,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.score >= 1.0
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        let rank = self
            .rank
            .map(|r| format!("#{}", r))
            .unwrap_or_else(|| "unranked".to_string());
        let efficiency = self
            .efficiency
            .map(|e| format!("{:.2}", e))
            .unwrap_or_else(|| "N/A".to_string());
        format!("{} - {} (efficiency {}, match {:.0}%)", self.name, rank, efficiency, self.score * 100.0)
    }
}
