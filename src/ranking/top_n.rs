use crate::core::{RankedDataset, RankedRecord};
use crate::error::{Result, TrawlerError};
use crate::ranking::Metric;

/// The `n` records with the largest `metric`, best first.
///
/// Ties keep dataset order. Records for which the metric is undefined
/// (unranked efficiency) are left out.
pub fn top_n<'a>(
    ranked: &'a RankedDataset,
    metric: &Metric,
    n: usize,
) -> Result<Vec<&'a RankedRecord>> {
    check_species(ranked, metric)?;

    let mut scored: Vec<(&RankedRecord, f64)> = ranked
        .iter()
        .filter_map(|r| metric.value(r).map(|v| (r, v)))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(scored.into_iter().take(n).map(|(r, _)| r).collect())
}

/// Every record with a defined metric, sorted descending
pub fn sorted_by<'a>(ranked: &'a RankedDataset, metric: &Metric) -> Result<Vec<&'a RankedRecord>> {
    top_n(ranked, metric, ranked.len())
}

fn check_species(ranked: &RankedDataset, metric: &Metric) -> Result<()> {
    let unknown = metric
        .species()
        .iter()
        .find(|label| !ranked.species().iter().any(|s| s == *label));
    match unknown {
        Some(label) => Err(TrawlerError::Schema(format!(
            "unknown species column '{}' in dataset '{}'",
            label, ranked.label()
        ))),
        None => Ok(()),
    }
}
