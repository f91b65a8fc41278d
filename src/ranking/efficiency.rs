use crate::cache::DatasetFingerprint;
use crate::core::{CatchRecord, Dataset, RankedDataset, RankedRecord};
use crate::error::{Result, TrawlerError};
use crate::ranking::ZeroDaysPolicy;

/// Catch per fishing day for a single record
pub fn efficiency(record: &CatchRecord) -> Result<f64> {
    if record.fishing_days == 0.0 {
        return Err(TrawlerError::DivisionByZero {
            trawler: record.name.clone(),
        });
    }
    let value = record.total_catch / record.fishing_days;
    if !value.is_finite() {
        return Err(TrawlerError::NonFiniteEfficiency {
            trawler: record.name.clone(),
            total_catch: record.total_catch,
            fishing_days: record.fishing_days,
        });
    }
    Ok(value)
}

/// Min-style competition ranks, descending.
///
/// `ranks[i] = 1 + |{ j : values[j] > values[i] }|`, so exact ties share the
/// lowest rank of their group and the next distinct value resumes after the gap.
pub fn min_ranks(values: &[f64]) -> Vec<u32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    values
        .iter()
        .map(|v| {
            let ahead = sorted.partition_point(|s| s > v);
            (ahead + 1) as u32
        })
        .collect()
}

/// Compute efficiency and rank for every record of `dataset`.
pub fn rank(dataset: &Dataset, policy: ZeroDaysPolicy) -> Result<RankedDataset> {
    let mut efficiencies = Vec::with_capacity(dataset.len());
    for record in dataset.iter() {
        match efficiency(record) {
            Ok(value) => efficiencies.push(Some(value)),
            Err(TrawlerError::DivisionByZero { trawler }) if policy == ZeroDaysPolicy::Exclude => {
                tracing::warn!("Excluding '{}' from ranking: zero fishing days", trawler);
                efficiencies.push(None);
            }
            Err(e) => return Err(e),
        }
    }

    let ranked_values: Vec<f64> = efficiencies.iter().flatten().copied().collect();
    let mut ranks = min_ranks(&ranked_values).into_iter();

    let records = dataset
        .iter()
        .zip(efficiencies)
        .map(|(record, efficiency)| RankedRecord {
            record: record.clone(),
            rank: efficiency.and_then(|_| ranks.next()),
            efficiency,
        })
        .collect();

    Ok(RankedDataset::new(
        dataset.label().to_string(),
        dataset.species().to_vec(),
        DatasetFingerprint::of(dataset),
        records,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: &[(&str, f64, f64)]) -> Dataset {
        let records = rows
            .iter()
            .map(|(name, total, days)| CatchRecord::with_total(*name, *total, *days))
            .collect();
        Dataset::new("test", Vec::new(), records).unwrap()
    }

    fn ranks_of(ranked: &RankedDataset) -> Vec<(&str, Option<u32>)> {
        ranked.iter().map(|r| (r.name(), r.rank)).collect()
    }

    #[test]
    fn test_example_scenario() {
        let ds = dataset(&[("A", 100.0, 10.0), ("B", 150.0, 10.0), ("C", 100.0, 20.0)]);
        let ranked = rank(&ds, ZeroDaysPolicy::Reject).unwrap();

        let effs: Vec<Option<f64>> = ranked.iter().map(|r| r.efficiency).collect();
        assert_eq!(effs, vec![Some(10.0), Some(15.0), Some(5.0)]);
        assert_eq!(ranks_of(&ranked), vec![("A", Some(2)), ("B", Some(1)), ("C", Some(3))]);
    }

    #[test]
    fn test_ties_share_min_rank() {
        let ds = dataset(&[("A", 100.0, 10.0), ("B", 50.0, 5.0), ("C", 50.0, 10.0)]);
        let ranked = rank(&ds, ZeroDaysPolicy::Reject).unwrap();
        assert_eq!(ranks_of(&ranked), vec![("A", Some(1)), ("B", Some(1)), ("C", Some(3))]);
    }

    #[test]
    fn test_min_ranks_gap_after_tie() {
        assert_eq!(min_ranks(&[3.0, 7.0, 7.0, 7.0, 1.0]), vec![4, 1, 1, 1, 5]);
        assert!(min_ranks(&[]).is_empty());
    }

    #[test]
    fn test_zero_days_rejected() {
        let ds = dataset(&[("A", 100.0, 10.0), ("Idle", 40.0, 0.0)]);
        let err = rank(&ds, ZeroDaysPolicy::Reject).unwrap_err();
        assert!(matches!(err, TrawlerError::DivisionByZero { ref trawler } if trawler == "Idle"));
    }

    #[test]
    fn test_zero_days_excluded() {
        let ds = dataset(&[("A", 100.0, 10.0), ("Idle", 40.0, 0.0), ("C", 10.0, 10.0)]);
        let ranked = rank(&ds, ZeroDaysPolicy::Exclude).unwrap();

        assert_eq!(ranks_of(&ranked), vec![("A", Some(1)), ("Idle", None), ("C", Some(2))]);
        assert_eq!(ranked.get("Idle").and_then(|r| r.efficiency), None);
        assert_eq!(ranked.ranked_count(), 2);
    }

    #[test]
    fn test_overflowing_efficiency_is_a_data_error() {
        // 10 / 1e-320 overflows to infinity
        let ds = dataset(&[("A", 10.0, 1e-320), ("B", 10.0, 1.0)]);
        for policy in [ZeroDaysPolicy::Reject, ZeroDaysPolicy::Exclude] {
            let err = rank(&ds, policy).unwrap_err();
            assert!(matches!(err, TrawlerError::NonFiniteEfficiency { ref trawler, .. } if trawler == "A"));
        }
    }

    #[test]
    fn test_empty_dataset() {
        let ds = dataset(&[]);
        let ranked = rank(&ds, ZeroDaysPolicy::Reject).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_properties() {
        let ds = dataset(&[
            ("A", 12.0, 3.0),
            ("B", 80.0, 8.0),
            ("C", 4.0, 1.0),
            ("D", 99.0, 11.0),
            ("E", 0.0, 2.0),
            ("F", 40.0, 4.0),
        ]);
        let ranked = rank(&ds, ZeroDaysPolicy::Reject).unwrap();

        for a in ranked.iter() {
            let (ea, ra) = (a.efficiency.unwrap(), a.rank.unwrap());
            assert!(ra >= 1 && ra as usize <= ranked.len());
            for b in ranked.iter() {
                let (eb, rb) = (b.efficiency.unwrap(), b.rank.unwrap());
                if ea > eb {
                    assert!(ra <= rb);
                }
                if ea == eb {
                    assert_eq!(ra, rb);
                }
            }
        }
        assert_eq!(ranked.iter().filter_map(|r| r.rank).min(), Some(1));
    }

    #[test]
    fn test_rank_is_idempotent() {
        let ds = dataset(&[("A", 100.0, 10.0), ("B", 150.0, 10.0), ("C", 100.0, 20.0)]);
        let first = rank(&ds, ZeroDaysPolicy::Reject).unwrap();
        let second = rank(&ds, ZeroDaysPolicy::Reject).unwrap();
        assert_eq!(first, second);
    }
}
