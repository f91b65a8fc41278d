pub mod indel;
pub mod jaro_winkler;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrawlerError};

pub use indel::IndelSimilarity;
pub use jaro_winkler::JaroWinklerSimilarity;

/// Cutoff used by the dashboard's search box
pub const DEFAULT_CUTOFF: f64 = 0.6;

/// Trait for string similarity implementations
pub trait Similarity: Send + Sync {
    /// Similarity in [0, 1]; 1.0 means identical
    fn similarity(&self, query: &str, candidate: &str) -> f64;

    /// Get scorer name for logging
    fn name(&self) -> &str;
}

/// Selectable similarity scorers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    #[default]
    Indel,
    JaroWinkler,
}

impl ScorerKind {
    pub fn build(self) -> Box<dyn Similarity> {
        match self {
            ScorerKind::Indel => Box::new(IndelSimilarity::new()),
            ScorerKind::JaroWinkler => Box::new(JaroWinklerSimilarity::new()),
        }
    }
}

/// Candidate that passed the cutoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameMatch<'a> {
    pub candidate: &'a str,
    /// Position in the candidate sequence
    pub index: usize,
    pub score: f64,
}

/// Approximate name lookup with a fixed scorer and cutoff
pub struct NameMatcher {
    scorer: Box<dyn Similarity>,
    cutoff: f64,
}

impl NameMatcher {
    pub fn new(scorer: Box<dyn Similarity>, cutoff: f64) -> Result<Self> {
        validate_cutoff(cutoff)?;
        Ok(Self { scorer, cutoff })
    }

    pub fn with_kind(kind: ScorerKind, cutoff: f64) -> Result<Self> {
        Self::new(kind.build(), cutoff)
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Most similar candidate at or above the cutoff.
    ///
    /// Ties go to the earliest candidate. An empty candidate set yields `None`.
    pub fn best_match<'a, I>(&self, query: &str, candidates: I) -> Option<NameMatch<'a>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<NameMatch<'a>> = None;
        for (index, candidate) in candidates.into_iter().enumerate() {
            let score = self.scorer.similarity(query, candidate);
            if score < self.cutoff {
                continue;
            }
            if best.map_or(true, |b| score > b.score) {
                best = Some(NameMatch {
                    candidate,
                    index,
                    score,
                });
            }
        }

        match &best {
            Some(m) => tracing::debug!(
                "{} matched '{}' -> '{}' ({:.3})",
                self.scorer.name(),
                query,
                m.candidate,
                m.score
            ),
            None => tracing::debug!("{} found no match for '{}'", self.scorer.name(), query),
        }
        best
    }

    /// Up to `n` candidates at or above the cutoff, best first, ties in input order
    pub fn matches<'a, I>(&self, query: &str, candidates: I, n: usize) -> Vec<NameMatch<'a>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found: Vec<NameMatch<'a>> = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                let score = self.scorer.similarity(query, candidate);
                (score >= self.cutoff).then_some(NameMatch {
                    candidate,
                    index,
                    score,
                })
            })
            .collect();

        found.sort_by(|a, b| b.score.total_cmp(&a.score));
        found.truncate(n);
        found
    }
}

fn validate_cutoff(cutoff: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(TrawlerError::InvalidCutoff(cutoff));
    }
    Ok(())
}

/// Best approximate match for `query` among `candidates` using the
/// longest-common-subsequence ratio.
pub fn find_best_match<'a, I>(query: &str, candidates: I, cutoff: f64) -> Result<Option<&'a str>>
where
    I: IntoIterator<Item = &'a str>,
{
    let matcher = NameMatcher::with_kind(ScorerKind::Indel, cutoff)?;
    Ok(matcher.best_match(query, candidates).map(|m| m.candidate))
}

/// Up to `n` approximate matches with their scores, best first
pub fn find_matches<'a, I>(
    query: &str,
    candidates: I,
    cutoff: f64,
    n: usize,
) -> Result<Vec<(&'a str, f64)>>
where
    I: IntoIterator<Item = &'a str>,
{
    let matcher = NameMatcher::with_kind(ScorerKind::Indel, cutoff)?;
    Ok(matcher
        .matches(query, candidates, n)
        .into_iter()
        .map(|m| (m.candidate, m.score))
        .collect())
}
