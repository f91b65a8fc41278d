use rapidfuzz::distance::indel;

use crate::matcher::Similarity;

/// Longest-common-subsequence ratio: `2 * LCS / (|a| + |b|)`.
///
/// Case-sensitive; characters are compared as given.
pub struct IndelSimilarity;

impl IndelSimilarity {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IndelSimilarity {
    fn default() -> Self {
        Self::new()
    }
}

impl Similarity for IndelSimilarity {
    fn similarity(&self, query: &str, candidate: &str) -> f64 {
        indel::normalized_similarity(query.chars(), candidate.chars())
    }

    fn name(&self) -> &str {
        "indel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let scorer = IndelSimilarity::new();
        assert_eq!(scorer.similarity("Sea Hawk", "Sea Hawk"), 1.0);
    }

    #[test]
    fn test_lcs_ratio() {
        let scorer = IndelSimilarity::new();
        // LCS("Sea Hawk", "Sea Hawke") = 8, total length 17
        let score = scorer.similarity("Sea Hawk", "Sea Hawke");
        assert!((score - 16.0 / 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_strings() {
        let scorer = IndelSimilarity::new();
        assert_eq!(scorer.similarity("Zzzzz", "Ocean Star"), 0.0);
    }

    #[test]
    fn test_case_sensitive() {
        let scorer = IndelSimilarity::new();
        assert!(scorer.similarity("sea hawk", "SEA HAWK") < 0.5);
    }
}
