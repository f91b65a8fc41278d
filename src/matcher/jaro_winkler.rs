use rapidfuzz::distance::jaro_winkler;

use crate::matcher::Similarity;

/// Jaro-Winkler similarity, favouring shared prefixes
pub struct JaroWinklerSimilarity;

impl JaroWinklerSimilarity {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JaroWinklerSimilarity {
    fn default() -> Self {
        Self::new()
    }
}

impl Similarity for JaroWinklerSimilarity {
    fn similarity(&self, query: &str, candidate: &str) -> f64 {
        // Jaro-Winkler similarity (0.0 - 1.0)
        jaro_winkler::normalized_similarity(query.chars(), candidate.chars())
    }

    fn name(&self) -> &str {
        "jaro_winkler"
    }
}
