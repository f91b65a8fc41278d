use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrawlerError};
use crate::matcher::{ScorerKind, DEFAULT_CUTOFF};
use crate::ranking::ZeroDaysPolicy;

pub const ENV_DATA_DIR: &str = "TRAWLER_DATA_DIR";
pub const ENV_MATCH_CUTOFF: &str = "TRAWLER_MATCH_CUTOFF";
pub const ENV_TOP_N: &str = "TRAWLER_TOP_N";

/// Engine options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the catalog's CSV files
    pub data_dir: PathBuf,
    /// Dataset file names offered for selection
    pub datasets: Vec<String>,
    /// Minimum similarity for a name search hit
    pub match_cutoff: f64,
    pub scorer: ScorerKind,
    /// Default size of top-N views and charts
    pub top_n: usize,
    pub zero_days: ZeroDaysPolicy,
    /// Maximum rankings memoised per session
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            datasets: vec![
                "shrimp.csv".to_string(),
                "fish_trawler.csv".to_string(),
                "midwater.csv".to_string(),
                "trial.csv".to_string(),
            ],
            match_cutoff: DEFAULT_CUTOFF,
            scorer: ScorerKind::Indel,
            top_n: 5,
            zero_days: ZeroDaysPolicy::Reject,
            cache_capacity: 16,
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Optional YAML file, then `TRAWLER_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (usually the process environment)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_MATCH_CUTOFF) {
            self.match_cutoff = raw.trim().parse().map_err(|_| {
                TrawlerError::Config(format!("{} is not a number: '{}'", ENV_MATCH_CUTOFF, raw))
            })?;
        }
        if let Some(raw) = lookup(ENV_TOP_N) {
            self.top_n = raw.trim().parse().map_err(|_| {
                TrawlerError::Config(format!("{} is not a count: '{}'", ENV_TOP_N, raw))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.match_cutoff) {
            return Err(TrawlerError::InvalidCutoff(self.match_cutoff));
        }
        if self.top_n == 0 {
            return Err(TrawlerError::Config("top_n must be at least 1".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(TrawlerError::Config(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.match_cutoff, 0.6);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.datasets.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = EngineConfig::from_yaml_str(
            "match_cutoff: 0.7\nscorer: jaro_winkler\nzero_days: exclude\n",
        )
        .unwrap();
        assert_eq!(config.match_cutoff, 0.7);
        assert_eq!(config.scorer, ScorerKind::JaroWinkler);
        assert_eq!(config.zero_days, ZeroDaysPolicy::Exclude);
        assert_eq!(config.top_n, 5);
    }

    #[test]
    fn test_yaml_validation() {
        assert!(matches!(
            EngineConfig::from_yaml_str("match_cutoff: 1.2\n"),
            Err(TrawlerError::InvalidCutoff(_))
        ));
        assert!(EngineConfig::from_yaml_str("cache_capacity: 0\n").is_err());
        assert!(EngineConfig::from_yaml_str("scorer: soundex\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DATA_DIR, "/srv/catch"),
            (ENV_MATCH_CUTOFF, "0.65"),
            (ENV_TOP_N, "10"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/catch"));
        assert_eq!(config.match_cutoff, 0.65);
        assert_eq!(config.top_n, 10);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_env(|key| (key == ENV_TOP_N).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, TrawlerError::Config(_)));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trawler.yaml");
        std::fs::write(&path, "data_dir: /tmp/catch\ntop_n: 3\n").unwrap();

        let config = EngineConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/catch"));
        assert_eq!(config.top_n, 3);
    }
}
