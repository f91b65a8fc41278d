use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheStats, DatasetFingerprint, MemoryCache, RankCache};
use crate::charts::{
    self, BarChart, ChartStyle, ColumnChart, DatasetKind, SpeciesGroup, StackedBarChart, TablePreview,
};
use crate::config::EngineConfig;
use crate::core::{Dataset, RankedDataset, RankedRecord, SearchHit};
use crate::error::{Result, TrawlerError};
use crate::loader;
use crate::matcher::NameMatcher;
use crate::ranking::{self, Metric};
use crate::schema::SchemaDescriptor;

/// Datasets a session may open
#[derive(Debug, Clone)]
pub struct Catalog {
    data_dir: PathBuf,
    datasets: Vec<String>,
}

impl Catalog {
    pub fn new(data_dir: impl Into<PathBuf>, datasets: Vec<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            datasets,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn datasets(&self) -> &[String] {
        &self.datasets
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.iter().any(|d| d == name)
    }

    /// Path of a catalog entry
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        if !self.contains(name) {
            return Err(TrawlerError::DatasetNotFound(name.to_string()));
        }
        Ok(self.data_dir.join(name))
    }
}

/// Per-user engine state: configuration, catalog and a private rank cache.
///
/// Every request runs `load -> validate -> rank -> (top-N | search)`;
/// ranking is skipped when the loaded content matches a cached snapshot.
pub struct Session {
    config: EngineConfig,
    catalog: Catalog,
    schema: SchemaDescriptor,
    matcher: NameMatcher,
    cache: Box<dyn RankCache>,
}

impl Session {
    /// Create a session with an in-memory cache
    pub fn new(config: EngineConfig) -> Result<Self> {
        let cache = Box::new(MemoryCache::new(config.cache_capacity));
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: EngineConfig, cache: Box<dyn RankCache>) -> Result<Self> {
        config.validate()?;
        let matcher = NameMatcher::with_kind(config.scorer, config.match_cutoff)?;
        let catalog = Catalog::new(config.data_dir.clone(), config.datasets.clone());

        Ok(Self {
            config,
            catalog,
            schema: SchemaDescriptor::catch_report(),
            matcher,
            cache,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Load, validate and rank a catalog dataset
    pub fn open(&mut self, name: &str) -> Result<Arc<RankedDataset>> {
        let path = self.catalog.resolve(name)?;
        self.open_path(&path)
    }

    /// Load, validate and rank a CSV file outside the catalog
    pub fn open_path(&mut self, path: &Path) -> Result<Arc<RankedDataset>> {
        let start = Instant::now();
        let dataset = loader::load_path(path, &self.schema)?;
        let ranked = self.rank_dataset(&dataset)?;

        tracing::info!(
            "Opened {} ({} trawlers, {} ranked) in {:.2}ms",
            dataset.label(),
            ranked.len(),
            ranked.ranked_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(ranked)
    }

    /// Memoised ranking of an in-memory dataset
    pub fn rank_dataset(&mut self, dataset: &Dataset) -> Result<Arc<RankedDataset>> {
        let key = DatasetFingerprint::of(dataset);

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Rank cache hit for {} ({})", dataset.label(), key.short());
            if cached.label() == dataset.label() {
                return Ok(cached);
            }
            // Same content under another name
            return Ok(Arc::new(cached.relabelled(dataset.label())));
        }

        tracing::debug!("Rank cache miss for {} ({})", dataset.label(), key.short());
        let ranked = Arc::new(ranking::rank(dataset, self.config.zero_days)?);
        self.cache.insert(key, Arc::clone(&ranked));
        Ok(ranked)
    }

    /// Best name match with the session's cutoff; a blank query finds nothing
    pub fn search(&self, ranked: &RankedDataset, query: &str) -> Option<SearchHit> {
        search_with(&self.matcher, ranked, query)
    }

    /// Best name match with a one-off cutoff
    pub fn search_with_cutoff(
        &self,
        ranked: &RankedDataset,
        query: &str,
        cutoff: f64,
    ) -> Result<Option<SearchHit>> {
        let matcher = NameMatcher::with_kind(self.config.scorer, cutoff)?;
        Ok(search_with(&matcher, ranked, query))
    }

    /// Up to `n` close names, best first
    pub fn suggestions(&self, ranked: &RankedDataset, query: &str, n: usize) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.matcher
            .matches(query, ranked.names(), n)
            .into_iter()
            .map(|m| SearchHit::from_record(&ranked.records()[m.index], m.score))
            .collect()
    }

    /// Top-N view; `n` defaults to the configured size
    pub fn top_n<'a>(
        &self,
        ranked: &'a RankedDataset,
        metric: &Metric,
        n: Option<usize>,
    ) -> Result<Vec<&'a RankedRecord>> {
        ranking::top_n(ranked, metric, n.unwrap_or(self.config.top_n))
    }

    pub fn species_groups(&self, ranked: &RankedDataset) -> Vec<SpeciesGroup> {
        charts::group_species(ranked.species(), DatasetKind::from_label(ranked.label()))
    }

    /// Top-catch chart; an empty selection falls back to the default species
    pub fn top_catch_chart(&self, ranked: &RankedDataset, selected: &[String]) -> Result<StackedBarChart> {
        if selected.is_empty() {
            let defaults = charts::default_selection(&self.species_groups(ranked));
            return charts::top_catch_chart(ranked, &defaults, self.config.top_n);
        }
        charts::top_catch_chart(ranked, selected, self.config.top_n)
    }

    pub fn efficiency_chart(&self, ranked: &RankedDataset) -> Result<BarChart> {
        charts::efficiency_chart(ranked, self.config.top_n)
    }

    pub fn all_efficiency_chart(&self, ranked: &RankedDataset) -> Result<BarChart> {
        charts::all_efficiency_chart(ranked)
    }

    /// Leading rows of the table; `n` defaults to the configured size
    pub fn preview(&self, ranked: &RankedDataset, n: Option<usize>) -> TablePreview {
        charts::preview(ranked, n.unwrap_or(self.config.top_n))
    }

    pub fn column_chart(
        &self,
        ranked: &RankedDataset,
        x: &str,
        y: &str,
        style: ChartStyle,
    ) -> Result<ColumnChart> {
        charts::column_chart(ranked, x, y, style)
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn invalidate(&mut self, fingerprint: &DatasetFingerprint) -> bool {
        self.cache.invalidate(fingerprint)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn search_with(matcher: &NameMatcher, ranked: &RankedDataset, query: &str) -> Option<SearchHit> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let found = matcher.best_match(query, ranked.names())?;
    Some(SearchHit::from_record(&ranked.records()[found.index], found.score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CatchRecord;
    use crate::ranking::ZeroDaysPolicy;

    fn dataset(label: &str, b_total: f64) -> Dataset {
        let records = vec![
            CatchRecord::with_total("Sea Hawk", 100.0, 10.0),
            CatchRecord::with_total("Ocean Star", b_total, 10.0),
            CatchRecord::with_total("Blue Marlin", 100.0, 20.0),
        ];
        Dataset::new(label, Vec::new(), records).unwrap()
    }

    #[test]
    fn test_rank_is_memoised() {
        let mut session = Session::new(EngineConfig::default()).unwrap();
        let first = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();
        let second = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = session.cache_stats();
        assert_eq!((stats.hits, stats.misses, stats.total_entries), (1, 1, 1));
    }

    #[test]
    fn test_changed_content_is_reranked() {
        let mut session = Session::new(EngineConfig::default()).unwrap();
        let first = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();
        let second = session.rank_dataset(&dataset("trial.csv", 50.0)).unwrap();

        assert_ne!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.get("Ocean Star").and_then(|r| r.rank), Some(1));
        assert_eq!(second.get("Ocean Star").and_then(|r| r.rank), Some(2));
        assert_eq!(session.cache_stats().total_entries, 2);
    }

    #[test]
    fn test_cache_hit_keeps_requested_label() {
        let mut session = Session::new(EngineConfig::default()).unwrap();
        session.rank_dataset(&dataset("a.csv", 150.0)).unwrap();
        let b = session.rank_dataset(&dataset("b.csv", 150.0)).unwrap();
        assert_eq!(b.label(), "b.csv");
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let mut session = Session::new(EngineConfig::default()).unwrap();
        let first = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();
        assert!(session.invalidate(first.fingerprint()));

        let second = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut a = Session::new(EngineConfig::default()).unwrap();
        let b = Session::new(EngineConfig::default()).unwrap();
        a.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();
        assert_eq!(a.cache_stats().total_entries, 1);
        assert_eq!(b.cache_stats().total_entries, 0);
    }

    #[test]
    fn test_search_reports_rank_and_efficiency() {
        let mut session = Session::new(EngineConfig::default()).unwrap();
        let ranked = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();

        let hit = session.search(&ranked, "Ocean Str").unwrap();
        assert_eq!(hit.name, "Ocean Star");
        assert_eq!(hit.rank, Some(1));
        assert_eq!(hit.efficiency, Some(15.0));

        assert!(session.search(&ranked, "   ").is_none());
        assert!(session.search(&ranked, "Zzzzz").is_none());
    }

    #[test]
    fn test_search_with_cutoff() {
        let mut session = Session::new(EngineConfig::default()).unwrap();
        let ranked = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();

        assert!(session.search_with_cutoff(&ranked, "Sea", 0.9).unwrap().is_none());
        assert!(session.search_with_cutoff(&ranked, "Sea", 2.0).is_err());
    }

    #[test]
    fn test_suggestions() {
        let mut session = Session::new(EngineConfig::default()).unwrap();
        let ranked = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();
        let hits = session.suggestions(&ranked, "Sea Hawk", 3);
        assert_eq!(hits[0].name, "Sea Hawk");
        assert!(hits.iter().all(|h| h.score >= 0.6));
    }

    #[test]
    fn test_zero_days_policy_from_config() {
        let records = vec![
            CatchRecord::with_total("Sea Hawk", 100.0, 10.0),
            CatchRecord::with_total("Idle", 0.0, 0.0),
        ];
        let ds = Dataset::new("idle.csv", Vec::new(), records).unwrap();

        let mut strict = Session::new(EngineConfig::default()).unwrap();
        assert!(matches!(
            strict.rank_dataset(&ds),
            Err(TrawlerError::DivisionByZero { .. })
        ));

        let config = EngineConfig {
            zero_days: ZeroDaysPolicy::Exclude,
            ..EngineConfig::default()
        };
        let mut lenient = Session::new(config).unwrap();
        let ranked = lenient.rank_dataset(&ds).unwrap();
        assert_eq!(ranked.get("Idle").and_then(|r| r.rank), None);
    }

    #[test]
    fn test_catalog_rejects_unknown_names() {
        let mut session = Session::new(EngineConfig::default()).unwrap();
        assert!(matches!(
            session.open("secret.csv"),
            Err(TrawlerError::DatasetNotFound(_))
        ));
        assert!(session.catalog().contains("trial.csv"));
    }

    #[test]
    fn test_preview_and_column_chart() {
        let config = EngineConfig {
            top_n: 2,
            ..EngineConfig::default()
        };
        let mut session = Session::new(config).unwrap();
        let ranked = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();

        assert_eq!(session.preview(&ranked, None).rows.len(), 2);
        assert_eq!(session.preview(&ranked, Some(3)).rows.len(), 3);

        let chart = session
            .column_chart(&ranked, "Trawler Name", "Rank", ChartStyle::Line)
            .unwrap();
        assert_eq!(chart.points.len(), 3);
        assert!(session
            .column_chart(&ranked, "Trawler Name", "Hilsa", ChartStyle::Line)
            .is_err());
    }

    #[test]
    fn test_top_n_uses_configured_default() {
        let config = EngineConfig {
            top_n: 2,
            ..EngineConfig::default()
        };
        let mut session = Session::new(config).unwrap();
        let ranked = session.rank_dataset(&dataset("trial.csv", 150.0)).unwrap();

        let top = session.top_n(&ranked, &Metric::Efficiency, None).unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Ocean Star", "Sea Hawk"]);
        assert_eq!(session.top_n(&ranked, &Metric::Efficiency, Some(3)).unwrap().len(), 3);
    }
}
