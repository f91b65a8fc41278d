//! # Trawler Engine
//!
//! Catch-report analysis for fishing trawlers:
//! - CSV loading with an explicit, validated schema
//! - Per-trawler efficiency (catch per fishing day) and min-style ranking
//! - Stable top-N views and chart series for the dashboard
//! - Fuzzy trawler-name search (LCS ratio or Jaro-Winkler)
//! - Per-session memoisation keyed by dataset content
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trawler_engine::{EngineConfig, Metric, Session};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut session = Session::new(EngineConfig::default())?;
//!     let ranked = session.open("trial.csv")?;
//!
//!     for record in session.top_n(&ranked, &Metric::Efficiency, Some(3))? {
//!         println!("{}", record.display());
//!     }
//!
//!     if let Some(hit) = session.search(&ranked, "sea hawk") {
//!         println!("Found: {}", hit.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod charts;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod ranking;
pub mod schema;

// Re-export primary types
pub use crate::cache::{CacheStats, DatasetFingerprint, MemoryCache, RankCache};
pub use crate::config::EngineConfig;
pub use crate::core::{CatchRecord, Dataset, RankedDataset, RankedRecord, SearchHit, SpeciesCatch};
pub use crate::engine::{Catalog, Session};
pub use crate::error::{Result, TrawlerError};
pub use crate::matcher::{find_best_match, find_matches, NameMatcher, ScorerKind};
pub use crate::ranking::{rank, top_n, Metric, ZeroDaysPolicy};
pub use crate::schema::SchemaDescriptor;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
