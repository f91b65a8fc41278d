use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use trawler_engine::{charts::ChartStyle, EngineConfig, Metric, RankedDataset, Session};

#[derive(Parser)]
#[command(name = "trawler-cli")]
#[command(about = "Trawler catch-report ranking and search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides config and TRAWLER_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List datasets in the catalog
    Datasets,

    /// Rank every trawler by efficiency
    Rank {
        /// Catalog name or path to a CSV file
        dataset: String,

        /// Write the augmented table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show the top trawlers by a metric
    Top {
        dataset: String,

        /// efficiency, total, days or species
        #[arg(short, long, default_value = "efficiency")]
        metric: String,

        /// Species for the species metric (repeatable)
        #[arg(short, long)]
        species: Vec<String>,

        /// Number of trawlers (defaults to config top_n)
        #[arg(short)]
        n: Option<usize>,
    },

    /// Find a trawler by approximate name
    Search {
        dataset: String,

        /// Trawler name to look for
        query: String,

        /// Minimum similarity (defaults to config match_cutoff)
        #[arg(long)]
        cutoff: Option<f64>,

        /// Also list this many close names
        #[arg(long, default_value = "0")]
        suggest: usize,
    },

    /// List selectable species groups
    Species { dataset: String },

    /// Print chart data
    Chart {
        dataset: String,

        #[arg(value_enum)]
        chart: ChartKind,

        /// Species for the top-catch chart (repeatable; defaults to first of each group)
        #[arg(short, long)]
        species: Vec<String>,

        /// X column for the column chart
        #[arg(short, long, default_value = "Trawler Name")]
        x: String,

        /// Y column for the column chart
        #[arg(short, long, default_value = "Total")]
        y: String,

        /// bar, line or scatter
        #[arg(long, default_value = "bar")]
        style: String,

        /// Rows shown by the preview (defaults to config top_n)
        #[arg(short)]
        n: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartKind {
    TopCatch,
    Efficiency,
    AllEfficiency,
    /// Any column against any other
    Column,
    /// First rows of the augmented table
    Preview,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trawler_engine=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let mut session = Session::new(config)?;

    match cli.command {
        Commands::Datasets => {
            let catalog = session.catalog();
            if cli.json {
                return print_json(&catalog.datasets());
            }
            println!("📂 Datasets in {}:", catalog.data_dir().display());
            for name in catalog.datasets() {
                let marker = if catalog.data_dir().join(name).is_file() { "✅" } else { "❌" };
                println!("   {} {}", marker, name);
            }
        }

        Commands::Rank { dataset, csv } => {
            let ranked = open(&mut session, &dataset)?;

            if let Some(path) = csv {
                let file = std::fs::File::create(&path)?;
                ranked.write_csv(file)?;
                println!("✅ Wrote {} rows to {}", ranked.len(), path.display());
                return Ok(());
            }
            if cli.json {
                return print_json(ranked.as_ref());
            }

            println!("🚢 {} ({} trawlers)", ranked.label(), ranked.len());
            println!("{:>5}  {:<28} {:>12} {:>8} {:>12}", "Rank", "Trawler", "Total (Kg)", "Days", "Efficiency");
            for record in session.top_n(&ranked, &Metric::Efficiency, Some(ranked.len()))? {
                println!(
                    "{:>5}  {:<28} {:>12.0} {:>8} {:>12.2}",
                    record.rank.map(|r| format!("#{}", r)).unwrap_or_default(),
                    record.name(),
                    record.record.total_catch,
                    record.record.fishing_days,
                    record.efficiency.unwrap_or_default()
                );
            }
            let unranked: Vec<&str> = ranked.iter().filter(|r| !r.is_ranked()).map(|r| r.name()).collect();
            if !unranked.is_empty() {
                println!("\n⚠️  Unranked (zero fishing days): {}", unranked.join(", "));
            }
        }

        Commands::Top { dataset, metric, species, n } => {
            let ranked = open(&mut session, &dataset)?;
            let metric = Metric::parse(&metric, species)?;
            let top = session.top_n(&ranked, &metric, n)?;

            if cli.json {
                return print_json(&top);
            }
            println!("🏆 Top {} by {} in {}:", top.len(), metric, ranked.label());
            for (i, record) in top.iter().enumerate() {
                let value = metric.value(record).unwrap_or_default();
                println!("   {}. {} - {:.2}", i + 1, record.name(), value);
            }
        }

        Commands::Search { dataset, query, cutoff, suggest } => {
            let ranked = open(&mut session, &dataset)?;
            let hit = match cutoff {
                Some(c) => session.search_with_cutoff(&ranked, &query, c)?,
                None => session.search(&ranked, &query),
            };
            let suggestions = if suggest > 0 {
                session.suggestions(&ranked, &query, suggest)
            } else {
                Vec::new()
            };

            if cli.json {
                #[derive(Serialize)]
                struct SearchOutput<'a> {
                    query: &'a str,
                    hit: Option<trawler_engine::SearchHit>,
                    suggestions: Vec<trawler_engine::SearchHit>,
                }
                return print_json(&SearchOutput { query: &query, hit, suggestions });
            }

            println!("🔍 Searching for: {}", query);
            match hit {
                Some(hit) => {
                    println!("\n✅ Found: {}", hit.name);
                    println!("   Rank: {}", hit.rank.map(|r| format!("#{}", r)).unwrap_or_else(|| "N/A".to_string()));
                    println!("   Efficiency: {}", hit.efficiency.map(|e| format!("{:.2}", e)).unwrap_or_else(|| "N/A".to_string()));
                    println!("   Match: {:.1}%", hit.score * 100.0);
                }
                None => println!("\n❌ No matching trawler found."),
            }
            if !suggestions.is_empty() {
                println!("\n📋 Close names:");
                for (i, s) in suggestions.iter().enumerate() {
                    println!("   {}. {} ({:.1}%)", i + 1, s.name, s.score * 100.0);
                }
            }
        }

        Commands::Species { dataset } => {
            let ranked = open(&mut session, &dataset)?;
            let groups = session.species_groups(&ranked);
            if cli.json {
                return print_json(&groups);
            }
            for group in groups {
                println!("🐟 {}:", group.name);
                for species in group.species {
                    println!("   - {}", species);
                }
            }
        }

        Commands::Chart { dataset, chart, species, x, y, style, n } => {
            let ranked = open(&mut session, &dataset)?;
            match chart {
                ChartKind::TopCatch => print_json(&session.top_catch_chart(&ranked, &species)?)?,
                ChartKind::Efficiency => print_json(&session.efficiency_chart(&ranked)?)?,
                ChartKind::AllEfficiency => print_json(&session.all_efficiency_chart(&ranked)?)?,
                ChartKind::Column => {
                    let style = ChartStyle::parse(&style)?;
                    print_json(&session.column_chart(&ranked, &x, &y, style)?)?
                }
                ChartKind::Preview => print_json(&session.preview(&ranked, n))?,
            }
        }
    }

    Ok(())
}

/// Catalog names first, then plain file paths
fn open(session: &mut Session, dataset: &str) -> anyhow::Result<Arc<RankedDataset>> {
    if !session.catalog().contains(dataset) && Path::new(dataset).is_file() {
        return Ok(session.open_path(Path::new(dataset))?);
    }
    Ok(session.open(dataset)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
