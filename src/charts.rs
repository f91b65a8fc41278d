//! Data behind the dashboard charts.
//!
//! Nothing here draws: each builder returns the series a plotting front end
//! needs, already ordered, labelled and serialisable.

use serde::{Deserialize, Serialize};

use crate::core::{Dataset, RankedDataset, RankedRecord};
use crate::error::{Result, TrawlerError};
use crate::ranking::{sorted_by, top_n, Metric};
use crate::schema::columns;

/// Marker that identifies shrimp species columns
pub const SHRIMP_MARKER: &str = "Shrimp";

/// How species columns are grouped for selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Shrimp,
    Regular,
}

impl DatasetKind {
    /// Infer the kind from a dataset label such as `shrimp.csv`
    pub fn from_label(label: &str) -> Self {
        let stem = label.rsplit(['/', '\\']).next().unwrap_or(label);
        if stem.eq_ignore_ascii_case("shrimp.csv") {
            DatasetKind::Shrimp
        } else {
            DatasetKind::Regular
        }
    }
}

/// Named group of selectable species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesGroup {
    pub name: String,
    pub species: Vec<String>,
}

/// Colour scheme hint for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// Reversed reds, used when shrimp species are selected
    Reds,
    /// Evenly spaced hues
    Husl,
    Plasma,
}

/// One coloured piece of a stacked bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSegment {
    pub species: String,
    pub kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedBar {
    pub trawler: String,
    pub segments: Vec<BarSegment>,
    pub total: f64,
}

/// Horizontal stacked bars of selected species catch for the top trawlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedBarChart {
    pub title: String,
    pub x_label: String,
    pub palette: Palette,
    pub bars: Vec<StackedBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarPoint {
    pub trawler: String,
    pub value: f64,
}

/// Vertical bars of one value per trawler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub y_label: String,
    pub palette: Palette,
    pub bars: Vec<BarPoint>,
}

/// How a column-vs-column chart is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    #[default]
    Bar,
    Line,
    Scatter,
}

impl ChartStyle {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartStyle::Bar),
            "line" => Ok(ChartStyle::Line),
            "scatter" => Ok(ChartStyle::Scatter),
            other => Err(TrawlerError::Other(format!(
                "unknown chart style '{}' (expected bar, line or scatter)",
                other
            ))),
        }
    }
}

/// One table cell: the trawler name or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPoint {
    pub x: CellValue,
    pub y: CellValue,
}

/// Any column plotted against any other, one point per trawler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnChart {
    pub title: String,
    pub style: ChartStyle,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ColumnPoint>,
}

/// First rows of the augmented table. Excluded records have empty
/// `Efficiency` and `Rank` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePreview {
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<CellValue>>>,
    pub total_rows: usize,
}

/// Value of `column` for one record; `None` when the cell is empty
fn cell(record: &RankedRecord, column: &str) -> Option<CellValue> {
    let number = |v: f64| Some(CellValue::Number(v));
    match column {
        columns::TRAWLER_NAME => Some(CellValue::Text(record.name().to_string())),
        columns::FISHING_DAYS => number(record.record.fishing_days),
        columns::TOTAL => number(record.record.total_catch),
        columns::EFFICIENCY => record.efficiency.map(CellValue::Number),
        columns::RANK => record.rank.map(|r| CellValue::Number(f64::from(r))),
        other => record
            .record
            .catch_of(other)
            .or_else(|| {
                record
                    .record
                    .subtotals
                    .iter()
                    .find(|s| s.species == other)
                    .map(|s| s.kg)
            })
            .map(CellValue::Number),
    }
}

fn check_column(ranked: &RankedDataset, available: &[String], column: &str) -> Result<()> {
    if available.iter().any(|c| c == column) {
        return Ok(());
    }
    Err(TrawlerError::Schema(format!(
        "unknown column '{}' in dataset '{}'",
        column,
        ranked.label()
    )))
}

/// The first `n` records in dataset order, every column
pub fn preview(ranked: &RankedDataset, n: usize) -> TablePreview {
    let columns = ranked.columns();
    let rows = ranked
        .iter()
        .take(n)
        .map(|r| columns.iter().map(|c| cell(r, c)).collect())
        .collect();
    TablePreview {
        label: ranked.label().to_string(),
        columns,
        rows,
        total_rows: ranked.len(),
    }
}

/// `y` against `x` for every trawler, in dataset order.
///
/// Both names must be columns of the augmented table. Records with an empty
/// cell in either column are left out.
pub fn column_chart(ranked: &RankedDataset, x: &str, y: &str, style: ChartStyle) -> Result<ColumnChart> {
    let available = ranked.columns();
    check_column(ranked, &available, x)?;
    check_column(ranked, &available, y)?;

    let points = ranked
        .iter()
        .filter_map(|r| Some(ColumnPoint { x: cell(r, x)?, y: cell(r, y)? }))
        .collect();

    Ok(ColumnChart {
        title: format!("{} by {}", y, x),
        style,
        x_label: x.to_string(),
        y_label: y.to_string(),
        points,
    })
}

/// Selectable species columns, grouped the way the sidebar shows them
pub fn species_groups(dataset: &Dataset, kind: DatasetKind) -> Vec<SpeciesGroup> {
    group_species(dataset.species(), kind)
}

pub(crate) fn group_species(species: &[String], kind: DatasetKind) -> Vec<SpeciesGroup> {
    match kind {
        DatasetKind::Shrimp => {
            let (shrimp, other): (Vec<String>, Vec<String>) = species
                .iter()
                .cloned()
                .partition(|s| s.contains(SHRIMP_MARKER));
            vec![
                SpeciesGroup {
                    name: "Shrimp Species".to_string(),
                    species: shrimp,
                },
                SpeciesGroup {
                    name: "Other Fish".to_string(),
                    species: other,
                },
            ]
        }
        DatasetKind::Regular => vec![SpeciesGroup {
            name: "Fish Species".to_string(),
            species: species.to_vec(),
        }],
    }
}

/// First species of every non-empty group
pub fn default_selection(groups: &[SpeciesGroup]) -> Vec<String> {
    groups
        .iter()
        .filter_map(|g| g.species.first().cloned())
        .collect()
}

/// Stacked bars for the `n` trawlers with the largest catch of `selected`.
pub fn top_catch_chart(ranked: &RankedDataset, selected: &[String], n: usize) -> Result<StackedBarChart> {
    if selected.is_empty() {
        return Err(TrawlerError::Other("select at least one species".to_string()));
    }

    let metric = Metric::SpeciesSum(selected.to_vec());
    let bars = top_n(ranked, &metric, n)?
        .into_iter()
        .map(|r| {
            let segments: Vec<BarSegment> = selected
                .iter()
                .map(|species| BarSegment {
                    species: species.clone(),
                    kg: r.record.catch_of(species).unwrap_or(0.0),
                })
                .collect();
            StackedBar {
                trawler: r.name().to_string(),
                total: segments.iter().map(|s| s.kg).sum(),
                segments,
            }
        })
        .collect();

    let palette = if selected.iter().any(|s| s.contains(SHRIMP_MARKER)) {
        Palette::Reds
    } else {
        Palette::Husl
    };

    Ok(StackedBarChart {
        title: format!("Top {} Trawlers by Selected Species Catch", n),
        x_label: "Total Catch (Kg)".to_string(),
        palette,
        bars,
    })
}

/// The `n` most efficient trawlers
pub fn efficiency_chart(ranked: &RankedDataset, n: usize) -> Result<BarChart> {
    let bars = efficiency_points(top_n(ranked, &Metric::Efficiency, n)?);
    Ok(BarChart {
        title: format!("Top {} Trawlers by Efficiency", n),
        y_label: "Efficiency (Catch/Day)".to_string(),
        palette: Palette::Plasma,
        bars,
    })
}

/// Every ranked trawler, most efficient first
pub fn all_efficiency_chart(ranked: &RankedDataset) -> Result<BarChart> {
    let bars = efficiency_points(sorted_by(ranked, &Metric::Efficiency)?);
    Ok(BarChart {
        title: "All Trawlers by Fish Catching Efficiency".to_string(),
        y_label: "Efficiency (Catch/Day)".to_string(),
        palette: Palette::Plasma,
        bars,
    })
}

fn efficiency_points(records: Vec<&crate::core::RankedRecord>) -> Vec<BarPoint> {
    records
        .into_iter()
        .filter_map(|r| {
            r.efficiency.map(|value| BarPoint {
                trawler: r.name().to_string(),
                value,
            })
        })
        .collect()
}
