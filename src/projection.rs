// src/projection.rs

use serde::Serialize;
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    str::FromStr,
};

use crate::dataset::Dataset;

/// Which chart the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// One line per mouse across periods.
    #[default]
    Series,
    /// One bar per mouse: mean amount over all its periods.
    Average,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "series" | "line" => Ok(ViewMode::Series),
            "average" | "mean" | "bar" => Ok(ViewMode::Average),
            other => Err(format!(
                "unknown view mode {:?}; expected \"series\" or \"average\"",
                other
            )),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewMode::Series => "series",
            ViewMode::Average => "average",
        })
    }
}

/// Stable entity → palette slot map, built from the full entity list so a
/// mouse keeps its colour whatever else is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteIndex(HashMap<String, usize>);

impl PaletteIndex {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self(
            dataset
                .entities()
                .iter()
                .enumerate()
                .map(|(i, id)| (id.clone(), i))
                .collect(),
        )
    }

    pub fn slot(&self, entity_id: &str) -> Option<usize> {
        self.0.get(entity_id).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period: String,
    /// Chronological position of `period` across the whole dataset.
    pub position: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesEntry {
    pub id: String,
    pub color_index: usize,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageEntry {
    pub id: String,
    pub color_index: usize,
    pub value: f64,
}

/// Output of [`project`], in global entity order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "entities", rename_all = "snake_case")]
pub enum Projection {
    /// Nothing was selected; show a prompt rather than a chart.
    EmptySelection,
    Series(Vec<SeriesEntry>),
    Averages(Vec<AverageEntry>),
}

/// Select `selected` mice from `dataset` and shape them for `mode`.
///
/// Ids not present in the dataset are skipped. A selected mouse with no
/// records never shows up as a zero mean. Colour slots come from `palette`,
/// which should be built from the same dataset.
pub fn project(
    dataset: &Dataset,
    palette: &PaletteIndex,
    selected: &BTreeSet<String>,
    mode: ViewMode,
) -> Projection {
    if selected.is_empty() {
        return Projection::EmptySelection;
    }

    // walk the global order, not the selection
    let chosen = dataset
        .entities()
        .iter()
        .filter(|id| selected.contains(id.as_str()))
        .filter_map(|id| Some((palette.slot(id)?, id, dataset.records_for(id))))
        .filter(|(_, _, recs)| !recs.is_empty());

    match mode {
        ViewMode::Series => Projection::Series(
            chosen
                .map(|(slot, id, recs)| SeriesEntry {
                    id: id.clone(),
                    color_index: slot,
                    points: recs
                        .iter()
                        .filter_map(|r| {
                            dataset.period_position(&r.period).map(|position| SeriesPoint {
                                period: r.period.clone(),
                                position,
                                amount: r.amount,
                            })
                        })
                        .collect(),
                })
                .collect(),
        ),
        ViewMode::Average => Projection::Averages(
            chosen
                .map(|(slot, id, recs)| AverageEntry {
                    id: id.clone(),
                    color_index: slot,
                    value: recs.iter().map(|r| r.amount).sum::<f64>() / recs.len() as f64,
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::{process, ColumnNames};

    fn example() -> Dataset {
        let raw: Vec<Vec<String>> = [
            ["entity_id", "period", "amount"],
            ["M1", "2024-01-02", "5"],
            ["M1", "2024-01-01", "3"],
            ["M2", "x", "2"],
            ["M1", "", "9"],
        ]
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
        let cols = ColumnNames {
            id: "entity_id".into(),
            period: "period".into(),
            amount: "amount".into(),
        };
        process(&raw, &cols).unwrap()
    }

    fn pick(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn view(ds: &Dataset, ids: &[&str], mode: ViewMode) -> Projection {
        project(ds, &PaletteIndex::from_dataset(ds), &pick(ids), mode)
    }

    #[test]
    fn empty_selection_is_its_own_result() {
        let ds = example();
        assert_eq!(view(&ds, &[], ViewMode::Series), Projection::EmptySelection);
        assert_eq!(view(&ds, &[], ViewMode::Average), Projection::EmptySelection);
    }

    #[test]
    fn average_of_example() {
        let ds = example();
        assert_eq!(
            view(&ds, &["M1"], ViewMode::Average),
            Projection::Averages(vec![AverageEntry {
                id: "M1".into(),
                color_index: 0,
                value: 4.0,
            }])
        );
    }

    #[test]
    fn series_of_example() {
        let ds = example();
        let Projection::Series(entries) = view(&ds, &["M1"], ViewMode::Series) else {
            panic!("expected a series projection");
        };
        assert_eq!(entries.len(), 1);
        let pts: Vec<(&str, f64)> = entries[0]
            .points
            .iter()
            .map(|p| (p.period.as_str(), p.amount))
            .collect();
        assert_eq!(pts, vec![("2024-01-01", 3.0), ("2024-01-02", 5.0)]);
        assert_eq!(entries[0].points[1].position, 1);
    }

    #[test]
    fn colour_slots_ignore_the_selection() {
        let ds = example();
        let Projection::Averages(only_m2) = view(&ds, &["M2"], ViewMode::Average) else {
            panic!("expected averages");
        };
        assert_eq!(only_m2[0].color_index, 1);
        assert_eq!(PaletteIndex::from_dataset(&ds).slot("M2"), Some(1));

        let Projection::Series(both) = view(&ds, &["M2", "M1"], ViewMode::Series) else {
            panic!("expected series");
        };
        let order: Vec<(&str, usize)> = both.iter().map(|e| (e.id.as_str(), e.color_index)).collect();
        assert_eq!(order, vec![("M1", 0), ("M2", 1)]);
        assert_eq!(both[1].points[0].position, 2);
    }

    #[test]
    fn unknown_mice_are_skipped_without_zero_means() {
        let ds = example();
        assert_eq!(
            view(&ds, &["ghost"], ViewMode::Average),
            Projection::Averages(vec![])
        );
        let Projection::Averages(avgs) = view(&ds, &["ghost", "M2"], ViewMode::Average) else {
            panic!("expected averages");
        };
        assert_eq!(avgs.len(), 1);
        assert_eq!(avgs[0].value, 2.0);
    }

    #[test]
    fn palette_from_another_dataset_only_colours_known_mice() {
        let ds = example();
        let narrow = Dataset::new(
            vec![crate::dataset::ForagingRecord {
                entity_id: "M2".into(),
                period: "x".into(),
                amount: 2.0,
            }],
            vec!["x".into()],
        );
        let palette = PaletteIndex::from_dataset(&narrow);
        assert_eq!(palette.slot("M2"), Some(0));
        assert_eq!(palette.slot("M1"), None);

        let Projection::Averages(avgs) =
            project(&ds, &palette, &pick(&["M1", "M2"]), ViewMode::Average)
        else {
            panic!("expected averages");
        };
        assert_eq!(avgs.len(), 1);
        assert_eq!((avgs[0].id.as_str(), avgs[0].color_index), ("M2", 0));
    }

    #[test]
    fn view_mode_parses_aliases() {
        assert_eq!("Series".parse::<ViewMode>(), Ok(ViewMode::Series));
        assert_eq!(" bar ".parse::<ViewMode>(), Ok(ViewMode::Average));
        assert_eq!("mean".parse::<ViewMode>(), Ok(ViewMode::Average));
        assert!("pie".parse::<ViewMode>().is_err());
        assert_eq!(ViewMode::Average.to_string(), "average");
    }
}
