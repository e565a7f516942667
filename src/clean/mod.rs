// src/clean/mod.rs

pub mod period;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::dataset::{Dataset, ForagingRecord, RawGrid};
use crate::error::CleaningError;

/// Header labels of the three columns the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub id: String,
    pub period: String,
    pub amount: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id: "Mouse ID".into(),
            period: "Date".into(),
            amount: "Total Foraged".into(),
        }
    }
}

/// Trim a cell; blank cells count as missing.
fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn find_column(headers: &[String], label: &str) -> Result<usize, CleaningError> {
    let wanted = label.trim();
    headers
        .iter()
        .position(|h| h.trim() == wanted)
        .ok_or_else(|| CleaningError::MissingColumn(wanted.to_string()))
}

/// Turn a raw worksheet grid into a sorted [`Dataset`].
///
/// Rows missing any required value, or whose amount is not a finite number,
/// are dropped. A header without one of the required labels fails the whole
/// grid; nothing partial is returned.
#[instrument(level = "debug", skip(grid), fields(rows = grid.len()))]
pub fn process(grid: &RawGrid, columns: &ColumnNames) -> Result<Dataset, CleaningError> {
    let (headers, rows) = grid.split_first().ok_or(CleaningError::MissingHeader)?;

    let id_col = find_column(headers, &columns.id)?;
    let period_col = find_column(headers, &columns.period)?;
    let amount_col = find_column(headers, &columns.amount)?;

    let mut records = Vec::with_capacity(rows.len());
    let mut incomplete = 0usize;
    let mut non_numeric = 0usize;

    for row in rows {
        let (Some(id), Some(period), Some(raw_amount)) = (
            cell(row, id_col),
            cell(row, period_col),
            cell(row, amount_col),
        ) else {
            incomplete += 1;
            continue;
        };

        let amount = match raw_amount.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                non_numeric += 1;
                continue;
            }
        };

        records.push(ForagingRecord {
            entity_id: id.to_string(),
            period: period.to_string(),
            amount,
        });
    }

    // distinct periods in first-encounter order
    let encountered: Vec<String> = {
        let mut seen = HashSet::new();
        records
            .iter()
            .filter(|r| seen.insert(r.period.as_str()))
            .map(|r| r.period.clone())
            .collect()
    };
    let periods = period::order_periods(encountered);

    let records: Vec<ForagingRecord> = {
        let position: HashMap<&str, usize> = periods
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();
        let mut keyed: Vec<(usize, ForagingRecord)> = records
            .into_iter()
            .map(|r| (position[r.period.as_str()], r))
            .collect();
        // stable: same entity + same period keeps source row order
        keyed.sort_by(|(pa, a), (pb, b)| a.entity_id.cmp(&b.entity_id).then(pa.cmp(pb)));
        keyed.into_iter().map(|(_, r)| r).collect()
    };

    debug!(
        kept = records.len(),
        incomplete,
        non_numeric,
        periods = periods.len(),
        "cleaned worksheet"
    );

    Ok(Dataset::new(records, periods))
}
