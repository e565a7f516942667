// src/dataset.rs

use serde::Serialize;
use std::collections::HashMap;

/// Raw worksheet contents: row 0 holds the header labels.
pub type RawGrid = Vec<Vec<String>>;

/// One cleaned observation: how much a mouse foraged during a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForagingRecord {
    pub entity_id: String,
    pub period: String,
    pub amount: f64,
}

/// The cleaned, sorted dataset shared by every consumer.
///
/// Built only by [`crate::clean::process`]; the fields are private so a
/// dataset cannot be edited after it has been handed to the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<ForagingRecord>,
    /// Distinct periods in chronological order.
    periods: Vec<String>,
    /// Distinct entity ids, lexicographically sorted.
    entities: Vec<String>,
    /// period label -> index into `periods`
    period_index: HashMap<String, usize>,
}

impl Dataset {
    /// `records` must already be sorted by entity id, then period position.
    pub(crate) fn new(records: Vec<ForagingRecord>, periods: Vec<String>) -> Self {
        let mut entities: Vec<String> = Vec::new();
        for rec in &records {
            if entities.last() != Some(&rec.entity_id) {
                entities.push(rec.entity_id.clone());
            }
        }
        let period_index = periods
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        Self {
            records,
            periods,
            entities,
            period_index,
        }
    }

    pub fn records(&self) -> &[ForagingRecord] {
        &self.records
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Chronological position of a period label, if present.
    pub fn period_position(&self, period: &str) -> Option<usize> {
        self.period_index.get(period).copied()
    }

    /// All records for one entity, in period order. Empty if unknown.
    pub fn records_for(&self, entity_id: &str) -> &[ForagingRecord] {
        let start = self
            .records
            .partition_point(|r| r.entity_id.as_str() < entity_id);
        let end = start
            + self.records[start..]
                .iter()
                .take_while(|r| r.entity_id == entity_id)
                .count();
        &self.records[start..end]
    }
}
