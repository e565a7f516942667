// src/cache.rs

use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::clean::{self, ColumnNames};
use crate::dataset::Dataset;
use crate::error::ForageError;
use crate::projection::PaletteIndex;
use crate::source::TabularSource;

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A cleaned dataset, its colour slots and when it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub dataset: Arc<Dataset>,
    pub palette: Arc<PaletteIndex>,
    pub fetched_at: DateTime<Utc>,
}

/// What a read hands back: the entry, plus the refetch failure when the
/// entry is an older one kept because the refetch failed.
#[derive(Debug, Clone)]
pub struct CacheRead {
    pub entry: CacheEntry,
    pub stale_error: Option<ForageError>,
}

/// Single-slot, time-boxed memo of fetch + clean.
///
/// The check → fetch → store sequence runs under one async lock, so at most
/// one fetch is in flight and the last successful fetch wins.
pub struct DatasetCache<S, C = SystemClock> {
    source: S,
    clock: C,
    columns: ColumnNames,
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl<S: TabularSource, C: Clock> DatasetCache<S, C> {
    pub fn new(source: S, clock: C, columns: ColumnNames, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            columns,
            ttl,
            slot: Mutex::new(None),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        // a clock that went backwards counts as fresh
        match (now - entry.fetched_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }

    async fn load(&self) -> Result<Dataset, ForageError> {
        let grid = self.source.fetch().await?;
        Ok(clean::process(&grid, &self.columns)?)
    }

    /// Return the cached dataset, refetching when forced, empty or expired.
    ///
    /// A failed refetch falls back to the previous entry (reported through
    /// [`CacheRead::stale_error`]); with nothing to fall back on it becomes
    /// [`ForageError::DataUnavailable`].
    #[instrument(level = "debug", skip(self))]
    pub async fn get_or_fetch(&self, force: bool) -> Result<CacheRead, ForageError> {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(entry) = slot.as_ref() {
            if !force && self.is_fresh(entry, now) {
                debug!(fetched_at = %entry.fetched_at, "cache hit");
                return Ok(CacheRead {
                    entry: entry.clone(),
                    stale_error: None,
                });
            }
        }

        match self.load().await {
            Ok(dataset) => {
                let entry = CacheEntry {
                    palette: Arc::new(PaletteIndex::from_dataset(&dataset)),
                    dataset: Arc::new(dataset),
                    fetched_at: self.clock.now(),
                };
                info!(
                    records = entry.dataset.records().len(),
                    mice = entry.dataset.entities().len(),
                    force,
                    "dataset refreshed"
                );
                *slot = Some(entry.clone());
                Ok(CacheRead {
                    entry,
                    stale_error: None,
                })
            }
            Err(err) => match slot.as_ref() {
                Some(prev) => {
                    warn!(error = %err, fetched_at = %prev.fetched_at, "refresh failed; serving previous dataset");
                    Ok(CacheRead {
                        entry: prev.clone(),
                        stale_error: Some(err),
                    })
                }
                None => {
                    warn!(error = %err, "refresh failed with nothing cached");
                    Err(ForageError::unavailable(err))
                }
            },
        }
    }

    /// Drop the cached entry so the next read always refetches.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            info!("cache invalidated");
        }
    }

    /// Manual refresh: invalidate, then force a fetch.
    pub async fn refresh(&self) -> Result<CacheRead, ForageError> {
        self.invalidate().await;
        self.get_or_fetch(true).await
    }

    /// Current entry without touching the source.
    #[cfg(test)]
    pub(crate) async fn peek(&self) -> Option<CacheEntry> {
        self.slot.lock().await.clone()
    }
}
