// src/source/mod.rs

pub mod auth;
pub mod sheets;

use std::future::Future;

use crate::dataset::RawGrid;
use crate::error::ForageError;

pub use auth::{ServiceAccountKey, SheetsAuth};
pub use sheets::GoogleSheetsClient;

/// Somewhere a raw worksheet grid can be pulled from.
///
/// Implementations make a single attempt; any failure comes back as
/// [`ForageError::SourceUnavailable`].
pub trait TabularSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<RawGrid, ForageError>> + Send;
}
