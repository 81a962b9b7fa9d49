//! Error type for `pawlog-store-sqlite`.

use pawlog_core::store::StoreFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] pawlog_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value no domain type accepts.
  #[error("invalid stored value: {0}")]
  Decode(String),

  #[error("record not found: {0}")]
  RecordNotFound(String),
}

impl Error {
  /// Classify onto the core store failure taxonomy.
  pub fn failure(&self) -> StoreFailure {
    match self {
      Self::Database(_) => StoreFailure::StoreUnavailable,
      Self::RecordNotFound(_) => StoreFailure::RecordNotFound,
      Self::Core(e) => e.failure().unwrap_or(StoreFailure::ConversionFailed),
      Self::Json(_) | Self::Uuid(_) | Self::DateParse(_) | Self::Decode(_) => {
        StoreFailure::ConversionFailed
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
