//! Error types for `pawlog-core`.

use thiserror::Error;

use crate::{care::CareKind, store::StoreFailure};

#[derive(Debug, Error)]
pub enum Error {
  #[error("record store unavailable: {0}")]
  StoreUnavailable(String),

  #[error("record not found: {0}")]
  RecordNotFound(String),

  #[error("stored record could not be converted: {0}")]
  ConversionFailed(String),

  /// One or more per-kind fetches failed while building a reminder report.
  /// `kind` is the first failed kind in enumeration order; `failed` lists
  /// every kind that failed during the same join.
  #[error("reminder aggregation failed for {kind} ({failure}): {source}")]
  PartialAggregationFailure {
    kind:    CareKind,
    failed:  Vec<CareKind>,
    failure: StoreFailure,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("unknown care kind: {0:?}")]
  UnknownCareKind(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// The store-level failure class behind this error, if it has one.
  pub fn failure(&self) -> Option<StoreFailure> {
    match self {
      Self::StoreUnavailable(_) => Some(StoreFailure::StoreUnavailable),
      Self::RecordNotFound(_) => Some(StoreFailure::RecordNotFound),
      Self::ConversionFailed(_) => Some(StoreFailure::ConversionFailed),
      Self::PartialAggregationFailure { failure, .. } => Some(*failure),
      Self::UnknownCareKind(_) | Self::Serialization(_) => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
