//! The `CareStore` and `PetStore` traits.
//!
//! Storage backends (e.g. `pawlog-store-sqlite`) implement these. The
//! aggregator and the CLI depend on the abstraction, never on a concrete
//! backend, so tests can substitute an in-memory fake.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::{
  care::{CareKind, CareRecord, RecordRef},
  pet::{FeedingRecord, Pet},
};

/// The failure classes a store can report. Callers treat all three as opaque
/// upstream failures; the class is kept for messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailure {
  #[strum(serialize = "store unavailable")]
  StoreUnavailable,
  #[strum(serialize = "record not found")]
  RecordNotFound,
  #[strum(serialize = "conversion failed")]
  ConversionFailed,
}

// ─── Care records ────────────────────────────────────────────────────────────

/// Abstraction over a care-record backend.
///
/// Every method is independently failable. Fetches that match nothing return
/// an empty vector, never an error.
pub trait CareStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Map a backend error onto the shared failure taxonomy.
  fn classify(error: &Self::Error) -> StoreFailure;

  /// Records of `kind` for `pet_id` inside the kind's due-window as of
  /// `reference`, ascending by `next_due_at`.
  fn fetch_upcoming(
    &self,
    pet_id: Uuid,
    kind: CareKind,
    reference: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<CareRecord>, Self::Error>> + Send + '_;

  /// Records of `kind` for `pet_id` whose due date fell before the calendar
  /// day of `reference`, ascending by `next_due_at`.
  fn fetch_overdue(
    &self,
    pet_id: Uuid,
    kind: CareKind,
    reference: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<CareRecord>, Self::Error>> + Send + '_;

  /// Every record of `kind` for `pet_id`, newest `administered_at` first.
  fn fetch_all(
    &self,
    pet_id: Uuid,
    kind: CareKind,
  ) -> impl Future<Output = Result<Vec<CareRecord>, Self::Error>> + Send + '_;

  /// Look up a record by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CareRecord>, Self::Error>> + Send + '_;

  /// Insert or update a record and return the stored copy, with a
  /// `record_ref` assigned and `updated_at` refreshed.
  fn save(
    &self,
    record: CareRecord,
  ) -> impl Future<Output = Result<CareRecord, Self::Error>> + Send + '_;

  /// Delete the record behind `record_ref`. Unknown refs fail with a
  /// [`StoreFailure::RecordNotFound`]-class error.
  fn delete(
    &self,
    record_ref: RecordRef,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Pets and feeding ────────────────────────────────────────────────────────

/// Abstraction over pet and feeding-log storage.
pub trait PetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn save_pet(
    &self,
    pet: Pet,
  ) -> impl Future<Output = Result<Pet, Self::Error>> + Send + '_;

  fn get_pet(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Pet>, Self::Error>> + Send + '_;

  /// All pets, ordered by name.
  fn list_pets(
    &self,
  ) -> impl Future<Output = Result<Vec<Pet>, Self::Error>> + Send + '_;

  /// Delete a pet together with its care records and feeding log.
  fn delete_pet(
    &self,
    record_ref: RecordRef,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn log_feeding(
    &self,
    entry: FeedingRecord,
  ) -> impl Future<Output = Result<FeedingRecord, Self::Error>> + Send + '_;

  /// The newest `limit` feeding entries for `pet_id`, newest first.
  fn recent_feedings(
    &self,
    pet_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<FeedingRecord>, Self::Error>> + Send + '_;
}
