//! [`ReminderAggregator`]: fans out one due-window fetch per care kind and
//! merges the results into a [`ReminderReport`].
//!
//! The per-kind fetches run concurrently and are joined with
//! [`futures::future::join_all`], which keeps results in the order the
//! futures were created. Each kind therefore lands in its own slot and the
//! join is the only synchronisation point. The aggregation is all-or-nothing:
//! if any fetch fails, no partial report is returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use strum::IntoEnumIterator;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  care::{CareKind, CareRecord},
  policy,
  report::ReminderReport,
  store::CareStore,
};

/// Builds reminder reports from an injected [`CareStore`].
pub struct ReminderAggregator<S> {
  store:           Arc<S>,
  include_overdue: bool,
}

impl<S> Clone for ReminderAggregator<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      include_overdue: self.include_overdue,
    }
  }
}

impl<S: CareStore> ReminderAggregator<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      include_overdue: false,
    }
  }

  /// Also fetch overdue records into the report's overdue section. The
  /// upcoming section is unaffected.
  pub fn with_overdue(mut self, include: bool) -> Self {
    self.include_overdue = include;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// [`Self::fetch_all_upcoming`] evaluated against the current instant.
  pub async fn fetch_all_upcoming_now(&self, pet_id: Uuid) -> Result<ReminderReport> {
    self.fetch_all_upcoming(pet_id, Utc::now()).await
  }

  /// Fetch every kind's upcoming records for `pet_id` concurrently and merge
  /// them into one report.
  ///
  /// When several fetches fail, the error names the first failed kind in
  /// enumeration order and lists all failed kinds.
  #[tracing::instrument(skip(self), fields(overdue = self.include_overdue))]
  pub async fn fetch_all_upcoming(
    &self,
    pet_id: Uuid,
    reference: DateTime<Utc>,
  ) -> Result<ReminderReport> {
    let kinds: Vec<CareKind> = CareKind::iter().collect();

    let upcoming = join_all(
      kinds
        .iter()
        .map(|&kind| self.store.fetch_upcoming(pet_id, kind, reference)),
    );
    let overdue = async {
      if self.include_overdue {
        Some(
          join_all(
            kinds
              .iter()
              .map(|&kind| self.store.fetch_overdue(pet_id, kind, reference)),
          )
          .await,
        )
      } else {
        None
      }
    };

    let (upcoming, overdue) = futures::join!(upcoming, overdue);

    let mut failures = Failures::default();
    let upcoming = failures.collect::<S>(&kinds, upcoming);
    let overdue = overdue.map(|results| failures.collect::<S>(&kinds, results));
    if let Some(err) = failures.into_error::<S>() {
      return Err(err);
    }

    let per_kind = upcoming
      .into_iter()
      .map(|(kind, records)| (kind, recheck(kind, records, |r| policy::is_due(r, reference))));
    let overdue = overdue.into_iter().flatten().map(|(kind, records)| {
      (kind, recheck(kind, records, |r| policy::is_overdue(r, reference)))
    });

    let report = ReminderReport::new(pet_id, reference, per_kind, overdue);
    debug!(
      total = report.total_count(),
      overdue = report.overdue_count(),
      "reminder report built"
    );
    Ok(report)
  }
}

/// Keep only records of `kind` that pass `keep`, preserving store order.
fn recheck(
  kind: CareKind,
  mut records: Vec<CareRecord>,
  keep: impl Fn(&CareRecord) -> bool,
) -> Vec<CareRecord> {
  let before = records.len();
  records.retain(|r| r.kind() == kind && keep(r));
  if records.len() != before {
    debug!(%kind, dropped = before - records.len(), "store returned records outside the window");
  }
  records
}

/// Failures observed across one or more joins, in enumeration order.
struct Failures<E> {
  first:  Option<(CareKind, E)>,
  failed: Vec<CareKind>,
}

impl<E> Default for Failures<E> {
  fn default() -> Self {
    Self {
      first:  None,
      failed: Vec::new(),
    }
  }
}

impl<E: std::error::Error + Send + Sync + 'static> Failures<E> {
  fn collect<S: CareStore<Error = E>>(
    &mut self,
    kinds: &[CareKind],
    results: Vec<Result<Vec<CareRecord>, E>>,
  ) -> Vec<(CareKind, Vec<CareRecord>)> {
    let mut slots = Vec::with_capacity(kinds.len());
    for (&kind, result) in kinds.iter().zip(results) {
      match result {
        Ok(records) => slots.push((kind, records)),
        Err(e) => {
          warn!(%kind, failure = %S::classify(&e), error = %e, "care fetch failed");
          if !self.failed.contains(&kind) {
            self.failed.push(kind);
          }
          // Joins are collected one after another; keep the earliest kind.
          if self.first.as_ref().is_none_or(|(first, _)| kind < *first) {
            self.first = Some((kind, e));
          }
        }
      }
    }
    slots
  }

  fn into_error<S: CareStore<Error = E>>(self) -> Option<Error> {
    let (kind, source) = self.first?;
    let mut failed = self.failed;
    failed.sort();
    Some(Error::PartialAggregationFailure {
      kind,
      failed,
      failure: S::classify(&source),
      source: Box::new(source),
    })
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::HashSet, sync::Mutex};

  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::{
    care::{
      CareDetails, DewormingDetails, FleaTreatmentDetails, NewCareRecord, RecordRef,
      TreatmentType, VaccinationDetails,
    },
    policy::DueWindow,
    store::StoreFailure,
  };

  // ─── In-memory fake ──────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  enum FakeError {
    #[error("backend offline for {0}")]
    Offline(CareKind),
    #[error("bad row for {0}")]
    BadRow(CareKind),
    #[error("no such record")]
    Missing,
  }

  #[derive(Default)]
  struct FakeStore {
    records:    Mutex<Vec<CareRecord>>,
    offline:    HashSet<CareKind>,
    corrupt:    HashSet<CareKind>,
    /// Kinds whose overdue fetch fails while the upcoming fetch succeeds.
    stale:      HashSet<CareKind>,
    /// Return every record of the kind, ignoring the window.
    unfiltered: bool,
  }

  impl FakeStore {
    fn with(records: Vec<CareRecord>) -> Self {
      Self {
        records: Mutex::new(records),
        ..Self::default()
      }
    }

    fn check(&self, kind: CareKind) -> Result<(), FakeError> {
      if self.offline.contains(&kind) {
        return Err(FakeError::Offline(kind));
      }
      if self.corrupt.contains(&kind) {
        return Err(FakeError::BadRow(kind));
      }
      Ok(())
    }

    fn select(
      &self,
      pet_id: Uuid,
      kind: CareKind,
      keep: impl Fn(DateTime<Utc>) -> bool,
    ) -> Vec<CareRecord> {
      let mut out: Vec<_> = self
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.pet_id == pet_id && r.kind() == kind)
        .filter(|r| r.next_due_at.is_some_and(|d| self.unfiltered || keep(d)))
        .cloned()
        .collect();
      out.sort_by_key(|r| r.next_due_at);
      out
    }
  }

  impl CareStore for FakeStore {
    type Error = FakeError;

    fn classify(error: &FakeError) -> StoreFailure {
      match error {
        FakeError::Offline(_) => StoreFailure::StoreUnavailable,
        FakeError::BadRow(_) => StoreFailure::ConversionFailed,
        FakeError::Missing => StoreFailure::RecordNotFound,
      }
    }

    async fn fetch_upcoming(
      &self,
      pet_id: Uuid,
      kind: CareKind,
      reference: DateTime<Utc>,
    ) -> Result<Vec<CareRecord>, FakeError> {
      tokio::task::yield_now().await;
      self.check(kind)?;
      let window = DueWindow::for_kind(kind, reference);
      Ok(self.select(pet_id, kind, |d| window.contains(d)))
    }

    async fn fetch_overdue(
      &self,
      pet_id: Uuid,
      kind: CareKind,
      reference: DateTime<Utc>,
    ) -> Result<Vec<CareRecord>, FakeError> {
      self.check(kind)?;
      if self.stale.contains(&kind) {
        return Err(FakeError::Offline(kind));
      }
      let before = DueWindow::overdue_before(reference);
      Ok(self.select(pet_id, kind, |d| d < before))
    }

    async fn fetch_all(
      &self,
      pet_id: Uuid,
      kind: CareKind,
    ) -> Result<Vec<CareRecord>, FakeError> {
      self.check(kind)?;
      Ok(self.select(pet_id, kind, |_| true))
    }

    async fn get(&self, id: Uuid) -> Result<Option<CareRecord>, FakeError> {
      Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn save(&self, mut record: CareRecord) -> Result<CareRecord, FakeError> {
      record.record_ref.get_or_insert_with(|| RecordRef::new(record.id.to_string()));
      let mut records = self.records.lock().unwrap();
      records.retain(|r| r.id != record.id);
      records.push(record.clone());
      Ok(record)
    }

    async fn delete(&self, record_ref: RecordRef) -> Result<(), FakeError> {
      let mut records = self.records.lock().unwrap();
      let before = records.len();
      records.retain(|r| r.record_ref.as_ref() != Some(&record_ref));
      if records.len() == before {
        return Err(FakeError::Missing);
      }
      Ok(())
    }
  }

  // ─── Fixtures ────────────────────────────────────────────────────────────

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap() }

  fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
  }

  fn details(kind: CareKind, name: &str) -> CareDetails {
    match kind {
      CareKind::Vaccination => CareDetails::Vaccination(VaccinationDetails {
        vaccine_name:  name.into(),
        clinic:        None,
        serial_number: None,
      }),
      CareKind::Deworming => CareDetails::Deworming(DewormingDetails {
        medication_name: name.into(),
        dosage:          None,
      }),
      CareKind::FleaTreatment => CareDetails::FleaTreatment(FleaTreatmentDetails {
        product_name: name.into(),
        treatment:    TreatmentType::Collar,
      }),
    }
  }

  fn care(pet_id: Uuid, kind: CareKind, name: &str, due: DateTime<Utc>) -> CareRecord {
    NewCareRecord::new(pet_id, day(2025, 1, 10), details(kind, name), "test")
      .due_at(due)
      .into_record(day(2025, 1, 10))
  }

  fn names(records: &[CareRecord]) -> Vec<&str> {
    records.iter().map(|r| r.details.product()).collect()
  }

  // ─── Tests ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn empty_store_yields_empty_report() {
    let agg = ReminderAggregator::new(Arc::new(FakeStore::default()));
    let report = agg.fetch_all_upcoming(Uuid::new_v4(), now()).await.unwrap();
    assert!(!report.has_reminders());
    assert_eq!(report.total_count(), 0);
  }

  #[tokio::test]
  async fn counts_across_kinds() {
    let pet = Uuid::new_v4();
    let store = FakeStore::with(vec![
      care(pet, CareKind::Vaccination, "Rabies", day(2026, 1, 20)),
      care(pet, CareKind::Vaccination, "DHPP", day(2026, 1, 15)),
      care(pet, CareKind::Deworming, "Drontal", day(2026, 1, 12)),
    ]);
    let report = ReminderAggregator::new(Arc::new(store))
      .fetch_all_upcoming(pet, now())
      .await
      .unwrap();

    assert_eq!(report.total_count(), 3);
    assert!(report.has_reminders());
    assert_eq!(names(report.records(CareKind::Vaccination)), ["DHPP", "Rabies"]);
    assert!(report.records(CareKind::FleaTreatment).is_empty());
  }

  #[tokio::test]
  async fn scenario_thirty_day_boundary() {
    let pet = Uuid::new_v4();
    let other_pet = Uuid::new_v4();
    let store = FakeStore::with(vec![
      care(pet, CareKind::Vaccination, "V1", day(2026, 2, 9)),
      care(pet, CareKind::Vaccination, "V2", day(2026, 2, 10)),
      care(pet, CareKind::Deworming, "D1", day(2026, 1, 24)),
      care(other_pet, CareKind::FleaTreatment, "F1", day(2026, 1, 11)),
    ]);
    let report = ReminderAggregator::new(Arc::new(store))
      .fetch_all_upcoming(pet, now())
      .await
      .unwrap();

    assert_eq!(names(report.records(CareKind::Vaccination)), ["V1"]);
    assert_eq!(names(report.records(CareKind::Deworming)), ["D1"]);
    assert!(report.records(CareKind::FleaTreatment).is_empty());
    assert_eq!(report.total_count(), 2);
  }

  #[tokio::test]
  async fn one_failed_kind_fails_the_whole_report() {
    let pet = Uuid::new_v4();
    let mut store = FakeStore::with(vec![
      care(pet, CareKind::Vaccination, "Rabies", day(2026, 1, 20)),
      care(pet, CareKind::FleaTreatment, "Seresto", day(2026, 1, 12)),
    ]);
    store.offline.insert(CareKind::Deworming);

    let err = ReminderAggregator::new(Arc::new(store))
      .fetch_all_upcoming(pet, now())
      .await
      .unwrap_err();

    match err {
      Error::PartialAggregationFailure { kind, failed, failure, .. } => {
        assert_eq!(kind, CareKind::Deworming);
        assert_eq!(failed, vec![CareKind::Deworming]);
        assert_eq!(failure, StoreFailure::StoreUnavailable);
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test]
  async fn first_failed_kind_in_enumeration_order_wins() {
    let mut store = FakeStore::default();
    store.corrupt.insert(CareKind::FleaTreatment);
    store.offline.insert(CareKind::Vaccination);

    let err = ReminderAggregator::new(Arc::new(store))
      .fetch_all_upcoming(Uuid::new_v4(), now())
      .await
      .unwrap_err();

    assert_eq!(err.failure(), Some(StoreFailure::StoreUnavailable));
    match err {
      Error::PartialAggregationFailure { kind, failed, .. } => {
        assert_eq!(kind, CareKind::Vaccination);
        assert_eq!(failed, vec![CareKind::Vaccination, CareKind::FleaTreatment]);
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test]
  async fn overdue_failure_of_an_earlier_kind_wins() {
    let mut store = FakeStore::default();
    store.corrupt.insert(CareKind::FleaTreatment);
    store.stale.insert(CareKind::Vaccination);

    let err = ReminderAggregator::new(Arc::new(store))
      .with_overdue(true)
      .fetch_all_upcoming(Uuid::new_v4(), now())
      .await
      .unwrap_err();

    assert_eq!(err.failure(), Some(StoreFailure::StoreUnavailable));
    match err {
      Error::PartialAggregationFailure { kind, failed, .. } => {
        assert_eq!(kind, CareKind::Vaccination);
        assert_eq!(failed, vec![CareKind::Vaccination, CareKind::FleaTreatment]);
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test]
  async fn local_recompute_drops_out_of_window_rows() {
    let pet = Uuid::new_v4();
    let mut store = FakeStore::with(vec![
      care(pet, CareKind::FleaTreatment, "in", day(2026, 1, 17)),
      care(pet, CareKind::FleaTreatment, "out", day(2026, 1, 18)),
      care(pet, CareKind::FleaTreatment, "past", day(2026, 1, 9)),
    ]);
    store.unfiltered = true;

    let report = ReminderAggregator::new(Arc::new(store))
      .fetch_all_upcoming(pet, now())
      .await
      .unwrap();
    assert_eq!(names(report.records(CareKind::FleaTreatment)), ["in"]);
  }

  #[tokio::test]
  async fn overdue_section_is_opt_in() {
    let pet = Uuid::new_v4();
    let records = vec![
      care(pet, CareKind::Deworming, "late", day(2026, 1, 3)),
      care(pet, CareKind::Deworming, "soon", day(2026, 1, 11)),
    ];

    let plain = ReminderAggregator::new(Arc::new(FakeStore::with(records.clone())))
      .fetch_all_upcoming(pet, now())
      .await
      .unwrap();
    assert_eq!(plain.overdue_count(), 0);

    let report = ReminderAggregator::new(Arc::new(FakeStore::with(records)))
      .with_overdue(true)
      .fetch_all_upcoming(pet, now())
      .await
      .unwrap();
    assert_eq!(names(report.overdue(CareKind::Deworming)), ["late"]);
    assert_eq!(names(report.records(CareKind::Deworming)), ["soon"]);
    assert_eq!(report.total_count(), 1);
  }

  #[tokio::test]
  async fn saved_records_show_up_in_the_next_report() {
    let pet = Uuid::new_v4();
    let agg = ReminderAggregator::new(Arc::new(FakeStore::default()));
    let saved = agg
      .store()
      .save(care(pet, CareKind::Vaccination, "Rabies", now() + Duration::days(3)))
      .await
      .unwrap();
    assert!(saved.record_ref.is_some());

    let report = agg.fetch_all_upcoming(pet, now()).await.unwrap();
    assert_eq!(report.total_count(), 1);

    agg.store().delete(saved.record_ref.unwrap()).await.unwrap();
    let report = agg.fetch_all_upcoming(pet, now()).await.unwrap();
    assert!(!report.has_reminders());
  }
}
