//! Scheduling bridge. Turns due care records into pending reminder
//! notifications on an external [`NotificationSink`].
//!
//! Scheduling is a side effect requested after a report has been obtained.
//! Its failures are reported separately and never affect the report.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  care::{CareDetails, CareKind, CareRecord},
  report::ReminderReport,
};

/// Deterministic notification identifier for a record: `"{tag}-{uuid}"`.
/// Re-scheduling the same record reuses the identifier, so the sink replaces
/// the pending entry instead of adding another.
pub fn notification_id(kind: CareKind, record_id: Uuid) -> String {
  format!("{}-{}", kind.tag(), record_id)
}

// ─── Notification ────────────────────────────────────────────────────────────

/// A reminder ready to hand to a notification backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotification {
  pub id:        String,
  pub kind:      CareKind,
  pub record_id: Uuid,
  pub pet_id:    Uuid,
  pub title:     String,
  pub body:      String,
  pub fire_at:   DateTime<Utc>,
}

impl ReminderNotification {
  /// Plan the reminder for `record`, or `None` if it has no due date.
  ///
  /// The notification fires [`CareKind::reminder_offset_days`] before the due
  /// date. If that moment is already behind `reference`, it fires at
  /// `reference` instead.
  pub fn plan(
    record: &CareRecord,
    pet_name: &str,
    reference: DateTime<Utc>,
  ) -> Option<Self> {
    let due = record.next_due_at?;
    let kind = record.kind();
    let offset = kind.reminder_offset_days();
    let fire_at = due
      .checked_sub_signed(Duration::days(i64::from(offset)))
      .unwrap_or(due)
      .max(reference);

    let (title, body) = match &record.details {
      CareDetails::Vaccination(v) => (
        "Vaccination reminder",
        format!(
          "{pet_name} needs the '{}' vaccination in {offset} days",
          v.vaccine_name
        ),
      ),
      CareDetails::Deworming(_) => (
        "Deworming reminder",
        format!("{pet_name} needs deworming in {offset} days"),
      ),
      CareDetails::FleaTreatment(_) => (
        "Flea treatment reminder",
        format!("{pet_name} needs a flea treatment in {offset} days"),
      ),
    };

    Some(Self {
      id: notification_id(kind, record.id),
      kind,
      record_id: record.id,
      pet_id: record.pet_id,
      title: title.to_owned(),
      body,
      fire_at,
    })
  }
}

// ─── Sink ────────────────────────────────────────────────────────────────────

/// A backend that holds pending notifications keyed by identifier.
pub trait NotificationSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Add `notification`, replacing any pending one with the same id.
  fn upsert(
    &self,
    notification: ReminderNotification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a pending notification. Returns whether anything was removed.
  fn remove(
    &self,
    id: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove every pending notification and return how many there were.
  fn remove_all(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Pending notifications, soonest first.
  fn pending(
    &self,
  ) -> impl Future<Output = Result<Vec<ReminderNotification>, Self::Error>> + Send + '_;
}

// ─── Bridge ──────────────────────────────────────────────────────────────────

/// Outcome of scheduling every due record in a report.
#[derive(Debug)]
pub struct ScheduleSummary<E> {
  pub scheduled: Vec<String>,
  pub failed:    Vec<(Uuid, E)>,
}

pub struct SchedulingBridge<N> {
  sink: Arc<N>,
}

impl<N> Clone for SchedulingBridge<N> {
  fn clone(&self) -> Self {
    Self {
      sink: Arc::clone(&self.sink),
    }
  }
}

impl<N: NotificationSink> SchedulingBridge<N> {
  pub fn new(sink: Arc<N>) -> Self { Self { sink } }

  /// Schedule a reminder for one record and return its notification id, or
  /// `None` if the record has no due date.
  #[tracing::instrument(skip_all, fields(record_id = %record.id, kind = %record.kind()))]
  pub async fn schedule_reminder(
    &self,
    record: &CareRecord,
    pet_name: &str,
    reference: DateTime<Utc>,
  ) -> Result<Option<String>, N::Error> {
    let Some(notification) = ReminderNotification::plan(record, pet_name, reference)
    else {
      debug!("record has no due date; nothing to schedule");
      return Ok(None);
    };
    let id = notification.id.clone();
    let fire_at = notification.fire_at;
    self.sink.upsert(notification).await?;
    info!(%id, %fire_at, "reminder scheduled");
    Ok(Some(id))
  }

  /// Schedule every due record in `report`. Individual failures are
  /// collected, not propagated.
  pub async fn schedule_report(
    &self,
    report: &ReminderReport,
    pet_name: &str,
  ) -> ScheduleSummary<N::Error> {
    let mut summary = ScheduleSummary {
      scheduled: Vec::new(),
      failed:    Vec::new(),
    };
    for record in report.all_due() {
      match self
        .schedule_reminder(record, pet_name, report.reference())
        .await
      {
        Ok(Some(id)) => summary.scheduled.push(id),
        Ok(None) => {}
        Err(e) => {
          warn!(record_id = %record.id, error = %e, "failed to schedule reminder");
          summary.failed.push((record.id, e));
        }
      }
    }
    summary
  }

  /// Cancel a pending reminder. An unknown id is not an error.
  pub async fn cancel(&self, id: &str) -> Result<(), N::Error> {
    if self.sink.remove(id.to_owned()).await? {
      info!(%id, "reminder cancelled");
    } else {
      debug!(%id, "no pending reminder to cancel");
    }
    Ok(())
  }

  /// Cancel the reminder for a specific record.
  pub async fn cancel_for(&self, record: &CareRecord) -> Result<(), N::Error> {
    self.cancel(&notification_id(record.kind(), record.id)).await
  }

  pub async fn cancel_all(&self) -> Result<usize, N::Error> {
    let removed = self.sink.remove_all().await?;
    info!(removed, "all reminders cancelled");
    Ok(removed)
  }

  pub async fn pending(&self) -> Result<Vec<ReminderNotification>, N::Error> {
    self.sink.pending().await
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::BTreeMap, sync::Mutex};

  use chrono::TimeZone;

  use super::*;
  use crate::care::{
    DewormingDetails, FleaTreatmentDetails, NewCareRecord, TreatmentType, VaccinationDetails,
  };

  #[derive(Debug, thiserror::Error)]
  #[error("notifications not permitted")]
  struct Denied;

  #[derive(Default)]
  struct RecordingSink {
    pending: Mutex<BTreeMap<String, ReminderNotification>>,
    denied:  bool,
  }

  impl NotificationSink for RecordingSink {
    type Error = Denied;

    async fn upsert(&self, n: ReminderNotification) -> Result<(), Denied> {
      if self.denied {
        return Err(Denied);
      }
      self.pending.lock().unwrap().insert(n.id.clone(), n);
      Ok(())
    }

    async fn remove(&self, id: String) -> Result<bool, Denied> {
      Ok(self.pending.lock().unwrap().remove(&id).is_some())
    }

    async fn remove_all(&self) -> Result<usize, Denied> {
      let mut pending = self.pending.lock().unwrap();
      let n = pending.len();
      pending.clear();
      Ok(n)
    }

    async fn pending(&self) -> Result<Vec<ReminderNotification>, Denied> {
      let mut out: Vec<_> = self.pending.lock().unwrap().values().cloned().collect();
      out.sort_by_key(|n| n.fire_at);
      Ok(out)
    }
  }

  fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
  }

  fn rabies(due: Option<DateTime<Utc>>) -> CareRecord {
    let mut r = NewCareRecord::new(
      Uuid::new_v4(),
      at(2025, 2, 1),
      CareDetails::Vaccination(VaccinationDetails {
        vaccine_name:  "Rabies".into(),
        clinic:        Some("Happy Paws".into()),
        serial_number: None,
      }),
      "owner",
    )
    .into_record(at(2025, 2, 1));
    r.next_due_at = due;
    r
  }

  #[test]
  fn identifier_is_tag_and_uuid() {
    let id = Uuid::parse_str("6f1c2b9e-4c4e-4a8b-9d0f-1a2b3c4d5e6f").unwrap();
    assert_eq!(
      notification_id(CareKind::FleaTreatment, id),
      "flea-6f1c2b9e-4c4e-4a8b-9d0f-1a2b3c4d5e6f"
    );
  }

  #[test]
  fn fires_offset_days_before_due() {
    let record = rabies(Some(at(2026, 2, 9)));
    let n = ReminderNotification::plan(&record, "Murka", at(2026, 1, 10)).unwrap();
    assert_eq!(n.fire_at, at(2026, 2, 2));
    assert_eq!(n.title, "Vaccination reminder");
    assert!(n.body.contains("Murka"));
    assert!(n.body.contains("Rabies"));

    let deworm = NewCareRecord::new(
      record.pet_id,
      at(2026, 1, 1),
      CareDetails::Deworming(DewormingDetails {
        medication_name: "Drontal".into(),
        dosage:          None,
      }),
      "owner",
    )
    .due_at(at(2026, 1, 20))
    .into_record(at(2026, 1, 1));
    let n = ReminderNotification::plan(&deworm, "Murka", at(2026, 1, 10)).unwrap();
    assert_eq!(n.fire_at, at(2026, 1, 17));
  }

  #[test]
  fn late_reminders_fire_at_reference() {
    let flea = NewCareRecord::new(
      Uuid::new_v4(),
      at(2026, 1, 1),
      CareDetails::FleaTreatment(FleaTreatmentDetails {
        product_name: "Frontline".into(),
        treatment:    TreatmentType::Spray,
      }),
      "owner",
    )
    .due_at(at(2026, 1, 11))
    .into_record(at(2026, 1, 1));
    let n = ReminderNotification::plan(&flea, "Rex", at(2026, 1, 10)).unwrap();
    assert_eq!(n.fire_at, at(2026, 1, 10));
  }

  #[test]
  fn no_due_date_no_plan() {
    assert!(ReminderNotification::plan(&rabies(None), "Rex", at(2026, 1, 10)).is_none());
  }

  #[tokio::test]
  async fn rescheduling_replaces_pending_entry() {
    let bridge = SchedulingBridge::new(Arc::new(RecordingSink::default()));
    let record = rabies(Some(at(2026, 2, 9)));

    let first = bridge
      .schedule_reminder(&record, "Murka", at(2026, 1, 10))
      .await
      .unwrap();
    let second = bridge
      .schedule_reminder(&record, "Murka", at(2026, 1, 10))
      .await
      .unwrap();

    assert_eq!(first, second);
    assert_eq!(bridge.pending().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn cancelling_unknown_id_is_ok() {
    let bridge = SchedulingBridge::new(Arc::new(RecordingSink::default()));
    bridge.cancel("vaccination-missing").await.unwrap();

    let record = rabies(Some(at(2026, 2, 9)));
    bridge
      .schedule_reminder(&record, "Murka", at(2026, 1, 10))
      .await
      .unwrap();
    bridge.cancel_for(&record).await.unwrap();
    assert!(bridge.pending().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn denied_sink_does_not_touch_report() {
    let sink = RecordingSink {
      denied: true,
      ..RecordingSink::default()
    };
    let bridge = SchedulingBridge::new(Arc::new(sink));
    let record = rabies(Some(at(2026, 1, 20)));
    let report = ReminderReport::new(
      record.pet_id,
      at(2026, 1, 10),
      [(CareKind::Vaccination, vec![record.clone()])],
      [],
    );

    let summary = bridge.schedule_report(&report, "Murka").await;
    assert!(summary.scheduled.is_empty());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, record.id);
    assert_eq!(report.total_count(), 1);
  }
}
