//! The reminder report: the merged, per-kind view of care records that are
//! coming due for one pet.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::care::{CareKind, CareRecord};

/// Immutable result of one aggregation. Every [`CareKind`] has an entry, even
/// if empty. Derived counts are recomputed on each call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderReport {
  pet_id:    Uuid,
  reference: DateTime<Utc>,
  per_kind:  BTreeMap<CareKind, Vec<CareRecord>>,
  /// Only populated when the aggregator was asked for overdue records.
  overdue:   BTreeMap<CareKind, Vec<CareRecord>>,
}

impl ReminderReport {
  pub fn new(
    pet_id: Uuid,
    reference: DateTime<Utc>,
    per_kind: impl IntoIterator<Item = (CareKind, Vec<CareRecord>)>,
    overdue: impl IntoIterator<Item = (CareKind, Vec<CareRecord>)>,
  ) -> Self {
    Self {
      pet_id,
      reference,
      per_kind: fill_kinds(per_kind),
      overdue: fill_kinds(overdue),
    }
  }

  /// A report with nothing due.
  pub fn empty(pet_id: Uuid, reference: DateTime<Utc>) -> Self {
    Self::new(pet_id, reference, [], [])
  }

  pub fn pet_id(&self) -> Uuid { self.pet_id }

  /// The instant the due-window was evaluated against.
  pub fn reference(&self) -> DateTime<Utc> { self.reference }

  /// Records of `kind` coming due, ascending by due date.
  pub fn records(&self, kind: CareKind) -> &[CareRecord] {
    self.per_kind.get(&kind).map(Vec::as_slice).unwrap_or_default()
  }

  /// `(kind, records)` pairs in enumeration order.
  pub fn iter(&self) -> impl Iterator<Item = (CareKind, &[CareRecord])> + '_ {
    self.per_kind.iter().map(|(k, v)| (*k, v.as_slice()))
  }

  /// Every due record across kinds, in enumeration order then due date.
  pub fn all_due(&self) -> impl Iterator<Item = &CareRecord> + '_ {
    self.per_kind.values().flatten()
  }

  pub fn has_reminders(&self) -> bool {
    self.per_kind.values().any(|v| !v.is_empty())
  }

  pub fn total_count(&self) -> usize { self.per_kind.values().map(Vec::len).sum() }

  /// Overdue records of `kind`; always empty unless requested.
  pub fn overdue(&self, kind: CareKind) -> &[CareRecord] {
    self.overdue.get(&kind).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn overdue_count(&self) -> usize { self.overdue.values().map(Vec::len).sum() }
}

fn fill_kinds(
  entries: impl IntoIterator<Item = (CareKind, Vec<CareRecord>)>,
) -> BTreeMap<CareKind, Vec<CareRecord>> {
  let mut map: BTreeMap<_, _> = CareKind::iter().map(|k| (k, Vec::new())).collect();
  for (kind, records) in entries {
    map.insert(kind, records);
  }
  map
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::care::{CareDetails, NewCareRecord, VaccinationDetails};

  fn vaccination(name: &str) -> CareRecord {
    let at = Utc.with_ymd_and_hms(2025, 12, 1, 10, 0, 0).unwrap();
    NewCareRecord::new(
      Uuid::nil(),
      at,
      CareDetails::Vaccination(VaccinationDetails {
        vaccine_name:  name.into(),
        clinic:        None,
        serial_number: None,
      }),
      "test",
    )
    .into_record(at)
  }

  #[test]
  fn empty_report_has_every_kind() {
    let report = ReminderReport::empty(Uuid::nil(), Utc::now());
    assert!(!report.has_reminders());
    assert_eq!(report.total_count(), 0);
    assert_eq!(report.iter().count(), 3);
    for kind in CareKind::iter() {
      assert!(report.records(kind).is_empty());
      assert!(report.overdue(kind).is_empty());
    }
  }

  #[test]
  fn counts_are_summed_across_kinds() {
    let report = ReminderReport::new(
      Uuid::nil(),
      Utc::now(),
      [(CareKind::Vaccination, vec![vaccination("Rabies"), vaccination("DHPP")])],
      [(CareKind::Vaccination, vec![vaccination("Lepto")])],
    );
    assert!(report.has_reminders());
    assert_eq!(report.total_count(), 2);
    assert_eq!(report.overdue_count(), 1);
    assert_eq!(report.all_due().count(), 2);
    assert!(report.records(CareKind::Deworming).is_empty());
  }

  #[test]
  fn serialises_kinds_by_tag() {
    let report = ReminderReport::empty(Uuid::nil(), Utc::now());
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["per_kind"].get("flea").is_some());
    assert!(json["per_kind"].get("vaccination").is_some());
  }
}
