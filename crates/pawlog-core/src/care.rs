//! Care records: vaccinations, dewormings and flea treatments.
//!
//! Every care record shares one shape (who, when administered, when next due)
//! and carries a kind-specific payload in [`CareDetails`]. The payload variant
//! is the single source of a record's [`CareKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, policy};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The three medical-intervention categories tracked per pet.
///
/// Declaration order is the enumeration order used everywhere a report is
/// built or iterated.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
pub enum CareKind {
  #[serde(rename = "vaccination")]
  #[strum(serialize = "vaccination")]
  Vaccination,
  #[serde(rename = "deworming")]
  #[strum(serialize = "deworming")]
  Deworming,
  #[serde(rename = "flea")]
  #[strum(serialize = "flea")]
  FleaTreatment,
}

impl CareKind {
  /// Short tag used in storage discriminants and notification identifiers.
  pub fn tag(self) -> &'static str { self.into() }

  /// Parse a tag produced by [`CareKind::tag`].
  pub fn from_tag(tag: &str) -> Result<Self> {
    tag
      .parse()
      .map_err(|_| Error::UnknownCareKind(tag.to_owned()))
  }

  /// Number of calendar days ahead of the reference date during which a
  /// record of this kind counts as coming due.
  pub fn lookahead_days(self) -> u32 {
    match self {
      Self::Vaccination => 30,
      Self::Deworming => 14,
      Self::FleaTreatment => 7,
    }
  }

  /// Days before the due date at which a reminder notification fires.
  pub fn reminder_offset_days(self) -> u32 {
    match self {
      Self::Vaccination => 7,
      Self::Deworming => 3,
      Self::FleaTreatment => 3,
    }
  }

  /// Human-readable noun, e.g. for CLI tables.
  pub fn label(self) -> &'static str {
    match self {
      Self::Vaccination => "vaccination",
      Self::Deworming => "deworming",
      Self::FleaTreatment => "flea treatment",
    }
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

/// How a flea treatment was applied.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TreatmentType {
  #[default]
  Drops,
  Collar,
  Tablets,
  Spray,
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationDetails {
  pub vaccine_name:  String,
  pub clinic:        Option<String>,
  /// Batch or serial number printed on the vaccine label.
  pub serial_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DewormingDetails {
  pub medication_name: String,
  pub dosage:          Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleaTreatmentDetails {
  pub product_name: String,
  pub treatment:    TreatmentType,
}

/// The kind-specific payload of a care record. The variant tag matches
/// [`CareKind::tag`] and is stored as the `kind` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CareDetails {
  #[serde(rename = "vaccination")]
  Vaccination(VaccinationDetails),
  #[serde(rename = "deworming")]
  Deworming(DewormingDetails),
  #[serde(rename = "flea")]
  FleaTreatment(FleaTreatmentDetails),
}

impl CareDetails {
  pub fn kind(&self) -> CareKind {
    match self {
      Self::Vaccination(_) => CareKind::Vaccination,
      Self::Deworming(_) => CareKind::Deworming,
      Self::FleaTreatment(_) => CareKind::FleaTreatment,
    }
  }

  /// The product, vaccine or medication name, whichever the kind has.
  pub fn product(&self) -> &str {
    match self {
      Self::Vaccination(v) => &v.vaccine_name,
      Self::Deworming(d) => &d.medication_name,
      Self::FleaTreatment(f) => &f.product_name,
    }
  }

  /// Serialise the inner payload (without the kind tag) for storage.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Rebuild from a stored kind and payload. A payload that does not match
  /// the kind is a conversion failure, not a serialisation bug.
  pub fn from_parts(kind: CareKind, data: serde_json::Value) -> Result<Self> {
    let wrapped = serde_json::json!({ "kind": kind.tag(), "data": data });
    serde_json::from_value(wrapped)
      .map_err(|e| Error::ConversionFailed(format!("{kind} payload: {e}")))
  }
}

// ─── Record reference ────────────────────────────────────────────────────────

/// Opaque storage handle assigned by a store on the first successful save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordRef(String);

impl RecordRef {
  pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for RecordRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── CareRecord ──────────────────────────────────────────────────────────────

/// A single vaccination, deworming or flea treatment for one pet.
///
/// `id` never changes for the lifetime of the record. `next_due_at` is not
/// required to be after `administered_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareRecord {
  pub id:              Uuid,
  /// `None` until the record has been saved once.
  pub record_ref:      Option<RecordRef>,
  pub pet_id:          Uuid,
  pub administered_at: DateTime<Utc>,
  pub next_due_at:     Option<DateTime<Utc>>,
  pub details:         CareDetails,
  pub notes:           Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub created_by:      String,
}

impl CareRecord {
  pub fn kind(&self) -> CareKind { self.details.kind() }

  /// Whether the record is inside its kind's due-window as of `reference`.
  pub fn is_due(&self, reference: DateTime<Utc>) -> bool {
    policy::is_due(self, reference)
  }
}

// ─── NewCareRecord ───────────────────────────────────────────────────────────

/// Caller input for a new care record; identity and timestamps are stamped
/// by [`NewCareRecord::into_record`].
#[derive(Debug, Clone)]
pub struct NewCareRecord {
  pub pet_id:          Uuid,
  pub administered_at: DateTime<Utc>,
  pub next_due_at:     Option<DateTime<Utc>>,
  pub details:         CareDetails,
  pub notes:           Option<String>,
  pub created_by:      String,
}

impl NewCareRecord {
  pub fn new(
    pet_id: Uuid,
    administered_at: DateTime<Utc>,
    details: CareDetails,
    created_by: impl Into<String>,
  ) -> Self {
    Self {
      pet_id,
      administered_at,
      next_due_at: None,
      details,
      notes: None,
      created_by: created_by.into(),
    }
  }

  pub fn due_at(mut self, next_due_at: DateTime<Utc>) -> Self {
    self.next_due_at = Some(next_due_at);
    self
  }

  pub fn into_record(self, now: DateTime<Utc>) -> CareRecord {
    CareRecord {
      id:              Uuid::new_v4(),
      record_ref:      None,
      pet_id:          self.pet_id,
      administered_at: self.administered_at,
      next_due_at:     self.next_due_at,
      details:         self.details,
      notes:           self.notes,
      created_at:      now,
      updated_at:      now,
      created_by:      self.created_by,
    }
  }
}
