//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with fixed microsecond
//! precision and a `Z` suffix, so lexical comparison in SQL agrees with
//! chronological order. Care payloads are stored as compact JSON. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use pawlog_core::{
  care::{CareDetails, CareKind, CareRecord, RecordRef},
  pet::{FeedingRecord, Gender, Pet},
  schedule::ReminderNotification,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<CareKind> { Ok(CareKind::from_tag(s)?) }

pub fn encode_gender(g: Gender) -> String { g.to_string() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown gender: {s:?}")))
}

// ─── Record refs ─────────────────────────────────────────────────────────────

/// A fresh opaque storage handle.
pub fn new_record_ref() -> RecordRef { RecordRef::new(Uuid::new_v4().simple().to_string()) }

// ─── Care records ────────────────────────────────────────────────────────────

/// Column list shared by every `care_records` SELECT, in [`RawCareRecord`]
/// field order.
pub const CARE_COLUMNS: &str = "id, record_ref, pet_id, kind, details_json, administered_at, \
                                next_due_at, notes, created_at, updated_at, created_by";

/// Raw strings read directly from a `care_records` row.
pub struct RawCareRecord {
  pub id:              String,
  pub record_ref:      String,
  pub pet_id:          String,
  pub kind:            String,
  pub details_json:    String,
  pub administered_at: String,
  pub next_due_at:     Option<String>,
  pub notes:           Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
  pub created_by:      String,
}

impl RawCareRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      record_ref:      row.get(1)?,
      pet_id:          row.get(2)?,
      kind:            row.get(3)?,
      details_json:    row.get(4)?,
      administered_at: row.get(5)?,
      next_due_at:     row.get(6)?,
      notes:           row.get(7)?,
      created_at:      row.get(8)?,
      updated_at:      row.get(9)?,
      created_by:      row.get(10)?,
    })
  }

  pub fn from_record(record: &CareRecord, record_ref: &RecordRef) -> Result<Self> {
    Ok(Self {
      id:              encode_uuid(record.id),
      record_ref:      record_ref.as_str().to_owned(),
      pet_id:          encode_uuid(record.pet_id),
      kind:            record.kind().tag().to_owned(),
      details_json:    record.details.to_json()?.to_string(),
      administered_at: encode_dt(record.administered_at),
      next_due_at:     record.next_due_at.map(encode_dt),
      notes:           record.notes.clone(),
      created_at:      encode_dt(record.created_at),
      updated_at:      encode_dt(record.updated_at),
      created_by:      record.created_by.clone(),
    })
  }

  pub fn into_record(self) -> Result<CareRecord> {
    let kind = decode_kind(&self.kind)?;
    let data: serde_json::Value = serde_json::from_str(&self.details_json)?;
    let details = CareDetails::from_parts(kind, data)?;

    Ok(CareRecord {
      id: decode_uuid(&self.id)?,
      record_ref: Some(RecordRef::new(self.record_ref)),
      pet_id: decode_uuid(&self.pet_id)?,
      administered_at: decode_dt(&self.administered_at)?,
      next_due_at: self.next_due_at.as_deref().map(decode_dt).transpose()?,
      details,
      notes: self.notes,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      created_by: self.created_by,
    })
  }
}

// ─── Pets ────────────────────────────────────────────────────────────────────

pub const PET_COLUMNS: &str = "id, record_ref, name, species, breed, gender, born_on, \
                               fur_color, microchip, owner_id, created_at, updated_at";

/// Raw strings read directly from a `pets` row.
pub struct RawPet {
  pub id:         String,
  pub record_ref: String,
  pub name:       String,
  pub species:    String,
  pub breed:      String,
  pub gender:     String,
  pub born_on:    String,
  pub fur_color:  String,
  pub microchip:  Option<String>,
  pub owner_id:   String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawPet {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      record_ref: row.get(1)?,
      name:       row.get(2)?,
      species:    row.get(3)?,
      breed:      row.get(4)?,
      gender:     row.get(5)?,
      born_on:    row.get(6)?,
      fur_color:  row.get(7)?,
      microchip:  row.get(8)?,
      owner_id:   row.get(9)?,
      created_at: row.get(10)?,
      updated_at: row.get(11)?,
    })
  }

  pub fn into_pet(self) -> Result<Pet> {
    Ok(Pet {
      id:         decode_uuid(&self.id)?,
      record_ref: Some(RecordRef::new(self.record_ref)),
      name:       self.name,
      species:    self.species,
      breed:      self.breed,
      gender:     decode_gender(&self.gender)?,
      born_on:    decode_date(&self.born_on)?,
      fur_color:  self.fur_color,
      microchip:  self.microchip,
      owner_id:   self.owner_id,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Feedings ────────────────────────────────────────────────────────────────

pub struct RawFeeding {
  pub id:      String,
  pub pet_id:  String,
  pub food:    String,
  pub portion: String,
  pub fed_at:  String,
  pub notes:   Option<String>,
  pub fed_by:  String,
}

impl RawFeeding {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:      row.get(0)?,
      pet_id:  row.get(1)?,
      food:    row.get(2)?,
      portion: row.get(3)?,
      fed_at:  row.get(4)?,
      notes:   row.get(5)?,
      fed_by:  row.get(6)?,
    })
  }

  pub fn into_feeding(self) -> Result<FeedingRecord> {
    Ok(FeedingRecord {
      id:      decode_uuid(&self.id)?,
      pet_id:  decode_uuid(&self.pet_id)?,
      food:    self.food,
      portion: self.portion,
      fed_at:  decode_dt(&self.fed_at)?,
      notes:   self.notes,
      fed_by:  self.fed_by,
    })
  }
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub struct RawNotification {
  pub id:        String,
  pub kind:      String,
  pub record_id: String,
  pub pet_id:    String,
  pub title:     String,
  pub body:      String,
  pub fire_at:   String,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      kind:      row.get(1)?,
      record_id: row.get(2)?,
      pet_id:    row.get(3)?,
      title:     row.get(4)?,
      body:      row.get(5)?,
      fire_at:   row.get(6)?,
    })
  }

  pub fn into_notification(self) -> Result<ReminderNotification> {
    Ok(ReminderNotification {
      id:        self.id,
      kind:      decode_kind(&self.kind)?,
      record_id: decode_uuid(&self.record_id)?,
      pet_id:    decode_uuid(&self.pet_id)?,
      title:     self.title,
      body:      self.body,
      fire_at:   decode_dt(&self.fire_at)?,
    })
  }
}
