//! [`SqliteStore`], the SQLite implementation of [`CareStore`] and
//! [`PetStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use pawlog_core::{
  care::{CareKind, CareRecord, RecordRef},
  pet::{FeedingRecord, Pet},
  policy::DueWindow,
  store::{CareStore, PetStore, StoreFailure},
};

use crate::{
  Error, Result,
  encode::{
    CARE_COLUMNS, PET_COLUMNS, RawCareRecord, RawFeeding, RawPet, decode_dt, encode_date,
    encode_dt, encode_gender, encode_uuid, new_record_ref,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Pawlog store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `care_records` SELECT with the given WHERE/ORDER tail.
  async fn select_care(
    &self,
    tail: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<CareRecord>> {
    let raws: Vec<RawCareRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {CARE_COLUMNS} FROM care_records {tail}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawCareRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCareRecord::into_record).collect()
  }

  /// Due-window query shared by upcoming and overdue fetches.
  async fn select_due_between(
    &self,
    pet_id: Uuid,
    kind: CareKind,
    from: Option<DateTime<Utc>>,
    until: DateTime<Utc>,
  ) -> Result<Vec<CareRecord>> {
    let mut params = vec![encode_uuid(pet_id), kind.tag().to_owned()];
    let tail = match from {
      Some(from) => {
        params.push(encode_dt(from));
        "WHERE pet_id = ?1 AND kind = ?2
           AND next_due_at IS NOT NULL
           AND next_due_at >= ?3 AND next_due_at < ?4
         ORDER BY next_due_at ASC"
      }
      None => {
        "WHERE pet_id = ?1 AND kind = ?2
           AND next_due_at IS NOT NULL
           AND next_due_at < ?3
         ORDER BY next_due_at ASC"
      }
    };
    params.push(encode_dt(until));
    self.select_care(tail, params).await
  }
}

// ─── CareStore impl ──────────────────────────────────────────────────────────

impl CareStore for SqliteStore {
  type Error = Error;

  fn classify(error: &Error) -> StoreFailure { error.failure() }

  async fn fetch_upcoming(
    &self,
    pet_id:    Uuid,
    kind:      CareKind,
    reference: DateTime<Utc>,
  ) -> Result<Vec<CareRecord>> {
    let window = DueWindow::for_kind(kind, reference);
    self
      .select_due_between(pet_id, kind, Some(window.start), window.end)
      .await
  }

  async fn fetch_overdue(
    &self,
    pet_id:    Uuid,
    kind:      CareKind,
    reference: DateTime<Utc>,
  ) -> Result<Vec<CareRecord>> {
    self
      .select_due_between(pet_id, kind, None, DueWindow::overdue_before(reference))
      .await
  }

  async fn fetch_all(&self, pet_id: Uuid, kind: CareKind) -> Result<Vec<CareRecord>> {
    self
      .select_care(
        "WHERE pet_id = ?1 AND kind = ?2 ORDER BY administered_at DESC",
        vec![encode_uuid(pet_id), kind.tag().to_owned()],
      )
      .await
  }

  async fn get(&self, id: Uuid) -> Result<Option<CareRecord>> {
    let mut found = self
      .select_care("WHERE id = ?1", vec![encode_uuid(id)])
      .await?;
    Ok(found.pop())
  }

  async fn save(&self, mut record: CareRecord) -> Result<CareRecord> {
    // Stored timestamps carry microseconds; keep the returned copy identical.
    record.updated_at = Utc::now().trunc_subsecs(6);
    let candidate_ref = record.record_ref.clone().unwrap_or_else(new_record_ref);
    let raw = RawCareRecord::from_record(&record, &candidate_ref)?;

    // Updates keep the stored record_ref and created_at.
    let (ref_str, created_str): (String, String) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<(String, String)> = tx
          .query_row(
            "SELECT record_ref, created_at FROM care_records WHERE id = ?1",
            rusqlite::params![raw.id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let stamped = match existing {
          Some(stamped) => {
            tx.execute(
              "UPDATE care_records SET
                 pet_id = ?2, kind = ?3, details_json = ?4, administered_at = ?5,
                 next_due_at = ?6, notes = ?7, updated_at = ?8, created_by = ?9
               WHERE id = ?1",
              rusqlite::params![
                raw.id,
                raw.pet_id,
                raw.kind,
                raw.details_json,
                raw.administered_at,
                raw.next_due_at,
                raw.notes,
                raw.updated_at,
                raw.created_by,
              ],
            )?;
            stamped
          }
          None => {
            tx.execute(
              "INSERT INTO care_records (
                 id, record_ref, pet_id, kind, details_json, administered_at,
                 next_due_at, notes, created_at, updated_at, created_by
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
              rusqlite::params![
                raw.id,
                raw.record_ref,
                raw.pet_id,
                raw.kind,
                raw.details_json,
                raw.administered_at,
                raw.next_due_at,
                raw.notes,
                raw.created_at,
                raw.updated_at,
                raw.created_by,
              ],
            )?;
            (raw.record_ref, raw.created_at)
          }
        };
        tx.commit()?;
        Ok(stamped)
      })
      .await?;

    record.record_ref = Some(RecordRef::new(ref_str));
    record.created_at = decode_dt(&created_str)?;
    debug!(id = %record.id, kind = %record.kind(), "care record saved");
    Ok(record)
  }

  async fn delete(&self, record_ref: RecordRef) -> Result<()> {
    let ref_str = record_ref.as_str().to_owned();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM care_records WHERE record_ref = ?1",
          rusqlite::params![ref_str],
        )?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::RecordNotFound(record_ref.to_string()));
    }
    Ok(())
  }
}

// ─── PetStore impl ───────────────────────────────────────────────────────────

impl PetStore for SqliteStore {
  type Error = Error;

  async fn save_pet(&self, mut pet: Pet) -> Result<Pet> {
    pet.updated_at = Utc::now().trunc_subsecs(6);
    let candidate_ref = pet.record_ref.clone().unwrap_or_else(new_record_ref);

    let id_str      = encode_uuid(pet.id);
    let ref_str     = candidate_ref.as_str().to_owned();
    let name        = pet.name.clone();
    let species     = pet.species.clone();
    let breed       = pet.breed.clone();
    let gender      = encode_gender(pet.gender);
    let born_on     = encode_date(pet.born_on);
    let fur_color   = pet.fur_color.clone();
    let microchip   = pet.microchip.clone();
    let owner_id    = pet.owner_id.clone();
    let created_str = encode_dt(pet.created_at);
    let updated_str = encode_dt(pet.updated_at);

    let (ref_str, created_str): (String, String) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<(String, String)> = tx
          .query_row(
            "SELECT record_ref, created_at FROM pets WHERE id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let stamped = match existing {
          Some(stamped) => {
            tx.execute(
              "UPDATE pets SET
                 name = ?2, species = ?3, breed = ?4, gender = ?5, born_on = ?6,
                 fur_color = ?7, microchip = ?8, owner_id = ?9, updated_at = ?10
               WHERE id = ?1",
              rusqlite::params![
                id_str, name, species, breed, gender, born_on, fur_color, microchip,
                owner_id, updated_str,
              ],
            )?;
            stamped
          }
          None => {
            tx.execute(
              "INSERT INTO pets (
                 id, record_ref, name, species, breed, gender, born_on,
                 fur_color, microchip, owner_id, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
              rusqlite::params![
                id_str, ref_str, name, species, breed, gender, born_on, fur_color,
                microchip, owner_id, created_str, updated_str,
              ],
            )?;
            (ref_str, created_str)
          }
        };
        tx.commit()?;
        Ok(stamped)
      })
      .await?;

    pet.record_ref = Some(RecordRef::new(ref_str));
    pet.created_at = decode_dt(&created_str)?;
    Ok(pet)
  }

  async fn get_pet(&self, id: Uuid) -> Result<Option<Pet>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawPet> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PET_COLUMNS} FROM pets WHERE id = ?1"),
              rusqlite::params![id_str],
              RawPet::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPet::into_pet).transpose()
  }

  async fn list_pets(&self) -> Result<Vec<Pet>> {
    let raws: Vec<RawPet> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PET_COLUMNS} FROM pets ORDER BY name COLLATE NOCASE, created_at"
        ))?;
        let rows = stmt
          .query_map([], RawPet::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPet::into_pet).collect()
  }

  async fn delete_pet(&self, record_ref: RecordRef) -> Result<()> {
    let ref_str = record_ref.as_str().to_owned();
    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let pet_id: Option<String> = tx
          .query_row(
            "SELECT id FROM pets WHERE record_ref = ?1",
            rusqlite::params![ref_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(pet_id) = pet_id else {
          return Ok(false);
        };
        for table in ["care_records", "feedings", "pending_notifications"] {
          tx.execute(
            &format!("DELETE FROM {table} WHERE pet_id = ?1"),
            rusqlite::params![pet_id],
          )?;
        }
        tx.execute("DELETE FROM pets WHERE id = ?1", rusqlite::params![pet_id])?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::RecordNotFound(record_ref.to_string()));
    }
    Ok(())
  }

  async fn log_feeding(&self, mut entry: FeedingRecord) -> Result<FeedingRecord> {
    entry.fed_at = entry.fed_at.trunc_subsecs(6);
    let id_str     = encode_uuid(entry.id);
    let pet_id_str = encode_uuid(entry.pet_id);
    let food       = entry.food.clone();
    let portion    = entry.portion.clone();
    let fed_at     = encode_dt(entry.fed_at);
    let notes      = entry.notes.clone();
    let fed_by     = entry.fed_by.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO feedings (id, pet_id, food, portion, fed_at, notes, fed_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, pet_id_str, food, portion, fed_at, notes, fed_by],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn recent_feedings(&self, pet_id: Uuid, limit: usize) -> Result<Vec<FeedingRecord>> {
    let pet_id_str = encode_uuid(pet_id);
    let limit_val  = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawFeeding> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, pet_id, food, portion, fed_at, notes, fed_by
           FROM feedings
           WHERE pet_id = ?1
           ORDER BY fed_at DESC
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pet_id_str, limit_val], RawFeeding::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFeeding::into_feeding).collect()
  }
}
