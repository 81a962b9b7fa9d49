//! Subcommand handlers. Each returns the text to print on stdout.

use std::sync::Arc;

use anyhow::{Context as _, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use pawlog_core::{
  ReminderAggregator,
  care::{
    CareDetails, CareKind, DewormingDetails, FleaTreatmentDetails, NewCareRecord,
    VaccinationDetails,
  },
  pet::{FeedingRecord, Pet},
  schedule::{NotificationSink, SchedulingBridge},
  store::{CareStore, PetStore},
};
use pawlog_store_sqlite::SqliteStore;
use strum::IntoEnumIterator;
use tracing::info;
use uuid::Uuid;

use crate::{CareCommand, FeedCommand, NotifyCommand, PetCommand, display};

pub struct App {
  pub store: Arc<SqliteStore>,
  /// Stamped on everything this invocation creates.
  pub owner: String,
}

/// Start of `date` in UTC, or now.
fn reference(at: Option<NaiveDate>) -> DateTime<Utc> {
  at.map_or_else(Utc::now, |d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Cancel the record's pending reminder, then delete the record. A failed
/// cancel leaves the record in place.
async fn remove_care<S, N>(
  store: &S,
  bridge: &SchedulingBridge<N>,
  id: Uuid,
) -> anyhow::Result<()>
where
  S: CareStore,
  N: NotificationSink,
{
  let record = store
    .get(id)
    .await?
    .with_context(|| format!("no care record with id {id}"))?;
  let Some(record_ref) = record.record_ref.clone() else {
    bail!("care record {id} has no storage reference");
  };
  bridge.cancel_for(&record).await?;
  store.delete(record_ref).await?;
  Ok(())
}

impl App {
  async fn require_pet(&self, id: Uuid) -> anyhow::Result<Pet> {
    self
      .store
      .get_pet(id)
      .await?
      .with_context(|| format!("no pet with id {id}"))
  }

  fn bridge(&self) -> SchedulingBridge<SqliteStore> {
    SchedulingBridge::new(Arc::clone(&self.store))
  }

  // ─── pet ─────────────────────────────────────────────────────────────────

  pub async fn pet(&self, cmd: PetCommand) -> anyhow::Result<String> {
    match cmd {
      PetCommand::Add {
        name,
        species,
        born,
        breed,
        gender,
        fur_color,
        microchip,
      } => {
        let mut pet = Pet::new(name, species, born, self.owner.clone());
        pet.breed = breed;
        pet.gender = gender;
        pet.fur_color = fur_color;
        pet.microchip = microchip;
        let pet = self.store.save_pet(pet).await?;
        info!(pet_id = %pet.id, "pet added");
        Ok(format!("{}\n", pet.id))
      }
      PetCommand::List => Ok(display::pets(&self.store.list_pets().await?)),
      PetCommand::Remove { id } => {
        let pet = self.require_pet(id).await?;
        let Some(record_ref) = pet.record_ref else {
          bail!("pet {id} has no storage reference");
        };
        self.store.delete_pet(record_ref).await?;
        Ok(format!("removed {}\n", pet.name))
      }
    }
  }

  // ─── care ────────────────────────────────────────────────────────────────

  pub async fn care(&self, cmd: CareCommand) -> anyhow::Result<String> {
    match cmd {
      CareCommand::Add {
        kind,
        pet,
        product,
        given,
        due,
        clinic,
        serial_number,
        dosage,
        treatment,
        notes,
      } => {
        let pet = self.require_pet(pet).await?;
        let details = match CareKind::from_tag(&kind)? {
          CareKind::Vaccination => CareDetails::Vaccination(VaccinationDetails {
            vaccine_name: product,
            clinic,
            serial_number,
          }),
          CareKind::Deworming => CareDetails::Deworming(DewormingDetails {
            medication_name: product,
            dosage,
          }),
          CareKind::FleaTreatment => CareDetails::FleaTreatment(FleaTreatmentDetails {
            product_name: product,
            treatment,
          }),
        };

        let mut new = NewCareRecord::new(pet.id, reference(given), details, self.owner.clone());
        new.notes = notes;
        if let Some(due) = due {
          new = new.due_at(reference(Some(due)));
        }
        let record = self.store.save(new.into_record(Utc::now())).await?;
        info!(record_id = %record.id, kind = %record.kind(), "care record added");
        Ok(format!("{}\n", record.id))
      }
      CareCommand::List { pet, kind } => {
        let kinds = match kind {
          Some(tag) => vec![CareKind::from_tag(&tag)?],
          None => CareKind::iter().collect(),
        };
        let mut records = Vec::new();
        for kind in kinds {
          records.extend(self.store.fetch_all(pet, kind).await?);
        }
        Ok(display::records(&records, Utc::now()))
      }
      CareCommand::Remove { id } => {
        remove_care(self.store.as_ref(), &self.bridge(), id).await?;
        Ok(format!("removed {id}\n"))
      }
    }
  }

  // ─── feed ────────────────────────────────────────────────────────────────

  pub async fn feed(&self, cmd: FeedCommand) -> anyhow::Result<String> {
    match cmd {
      FeedCommand::Log {
        pet,
        food,
        portion,
        notes,
      } => {
        let pet = self.require_pet(pet).await?;
        let mut entry = FeedingRecord::new(pet.id, food, portion, self.owner.clone());
        entry.notes = notes;
        let entry = self.store.log_feeding(entry).await?;
        Ok(format!("fed {} {}\n", pet.name, entry.food))
      }
      FeedCommand::Recent { pet, limit } => {
        Ok(display::feedings(&self.store.recent_feedings(pet, limit).await?))
      }
    }
  }

  // ─── reminders ───────────────────────────────────────────────────────────

  pub async fn reminders(
    &self,
    pet: Uuid,
    at: Option<NaiveDate>,
    overdue: bool,
    json: bool,
  ) -> anyhow::Result<String> {
    let pet = self.require_pet(pet).await?;
    let report = ReminderAggregator::new(Arc::clone(&self.store))
      .with_overdue(overdue)
      .fetch_all_upcoming(pet.id, reference(at))
      .await?;

    if json {
      let mut out = serde_json::to_string_pretty(&report)?;
      out.push('\n');
      Ok(out)
    } else {
      Ok(display::report(&report, &pet.name))
    }
  }

  // ─── notify ──────────────────────────────────────────────────────────────

  pub async fn notify(&self, cmd: NotifyCommand) -> anyhow::Result<String> {
    let bridge = self.bridge();
    match cmd {
      NotifyCommand::Schedule { pet, at } => {
        let pet = self.require_pet(pet).await?;
        let report = ReminderAggregator::new(Arc::clone(&self.store))
          .fetch_all_upcoming(pet.id, reference(at))
          .await?;
        let summary = bridge.schedule_report(&report, &pet.name).await;

        let mut out = format!("scheduled {} reminder(s)\n", summary.scheduled.len());
        for (record_id, error) in &summary.failed {
          out.push_str(&format!("failed {record_id}: {error}\n"));
        }
        Ok(out)
      }
      NotifyCommand::Cancel { id } => {
        bridge.cancel(&id).await?;
        Ok(format!("cancelled {id}\n"))
      }
      NotifyCommand::CancelAll => {
        let removed = bridge.cancel_all().await?;
        Ok(format!("cancelled {removed} reminder(s)\n"))
      }
      NotifyCommand::Pending => Ok(display::pending(&bridge.pending().await?)),
    }
  }
}
