//! Pets and their feeding log.
//!
//! A pet is the owning entity for care records; the core only needs its id
//! and display name. Feeding entries are append-only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::care::RecordRef;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  #[default]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
  pub id:         Uuid,
  pub record_ref: Option<RecordRef>,
  pub name:       String,
  pub species:    String,
  pub breed:      String,
  pub gender:     Gender,
  pub born_on:    NaiveDate,
  pub fur_color:  String,
  /// Microchip number, if the pet is chipped.
  pub microchip:  Option<String>,
  pub owner_id:   String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Pet {
  /// A new, unsaved pet with optional fields empty.
  pub fn new(
    name: impl Into<String>,
    species: impl Into<String>,
    born_on: NaiveDate,
    owner_id: impl Into<String>,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      record_ref: None,
      name: name.into(),
      species: species.into(),
      breed: String::new(),
      gender: Gender::default(),
      born_on,
      fur_color: String::new(),
      microchip: None,
      owner_id: owner_id.into(),
      created_at: now,
      updated_at: now,
    }
  }
}

/// One entry in a pet's feeding log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingRecord {
  pub id:      Uuid,
  pub pet_id:  Uuid,
  pub food:    String,
  pub portion: String,
  pub fed_at:  DateTime<Utc>,
  pub notes:   Option<String>,
  /// Owner or household member who did the feeding.
  pub fed_by:  String,
}

impl FeedingRecord {
  pub fn new(
    pet_id: Uuid,
    food: impl Into<String>,
    portion: impl Into<String>,
    fed_by: impl Into<String>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      pet_id,
      food: food.into(),
      portion: portion.into(),
      fed_at: Utc::now(),
      notes: None,
      fed_by: fed_by.into(),
    }
  }
}
