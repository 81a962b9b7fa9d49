//! `pawlog` — command-line front end for the pet-care journal.
//!
//! Reads `pawlog.toml` (or the path given with `--config`) plus `PAWLOG_*`
//! environment variables, opens the SQLite store, and runs one subcommand.
//!
//! # Usage
//!
//! ```
//! pawlog pet add Murka --species cat --born 2021-04-02
//! pawlog care add vaccination --pet <id> --product Rabies --due 2026-02-01
//! pawlog reminders --pet <id> --overdue
//! pawlog notify schedule --pet <id>
//! ```

mod commands;
mod display;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commands::App;
use pawlog_core::{care::TreatmentType, pet::Gender};
use pawlog_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Pet-care journal and reminders")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pawlog.toml", env = "PAWLOG_CONFIG")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage pets.
  #[command(subcommand)]
  Pet(PetCommand),
  /// Record and inspect vaccinations, dewormings and flea treatments.
  #[command(subcommand)]
  Care(CareCommand),
  /// Feeding log.
  #[command(subcommand)]
  Feed(FeedCommand),
  /// Show care records coming due for a pet.
  Reminders {
    #[arg(long)]
    pet:     Uuid,
    /// Evaluate as of this date instead of now.
    #[arg(long, value_name = "YYYY-MM-DD")]
    at:      Option<NaiveDate>,
    /// Also list records whose due date has passed.
    #[arg(long)]
    overdue: bool,
    /// Print the report as JSON.
    #[arg(long)]
    json:    bool,
  },
  /// Pending reminder notifications.
  #[command(subcommand)]
  Notify(NotifyCommand),
}

#[derive(Subcommand, Debug)]
pub enum PetCommand {
  Add {
    name:      String,
    #[arg(long)]
    species:   String,
    #[arg(long, value_name = "YYYY-MM-DD")]
    born:      NaiveDate,
    #[arg(long, default_value = "")]
    breed:     String,
    #[arg(long, default_value = "unknown")]
    gender:    Gender,
    #[arg(long, default_value = "")]
    fur_color: String,
    #[arg(long)]
    microchip: Option<String>,
  },
  List,
  /// Delete a pet with its care records, feeding log and reminders.
  Remove { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum CareCommand {
  Add {
    /// vaccination, deworming or flea.
    kind:          String,
    #[arg(long)]
    pet:           Uuid,
    /// Vaccine, medication or product name.
    #[arg(long)]
    product:       String,
    /// Administration date; defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    given:         Option<NaiveDate>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    due:           Option<NaiveDate>,
    #[arg(long)]
    clinic:        Option<String>,
    #[arg(long)]
    serial_number: Option<String>,
    #[arg(long)]
    dosage:        Option<String>,
    #[arg(long, default_value = "drops")]
    treatment:     TreatmentType,
    #[arg(long)]
    notes:         Option<String>,
  },
  List {
    #[arg(long)]
    pet:  Uuid,
    #[arg(long)]
    kind: Option<String>,
  },
  /// Delete a record and cancel its pending reminder.
  Remove { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum FeedCommand {
  Log {
    #[arg(long)]
    pet:     Uuid,
    food:    String,
    #[arg(long, default_value = "1 portion")]
    portion: String,
    #[arg(long)]
    notes:   Option<String>,
  },
  Recent {
    #[arg(long)]
    pet:   Uuid,
    #[arg(long, default_value_t = 10)]
    limit: usize,
  },
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommand {
  /// Schedule reminders for everything currently due.
  Schedule {
    #[arg(long)]
    pet: Uuid,
    #[arg(long, value_name = "YYYY-MM-DD")]
    at:  Option<NaiveDate>,
  },
  /// Cancel one pending reminder by notification id.
  Cancel { id: String },
  /// Cancel every pending reminder.
  CancelAll,
  Pending,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so command output stays pipeable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = settings::load(&cli.config)?;

  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  let app = App {
    store: Arc::new(store),
    owner: cfg.owner,
  };

  let output = match cli.command {
    Command::Pet(cmd) => app.pet(cmd).await?,
    Command::Care(cmd) => app.care(cmd).await?,
    Command::Feed(cmd) => app.feed(cmd).await?,
    Command::Reminders {
      pet,
      at,
      overdue,
      json,
    } => app.reminders(pet, at, overdue, json).await?,
    Command::Notify(cmd) => app.notify(cmd).await?,
  };

  print!("{output}");
  Ok(())
}
