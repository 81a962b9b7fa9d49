//! Plain-text rendering for CLI output.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use pawlog_core::{
  ReminderReport,
  care::{CareDetails, CareRecord},
  pet::{FeedingRecord, Pet},
  policy::{self, DueStatus},
  schedule::ReminderNotification,
};

fn date(dt: DateTime<Utc>) -> String { dt.format("%Y-%m-%d").to_string() }

fn ref_or_dash(record: &CareRecord) -> &str {
  record.record_ref.as_ref().map_or("-", |r| r.as_str())
}

fn status_label(status: DueStatus) -> String {
  match status {
    DueStatus::NotScheduled => "no follow-up".to_owned(),
    DueStatus::Overdue { days } => format!("overdue by {days}d"),
    DueStatus::DueSoon { days: 0 } => "due today".to_owned(),
    DueStatus::DueSoon { days } => format!("due in {days}d"),
    DueStatus::Later { days } => format!("in {days}d"),
  }
}

fn detail_suffix(details: &CareDetails) -> String {
  match details {
    CareDetails::Vaccination(v) => v
      .clinic
      .as_deref()
      .map(|c| format!(" @ {c}"))
      .unwrap_or_default(),
    CareDetails::Deworming(d) => d
      .dosage
      .as_deref()
      .map(|d| format!(" ({d})"))
      .unwrap_or_default(),
    CareDetails::FleaTreatment(f) => format!(" ({})", f.treatment),
  }
}

/// One line per record with its due status relative to `reference`.
pub fn records(records: &[CareRecord], reference: DateTime<Utc>) -> String {
  if records.is_empty() {
    return "no records\n".to_owned();
  }
  let mut out = String::new();
  for r in records {
    let due = r.next_due_at.map(date).unwrap_or_else(|| "-".to_owned());
    let _ = writeln!(
      out,
      "{:<14} {:<24} given {}  next {:<10}  {:<14} [{}]",
      r.kind().label(),
      format!("{}{}", r.details.product(), detail_suffix(&r.details)),
      date(r.administered_at),
      due,
      status_label(policy::status(r, reference)),
      ref_or_dash(r),
    );
  }
  out
}

pub fn report(report: &ReminderReport, pet_name: &str) -> String {
  let mut out = String::new();
  let reference = report.reference();
  if !report.has_reminders() {
    let _ = writeln!(out, "{pet_name}: nothing due as of {}", date(reference));
  } else {
    let _ = writeln!(
      out,
      "{pet_name}: {} reminder(s) as of {}",
      report.total_count(),
      date(reference)
    );
    for (kind, due) in report.iter() {
      if due.is_empty() {
        continue;
      }
      let _ = writeln!(out, "\n{} (within {} days)", kind.label(), kind.lookahead_days());
      out.push_str(&records(due, reference));
    }
  }

  if report.overdue_count() > 0 {
    let _ = writeln!(out, "\noverdue");
    for (kind, _) in report.iter() {
      let overdue = report.overdue(kind);
      if !overdue.is_empty() {
        out.push_str(&records(overdue, reference));
      }
    }
  }
  out
}

pub fn pets(pets: &[Pet]) -> String {
  if pets.is_empty() {
    return "no pets\n".to_owned();
  }
  let mut out = String::new();
  for p in pets {
    let _ = writeln!(
      out,
      "{}  {:<16} {:<8} {:<8} born {}  [{}]",
      p.id,
      p.name,
      p.species,
      p.gender,
      p.born_on,
      p.record_ref.as_ref().map_or("-", |r| r.as_str()),
    );
  }
  out
}

pub fn feedings(entries: &[FeedingRecord]) -> String {
  if entries.is_empty() {
    return "no feedings\n".to_owned();
  }
  let mut out = String::new();
  for f in entries {
    let _ = writeln!(
      out,
      "{}  {:<20} {:<10} by {}{}",
      f.fed_at.format("%Y-%m-%d %H:%M"),
      f.food,
      f.portion,
      f.fed_by,
      f.notes.as_deref().map(|n| format!("  ({n})")).unwrap_or_default(),
    );
  }
  out
}

pub fn pending(notifications: &[ReminderNotification]) -> String {
  if notifications.is_empty() {
    return "no pending reminders\n".to_owned();
  }
  let mut out = String::new();
  for n in notifications {
    let _ = writeln!(
      out,
      "{}  {:<50} {}: {}",
      n.fire_at.format("%Y-%m-%d %H:%M"),
      n.id,
      n.title,
      n.body
    );
  }
  out
}
