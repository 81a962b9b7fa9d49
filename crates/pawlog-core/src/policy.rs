//! Due-window policy.
//!
//! Days are counted on the UTC calendar: a record due later today is zero
//! days out, and one due at 00:01 tomorrow is one day out, regardless of the
//! hour of the reference instant. Both the store-side query range
//! ([`DueWindow`]) and the local recompute ([`is_due`]) derive from
//! [`CareKind::lookahead_days`].

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::care::{CareKind, CareRecord};

/// Whole calendar days from `reference` to `due`; negative once the due date
/// has passed.
pub fn days_until_due(reference: DateTime<Utc>, due: DateTime<Utc>) -> i64 {
  (due.date_naive() - reference.date_naive()).num_days()
}

/// Where a record stands relative to its due-window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DueStatus {
  /// No next due date recorded.
  NotScheduled,
  /// The due date passed `days` calendar days ago.
  Overdue { days: i64 },
  /// Inside the window, `days` calendar days out (0 = today).
  DueSoon { days: i64 },
  /// Scheduled beyond the window.
  Later { days: i64 },
}

pub fn status(record: &CareRecord, reference: DateTime<Utc>) -> DueStatus {
  let Some(due) = record.next_due_at else {
    return DueStatus::NotScheduled;
  };
  let days = days_until_due(reference, due);
  if days < 0 {
    DueStatus::Overdue { days: -days }
  } else if days <= i64::from(record.kind().lookahead_days()) {
    DueStatus::DueSoon { days }
  } else {
    DueStatus::Later { days }
  }
}

/// `true` iff the record has a due date between today and today + window,
/// both ends inclusive. Overdue records are not due.
pub fn is_due(record: &CareRecord, reference: DateTime<Utc>) -> bool {
  matches!(status(record, reference), DueStatus::DueSoon { .. })
}

pub fn is_overdue(record: &CareRecord, reference: DateTime<Utc>) -> bool {
  matches!(status(record, reference), DueStatus::Overdue { .. })
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
  date.and_time(NaiveTime::MIN).and_utc()
}

/// Latest instant with a four-digit year. Encoded timestamps only sort
/// lexically up to here, so window bounds never go past it.
fn last_storable_instant() -> DateTime<Utc> {
  NaiveDate::from_ymd_opt(9999, 12, 31)
    .and_then(|d| d.and_hms_micro_opt(23, 59, 59, 999_999))
    .map_or(DateTime::<Utc>::MAX_UTC, |dt| dt.and_utc())
}

/// Half-open instant range `[start, end)` equivalent to the calendar-day
/// window of a kind; used to push the due filter down into a store query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>,
}

impl DueWindow {
  pub fn for_kind(kind: CareKind, reference: DateTime<Utc>) -> Self {
    let today = reference.date_naive();
    let past_window = today
      .checked_add_days(Days::new(u64::from(kind.lookahead_days()) + 1))
      .unwrap_or(NaiveDate::MAX);
    Self {
      start: start_of_day(today),
      end:   start_of_day(past_window).min(last_storable_instant()),
    }
  }

  /// Records due strictly before this instant are overdue as of `reference`.
  pub fn overdue_before(reference: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(reference.date_naive())
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at < self.end
  }
}
