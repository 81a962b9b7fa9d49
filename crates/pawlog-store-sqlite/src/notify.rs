//! Pending-notification outbox: [`NotificationSink`] over the
//! `pending_notifications` table.
//!
//! A delivery agent (outside this crate) polls [`SqliteStore::due_notifications`]
//! and removes entries once shown.

use chrono::{DateTime, Utc};
use pawlog_core::schedule::{NotificationSink, ReminderNotification};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawNotification, encode_dt, encode_uuid},
};

const NOTIFICATION_COLUMNS: &str = "id, kind, record_id, pet_id, title, body, fire_at";

impl SqliteStore {
  async fn select_notifications(
    &self,
    fire_before: Option<DateTime<Utc>>,
  ) -> Result<Vec<ReminderNotification>> {
    let before = fire_before.map(encode_dt);
    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM pending_notifications
           WHERE ?1 IS NULL OR fire_at <= ?1
           ORDER BY fire_at ASC, id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![before], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  /// Pending notifications whose fire time is at or before `now`.
  pub async fn due_notifications(
    &self,
    now: DateTime<Utc>,
  ) -> Result<Vec<ReminderNotification>> {
    self.select_notifications(Some(now)).await
  }
}

impl NotificationSink for SqliteStore {
  type Error = Error;

  async fn upsert(&self, notification: ReminderNotification) -> Result<()> {
    let id        = notification.id;
    let kind      = notification.kind.tag().to_owned();
    let record_id = encode_uuid(notification.record_id);
    let pet_id    = encode_uuid(notification.pet_id);
    let title     = notification.title;
    let body      = notification.body;
    let fire_at   = encode_dt(notification.fire_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT OR REPLACE INTO pending_notifications ({NOTIFICATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![id, kind, record_id, pet_id, title, body, fire_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove(&self, id: String) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM pending_notifications WHERE id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn remove_all(&self) -> Result<usize> {
    let removed = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM pending_notifications", [])?))
      .await?;
    Ok(removed)
  }

  async fn pending(&self) -> Result<Vec<ReminderNotification>> {
    self.select_notifications(None).await
  }
}
