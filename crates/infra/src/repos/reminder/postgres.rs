use super::IReminderRepo;
use anyhow::Context;
use reminder_scheduler_domain::{parse_timezone, Reminder, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    user_id: String,
    title: String,
    description: String,
    cron: String,
    timezone: String,
    is_recurring: bool,
    next_execution: i64,
    is_scheduled: bool,
    created: i64,
}

impl TryFrom<ReminderRaw> for Reminder {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderRaw) -> anyhow::Result<Self> {
        Ok(Reminder {
            id: raw.reminder_uid.into(),
            cron: raw
                .cron
                .parse()
                .with_context(|| format!("Stored cron of reminder {}", raw.reminder_uid))?,
            timezone: parse_timezone(&raw.timezone)
                .with_context(|| format!("Stored timezone of reminder {}", raw.reminder_uid))?,
            user_id: raw.user_id,
            title: raw.title,
            description: raw.description,
            is_recurring: raw.is_recurring,
            next_execution: raw.next_execution,
            is_scheduled: raw.is_scheduled,
            created: raw.created,
        })
    }
}

fn into_reminders(rows: Vec<ReminderRaw>) -> anyhow::Result<Vec<Reminder>> {
    rows.into_iter().map(Reminder::try_from).collect()
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders
            (reminder_uid, user_id, title, description, cron, timezone, is_recurring, next_execution, is_scheduled, created)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(&reminder.user_id)
        .bind(&reminder.title)
        .bind(&reminder.description)
        .bind(reminder.cron.as_str())
        .bind(reminder.timezone.name())
        .bind(reminder.is_recurring)
        .bind(reminder.next_execution)
        .bind(reminder.is_scheduled)
        .bind(reminder.created)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        let raw = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()??;
        Reminder::try_from(raw).ok()
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        start_ts: i64,
        end_ts: i64,
    ) -> anyhow::Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.user_id = $1 AND
            r.next_execution >= $2 AND
            r.next_execution <= $3
            ORDER BY r.next_execution
            "#,
        )
        .bind(user_id)
        .bind(start_ts)
        .bind(end_ts)
        .fetch_all(&self.pool)
        .await?;
        into_reminders(rows)
    }

    async fn delete(&self, reminder_id: &ID) -> anyhow::Result<Option<Reminder>> {
        let raw = sqlx::query_as::<_, ReminderRaw>(
            r#"
            DELETE FROM reminders AS r
            WHERE r.reminder_uid = $1
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;
        raw.map(Reminder::try_from).transpose()
    }

    async fn set_scheduled(&self, reminder_ids: &[ID], is_scheduled: bool) -> anyhow::Result<()> {
        let ids = reminder_ids.iter().map(|id| *id.inner_ref()).collect::<Vec<_>>();
        sqlx::query(
            r#"
            UPDATE reminders
            SET is_scheduled = $2
            WHERE reminder_uid = ANY($1)
            "#,
        )
        .bind(&ids)
        .bind(is_scheduled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn claim_unscheduled(
        &self,
        start_ts: i64,
        end_ts: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<Reminder>> {
        // Locked rows are skipped so concurrent pollers split the due set
        // instead of waiting on each other
        let rows = sqlx::query_as::<_, ReminderRaw>(
            r#"
            UPDATE reminders
            SET is_scheduled = TRUE
            WHERE reminder_uid IN (
                SELECT r.reminder_uid FROM reminders AS r
                WHERE r.is_scheduled = FALSE AND
                r.next_execution >= $1 AND
                r.next_execution < $2
                ORDER BY r.next_execution
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(start_ts)
        .bind(end_ts)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        into_reminders(rows)
    }

    async fn reschedule(
        &self,
        reminder_id: &ID,
        expected_next_execution: i64,
        next_execution: i64,
        is_scheduled: bool,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reminders
            SET next_execution = $3, is_scheduled = $4
            WHERE reminder_uid = $1 AND next_execution = $2
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(expected_next_execution)
        .bind(next_execution)
        .bind(is_scheduled)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
