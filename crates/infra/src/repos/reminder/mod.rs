mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;
use reminder_scheduler_domain::{Reminder, ID};

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    /// Reminders of the user with `next_execution` in `[start_ts, end_ts]`
    /// ordered by `next_execution`
    async fn find_by_user(
        &self,
        user_id: &str,
        start_ts: i64,
        end_ts: i64,
    ) -> anyhow::Result<Vec<Reminder>>;
    async fn delete(&self, reminder_id: &ID) -> anyhow::Result<Option<Reminder>>;
    async fn set_scheduled(&self, reminder_ids: &[ID], is_scheduled: bool) -> anyhow::Result<()>;
    /// Atomically flags and returns at most `limit` unscheduled reminders with
    /// `next_execution` in `[start_ts, end_ts)`. Concurrent callers never
    /// receive the same reminder.
    async fn claim_unscheduled(
        &self,
        start_ts: i64,
        end_ts: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<Reminder>>;
    /// Moves `next_execution` from `expected_next_execution` to
    /// `next_execution`. Returns false when the reminder is gone or has
    /// already been moved.
    async fn reschedule(
        &self,
        reminder_id: &ID,
        expected_next_execution: i64,
        next_execution: i64,
        is_scheduled: bool,
    ) -> anyhow::Result<bool>;
}
