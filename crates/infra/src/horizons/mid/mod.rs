mod inmemory;
mod redis;

pub use self::redis::RedisMidHorizonStore;
pub use inmemory::InMemoryMidHorizonStore;
use reminder_scheduler_domain::{ReminderPayload, ID};

/// Shared sorted index of `Reminder`s due within the mid horizon, together
/// with the payloads needed to dispatch them and the cancellation
/// tombstones. Its clock is the one every scheduling decision is made with.
#[async_trait::async_trait]
pub trait IMidHorizonStore: Send + Sync {
    /// The shared clock in millis
    async fn now_millis(&self) -> anyhow::Result<i64>;
    /// Indexes the reminder at `due_at`, replacing an earlier entry of it.
    /// Refused with false while the reminder has a live tombstone.
    async fn insert(&self, payload: &ReminderPayload, due_at: i64) -> anyhow::Result<bool>;
    /// Atomically removes and returns up to `limit` index entries with a due
    /// time of at most `until`, ordered by due time. An entry is returned to
    /// exactly one caller. The payloads stay in the side table until
    /// `forget_payload` is called.
    async fn claim_due(
        &self,
        until: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<(ReminderPayload, i64)>>;
    /// Puts a claimed entry back with its original due time
    async fn restore(&self, payload: &ReminderPayload, due_at: i64) -> anyhow::Result<()>;
    /// Drops the payload of a claimed entry unless the reminder has been
    /// indexed again since
    async fn forget_payload(&self, reminder_id: &ID) -> anyhow::Result<()>;
    /// Atomically removes the index entry and its payload. Returns false
    /// when there was nothing to remove.
    async fn remove(&self, reminder_id: &ID) -> anyhow::Result<bool>;
    /// Marks the reminder as cancelled for `ttl` millis. A tombstone that
    /// already exists is left untouched. Returns whether one was created.
    async fn set_tombstone(&self, reminder_id: &ID, ttl: i64) -> anyhow::Result<bool>;
    /// Deletes the tombstone and returns whether there was one
    async fn take_tombstone(&self, reminder_id: &ID) -> anyhow::Result<bool>;
}
