use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use reminder_scheduler_domain::{Reminder, ID};
use std::sync::Mutex;

pub struct InMemoryReminderRepo {
    reminders: Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        start_ts: i64,
        end_ts: i64,
    ) -> anyhow::Result<Vec<Reminder>> {
        let mut reminders = find_by(&self.reminders, |r| {
            r.user_id == user_id && r.next_execution >= start_ts && r.next_execution <= end_ts
        });
        reminders.sort_by_key(|r| r.next_execution);
        Ok(reminders)
    }

    async fn delete(&self, reminder_id: &ID) -> anyhow::Result<Option<Reminder>> {
        Ok(delete(reminder_id, &self.reminders))
    }

    async fn set_scheduled(&self, reminder_ids: &[ID], is_scheduled: bool) -> anyhow::Result<()> {
        update_many(
            &self.reminders,
            |r| reminder_ids.contains(&r.id),
            |r| r.is_scheduled = is_scheduled,
        );
        Ok(())
    }

    async fn claim_unscheduled(
        &self,
        start_ts: i64,
        end_ts: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<Reminder>> {
        // Select and flag under the same lock
        let mut reminders = self.reminders.lock().unwrap();
        let mut candidates = reminders
            .iter_mut()
            .filter(|r| !r.is_scheduled && r.next_execution >= start_ts && r.next_execution < end_ts)
            .collect::<Vec<_>>();
        candidates.sort_by_key(|r| r.next_execution);

        let claimed = candidates
            .into_iter()
            .take(limit)
            .map(|r| {
                r.is_scheduled = true;
                r.clone()
            })
            .collect();
        Ok(claimed)
    }

    async fn reschedule(
        &self,
        reminder_id: &ID,
        expected_next_execution: i64,
        next_execution: i64,
        is_scheduled: bool,
    ) -> anyhow::Result<bool> {
        let updated = update_many(
            &self.reminders,
            |r| r.id == *reminder_id && r.next_execution == expected_next_execution,
            |r| {
                r.next_execution = next_execution;
                r.is_scheduled = is_scheduled;
            },
        );
        Ok(!updated.is_empty())
    }
}
