use reminder_scheduler_domain::{Reminder, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDTO {
    pub id: ID,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub cron: String,
    pub timezone: String,
    pub is_recurring: bool,
    pub next_execution: i64,
    pub is_scheduled: bool,
    pub created: i64,
}

impl ReminderDTO {
    pub fn new(reminder: Reminder) -> Self {
        Self {
            id: reminder.id,
            cron: reminder.cron.as_str().to_string(),
            timezone: reminder.timezone.name().to_string(),
            user_id: reminder.user_id,
            title: reminder.title,
            description: reminder.description,
            is_recurring: reminder.is_recurring,
            next_execution: reminder.next_execution,
            is_scheduled: reminder.is_scheduled,
            created: reminder.created,
        }
    }
}
