use crate::shared::{entity::Entity, entity::ID, recurrence::CronSchedule};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A `Reminder` is a notification the owning user should receive every time
/// its cron expression fires (or only the first time when it is not recurring).
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    /// The user that owns this `Reminder` and receives the notifications
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub cron: CronSchedule,
    /// Timezone the cron expression is evaluated in
    pub timezone: Tz,
    pub is_recurring: bool,
    /// Timestamp in millis of the next time this `Reminder` is due.
    /// This is the source of truth and is moved forward after every firing.
    pub next_execution: i64,
    /// True when the `Reminder` has a live entry in the mid horizon store or
    /// is in flight in the near horizon channel. False when it is only
    /// resting in the database.
    pub is_scheduled: bool,
    pub created: i64,
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl Reminder {
    /// The denormalized snapshot that travels through the horizons
    pub fn payload(&self) -> ReminderPayload {
        ReminderPayload {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            cron: self.cron.clone(),
            timezone: self.timezone,
            is_recurring: self.is_recurring,
            due_at: self.next_execution,
        }
    }
}

/// Everything needed to deliver and re-arm a `Reminder` without reading it
/// back from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub id: ID,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub cron: CronSchedule,
    pub timezone: Tz,
    pub is_recurring: bool,
    /// The `next_execution` this payload was dispatched for
    pub due_at: i64,
}

impl ReminderPayload {
    pub fn rearmed(&self, due_at: i64) -> Self {
        Self {
            due_at,
            ..self.clone()
        }
    }

    /// Extra key values attached to the push notification
    pub fn data(&self) -> HashMap<String, String> {
        let mut data = HashMap::new();
        data.insert("reminderId".to_string(), self.id.as_string());
        data.insert("userId".to_string(), self.user_id.clone());
        data.insert("title".to_string(), self.title.clone());
        data
    }
}
