mod base;
mod device;
mod reminder;
mod status;

pub(crate) use base::BaseClient;
pub use base::{APIError, APIResponse};
use device::DeviceClient;
use reminder::ReminderClient;
pub use reminder::{CreateReminderInput, GetRemindersInput};
use status::StatusClient;
use std::sync::Arc;

pub use reminder_scheduler_api_structs::dtos::ReminderDTO as Reminder;
pub use reminder_scheduler_domain::ID;

/// Reminder Scheduler Server SDK
///
/// The SDK contains methods for interacting with the Reminder Scheduler
/// server API.
#[derive(Clone)]
pub struct ReminderSDK {
    pub device: DeviceClient,
    pub reminder: ReminderClient,
    pub status: StatusClient,
}

impl ReminderSDK {
    /// `address` is the base url of the api, e.g. `http://localhost:5000/api/v1`
    pub fn new(address: String) -> Self {
        let base = Arc::new(BaseClient::new(address));

        Self {
            device: DeviceClient::new(base.clone()),
            reminder: ReminderClient::new(base.clone()),
            status: StatusClient::new(base),
        }
    }
}
