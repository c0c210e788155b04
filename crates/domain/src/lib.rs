mod horizon;
mod reminder;
mod shared;

pub use chrono_tz::Tz;
pub use horizon::{Horizon, HorizonPolicy};
pub use reminder::{Reminder, ReminderPayload};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use shared::recurrence::{
    parse_timezone, CronSchedule, InvalidCronError, InvalidTimezoneError,
};
