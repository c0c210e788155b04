use crate::error::ReminderSchedulerError;
use crate::scheduling::dispatch_reminder::DispatchReminderUseCase;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use reminder_scheduler_api_structs::create_reminder::*;
use reminder_scheduler_domain::{
    parse_timezone, CronSchedule, InvalidCronError, InvalidTimezoneError, Reminder, ID,
};
use reminder_scheduler_infra::ReminderContext;
use tracing::warn;

const MAX_TITLE_LENGTH: usize = 128;
const MAX_DESCRIPTION_LENGTH: usize = 512;

pub async fn create_reminder_controller(
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderSchedulerError> {
    let body = body.0;
    let usecase = CreateReminderUseCase {
        user_id: path_params.user_id.clone(),
        title: body.title,
        description: body.description,
        cron: body.cron,
        timezone: body.timezone,
        is_recurring: body.is_recurring.unwrap_or(false),
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Created().json(APIResponse::new(reminder)))
        .map_err(ReminderSchedulerError::from)
}

#[derive(Debug)]
pub struct CreateReminderUseCase {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub cron: String,
    /// Falls back to the configured default timezone
    pub timezone: Option<String>,
    pub is_recurring: bool,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidTitle,
    InvalidDescription,
    InvalidCron(InvalidCronError),
    InvalidTimezone(InvalidTimezoneError),
    NoOccurrence(String),
    MidHorizonUnavailable,
    StorageError,
}

impl From<UseCaseError> for ReminderSchedulerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidTitle => Self::BadClientData(format!(
                "The title must be between 1 and {} characters",
                MAX_TITLE_LENGTH
            )),
            UseCaseError::InvalidDescription => Self::BadClientData(format!(
                "The description must be between 1 and {} characters",
                MAX_DESCRIPTION_LENGTH
            )),
            UseCaseError::InvalidCron(e) => Self::BadClientData(e.to_string()),
            UseCaseError::InvalidTimezone(e) => Self::BadClientData(e.to_string()),
            UseCaseError::NoOccurrence(cron) => Self::BadClientData(format!(
                "The cron expression: `{}` never fires in the future",
                cron
            )),
            UseCaseError::MidHorizonUnavailable | UseCaseError::StorageError => {
                Self::InternalError
            }
        }
    }
}

fn has_valid_length(text: &str, max: usize) -> bool {
    let length = text.chars().count();
    length >= 1 && length <= max
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateReminderUseCase {
    type Response = Reminder;

    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        if !has_valid_length(&self.title, MAX_TITLE_LENGTH) {
            return Err(UseCaseError::InvalidTitle);
        }
        if !has_valid_length(&self.description, MAX_DESCRIPTION_LENGTH) {
            return Err(UseCaseError::InvalidDescription);
        }
        let cron = self
            .cron
            .parse::<CronSchedule>()
            .map_err(UseCaseError::InvalidCron)?;
        let timezone = match &self.timezone {
            Some(timezone) => timezone,
            None => &ctx.config.default_timezone,
        };
        let timezone = parse_timezone(timezone).map_err(UseCaseError::InvalidTimezone)?;

        let now = ctx
            .horizons
            .mid
            .now_millis()
            .await
            .map_err(|_| UseCaseError::MidHorizonUnavailable)?;
        let next_execution = cron
            .next_fire_after_millis(&timezone, now)
            .ok_or_else(|| UseCaseError::NoOccurrence(self.cron.clone()))?;

        let mut reminder = Reminder {
            id: ID::default(),
            user_id: self.user_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            cron,
            timezone,
            is_recurring: self.is_recurring,
            next_execution,
            is_scheduled: ctx
                .config
                .horizon
                .policy()
                .classify_due(next_execution, now)
                .is_scheduled(),
            created: ctx.sys.get_timestamp_millis(),
        };

        ctx.repos
            .reminders
            .insert(&reminder)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let dispatch = DispatchReminderUseCase {
            payload: reminder.payload(),
            now,
        };
        if execute(dispatch, ctx).await.is_err() && reminder.is_scheduled {
            // Leave it resting so the cold store poller picks it up
            warn!(
                "Unable to dispatch reminder {}, leaving it to the cold store poller",
                reminder.id
            );
            reminder.is_scheduled = false;
            if let Err(e) = ctx
                .repos
                .reminders
                .set_scheduled(&[reminder.id.clone()], false)
                .await
            {
                tracing::error!("Unable to unflag reminder {}: {:?}", reminder.id, e);
            }
        }

        Ok(reminder)
    }
}
