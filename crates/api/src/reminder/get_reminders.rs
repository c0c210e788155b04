use crate::{
    error::ReminderSchedulerError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use reminder_scheduler_api_structs::get_reminders::*;
use reminder_scheduler_domain::Reminder;
use reminder_scheduler_infra::ReminderContext;

fn handle_error(e: UseCaseErrors) -> ReminderSchedulerError {
    match e {
        UseCaseErrors::InvalidTimespan => ReminderSchedulerError::BadClientData(
            "The provided start_ts must not be greater than end_ts".into(),
        ),
        UseCaseErrors::StorageError => ReminderSchedulerError::InternalError,
    }
}

pub async fn get_reminders_controller(
    path_params: web::Path<PathParams>,
    query_params: web::Query<QueryParams>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderSchedulerError> {
    let usecase = GetRemindersUseCase {
        user_id: path_params.user_id.clone(),
        start_ts: query_params.start_ts,
        end_ts: query_params.end_ts,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminders| HttpResponse::Ok().json(APIResponse::new(reminders)))
        .map_err(handle_error)
}

/// Lists the `Reminder`s of a user whose `next_execution` is within the
/// inclusive window, ordered by `next_execution`. Missing bounds are open.
#[derive(Debug)]
pub struct GetRemindersUseCase {
    pub user_id: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseErrors {
    InvalidTimespan,
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetRemindersUseCase {
    type Response = Vec<Reminder>;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let start_ts = self.start_ts.unwrap_or(0);
        let end_ts = self.end_ts.unwrap_or(i64::MAX);
        if start_ts > end_ts {
            return Err(UseCaseErrors::InvalidTimespan);
        }

        ctx.repos
            .reminders
            .find_by_user(&self.user_id, start_ts, end_ts)
            .await
            .map_err(|_| UseCaseErrors::StorageError)
    }
}
