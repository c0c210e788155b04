use crate::{
    error::ReminderSchedulerError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use reminder_scheduler_api_structs::get_reminder::*;
use reminder_scheduler_domain::{Reminder, ID};
use reminder_scheduler_infra::ReminderContext;

fn handle_error(e: UseCaseErrors) -> ReminderSchedulerError {
    match e {
        UseCaseErrors::NotFound(reminder_id) => ReminderSchedulerError::NotFound(format!(
            "The reminder with id: {}, was not found.",
            reminder_id
        )),
    }
}

pub async fn get_reminder_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderSchedulerError> {
    let usecase = GetReminderUseCase {
        user_id: path_params.user_id.clone(),
        reminder_id: path_params.reminder_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Ok().json(APIResponse::new(reminder)))
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct GetReminderUseCase {
    pub user_id: String,
    pub reminder_id: ID,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    NotFound(ID),
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetReminderUseCase {
    type Response = Reminder;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) if reminder.user_id == self.user_id => Ok(reminder),
            _ => Err(UseCaseErrors::NotFound(self.reminder_id.clone())),
        }
    }
}
