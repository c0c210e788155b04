use crate::scheduling::cancel_reminder::CancelReminderUseCase;
use crate::{
    error::ReminderSchedulerError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use reminder_scheduler_api_structs::delete_reminder::*;
use reminder_scheduler_domain::{Reminder, ID};
use reminder_scheduler_infra::ReminderContext;
use tracing::error;

fn handle_error(e: UseCaseErrors) -> ReminderSchedulerError {
    match e {
        UseCaseErrors::NotFound(reminder_id) => ReminderSchedulerError::NotFound(format!(
            "The reminder with id: {}, was not found.",
            reminder_id
        )),
        UseCaseErrors::StorageError => ReminderSchedulerError::InternalError,
    }
}

pub async fn delete_reminder_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderSchedulerError> {
    let usecase = DeleteReminderUseCase {
        user_id: path_params.user_id.clone(),
        reminder_id: path_params.reminder_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Ok().json(APIResponse::new(reminder)))
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct DeleteReminderUseCase {
    pub user_id: String,
    pub reminder_id: ID,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteReminderUseCase {
    type Response = Reminder;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) if reminder.user_id == self.user_id => {}
            _ => return Err(UseCaseErrors::NotFound(self.reminder_id.clone())),
        };

        // The row is gone first so a consumer racing with us can no longer
        // re-arm it. The flag of the deleted row is the one that counts.
        let reminder = ctx
            .repos
            .reminders
            .delete(&self.reminder_id)
            .await
            .map_err(|_| UseCaseErrors::StorageError)?
            .ok_or_else(|| UseCaseErrors::NotFound(self.reminder_id.clone()))?;

        if reminder.is_scheduled {
            let cancel = CancelReminderUseCase {
                reminder_id: reminder.id.clone(),
            };
            if execute(cancel, ctx).await.is_err() {
                error!(
                    "Reminder {} was deleted but its scheduled firing could not be withdrawn",
                    reminder.id
                );
            }
        }

        Ok(reminder)
    }
}
