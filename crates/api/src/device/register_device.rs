use crate::{
    error::ReminderSchedulerError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use reminder_scheduler_api_structs::register_device::*;
use reminder_scheduler_infra::ReminderContext;

fn handle_error(e: UseCaseErrors) -> ReminderSchedulerError {
    match e {
        UseCaseErrors::EmptyToken => {
            ReminderSchedulerError::BadClientData("The device token must not be empty".into())
        }
        UseCaseErrors::StorageError => ReminderSchedulerError::InternalError,
    }
}

pub async fn register_device_controller(
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderSchedulerError> {
    let usecase = RegisterDeviceUseCase {
        user_id: path_params.user_id.clone(),
        token: body.0.token,
    };

    execute(usecase, &ctx)
        .await
        .map(|(user_id, token)| HttpResponse::Created().json(APIResponse { user_id, token }))
        .map_err(handle_error)
}

/// Adds a push token to the delivery targets of a user
#[derive(Debug)]
pub struct RegisterDeviceUseCase {
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseErrors {
    EmptyToken,
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for RegisterDeviceUseCase {
    type Response = (String, String);

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(UseCaseErrors::EmptyToken);
        }

        ctx.repos
            .delivery_targets
            .insert(&self.user_id, token)
            .await
            .map_err(|_| UseCaseErrors::StorageError)?;

        Ok((self.user_id.clone(), token.to_string()))
    }
}
