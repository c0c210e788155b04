use crate::{APIResponse, BaseClient};
use reminder_scheduler_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct DeviceClient {
    base: Arc<BaseClient>,
}

impl DeviceClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn register(
        &self,
        user_id: String,
        token: String,
    ) -> APIResponse<register_device::APIResponse> {
        self.base
            .post(
                register_device::RequestBody { token },
                format!("user/{}/devices", user_id),
                StatusCode::CREATED,
            )
            .await
    }
}
