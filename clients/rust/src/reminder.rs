use crate::{APIResponse, BaseClient, ID};
use reminder_scheduler_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReminderClient {
    base: Arc<BaseClient>,
}

pub struct CreateReminderInput {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub cron: String,
    pub timezone: Option<String>,
    pub is_recurring: Option<bool>,
}

pub struct GetRemindersInput {
    pub user_id: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

impl ReminderClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(
        &self,
        input: CreateReminderInput,
    ) -> APIResponse<create_reminder::APIResponse> {
        let body = create_reminder::RequestBody {
            title: input.title,
            description: input.description,
            cron: input.cron,
            timezone: input.timezone,
            is_recurring: input.is_recurring,
        };
        self.base
            .post(
                body,
                format!("user/{}/reminders", input.user_id),
                StatusCode::CREATED,
            )
            .await
    }

    pub async fn get(
        &self,
        user_id: String,
        reminder_id: ID,
    ) -> APIResponse<get_reminder::APIResponse> {
        self.base
            .get(
                format!("user/{}/reminders/{}", user_id, reminder_id),
                StatusCode::OK,
            )
            .await
    }

    pub async fn get_many(
        &self,
        input: GetRemindersInput,
    ) -> APIResponse<get_reminders::APIResponse> {
        let mut query = Vec::new();
        if let Some(start_ts) = input.start_ts {
            query.push(format!("startTs={}", start_ts));
        }
        if let Some(end_ts) = input.end_ts {
            query.push(format!("endTs={}", end_ts));
        }
        let mut path = format!("user/{}/reminders", input.user_id);
        if !query.is_empty() {
            path = format!("{}?{}", path, query.join("&"));
        }
        self.base.get(path, StatusCode::OK).await
    }

    pub async fn delete(
        &self,
        user_id: String,
        reminder_id: ID,
    ) -> APIResponse<delete_reminder::APIResponse> {
        self.base
            .delete(
                format!("user/{}/reminders/{}", user_id, reminder_id),
                StatusCode::OK,
            )
            .await
    }
}
