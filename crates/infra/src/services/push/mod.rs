mod gateway;
mod inmemory;
mod logging;

pub use gateway::PushGatewayApi;
pub use inmemory::InMemoryPushSender;
pub use logging::LoggingPushSender;
use reminder_scheduler_domain::ReminderPayload;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

impl From<&ReminderPayload> for PushNotification {
    fn from(payload: &ReminderPayload) -> Self {
        Self {
            title: payload.title.clone(),
            body: payload.description.clone(),
            data: payload.data(),
        }
    }
}

/// Outcome of a multicast send
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushReport {
    /// Targets the transport rejected. They should not be used again.
    pub failed_targets: Vec<String>,
}

#[async_trait::async_trait]
pub trait IPushSender: Send + Sync {
    /// Sends one notification to every target. An `Err` means the transport
    /// as a whole failed and nothing is known about individual targets.
    async fn send(
        &self,
        targets: &[String],
        notification: &PushNotification,
    ) -> anyhow::Result<PushReport>;
}
