use super::{IPushSender, PushNotification, PushReport};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MulticastRequest<'a> {
    tokens: &'a [String],
    notification: MulticastNotification<'a>,
    data: &'a std::collections::HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MulticastNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MulticastResponse {
    /// One entry per token in request order
    responses: Vec<SendResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    success: bool,
}

/// Multicast push gateway reached over HTTP
pub struct PushGatewayApi {
    client: Client,
    base_url: String,
}

impl PushGatewayApi {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

/// Targets without a response entry are kept, nothing is known about them
fn failed_targets(targets: &[String], res: &MulticastResponse) -> Vec<String> {
    if res.responses.len() != targets.len() {
        warn!(
            "Push gateway answered {} of {} targets",
            res.responses.len(),
            targets.len()
        );
    }
    targets
        .iter()
        .zip(res.responses.iter())
        .filter(|(_, response)| !response.success)
        .map(|(target, _)| target.clone())
        .collect()
}

#[async_trait::async_trait]
impl IPushSender for PushGatewayApi {
    async fn send(
        &self,
        targets: &[String],
        notification: &PushNotification,
    ) -> anyhow::Result<PushReport> {
        let body = MulticastRequest {
            tokens: targets,
            notification: MulticastNotification {
                title: &notification.title,
                body: &notification.body,
            },
            data: &notification.data,
        };
        let res = match self
            .client
            .post(&format!("{}/send", self.base_url))
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res.error_for_status()?,
            Err(e) => {
                error!(
                    "[Network Error] Push gateway POST error. Error message: {:?}",
                    e
                );
                return Err(anyhow::Error::new(e));
            }
        };
        let res = res.json::<MulticastResponse>().await.map_err(|e| {
            error!(
                "[Unexpected Response] Push gateway POST error. Error message: {:?}",
                e
            );
            anyhow::Error::new(e)
        })?;

        Ok(PushReport {
            failed_targets: failed_targets(targets, &res),
        })
    }
}
