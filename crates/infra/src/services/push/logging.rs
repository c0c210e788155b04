use super::{IPushSender, PushNotification, PushReport};
use tracing::info;

/// Used when no push gateway is configured. Every send is logged and
/// reported as delivered, nothing is kept.
pub struct LoggingPushSender;

#[async_trait::async_trait]
impl IPushSender for LoggingPushSender {
    async fn send(
        &self,
        targets: &[String],
        notification: &PushNotification,
    ) -> anyhow::Result<PushReport> {
        info!(
            "Push notification without a gateway: {} to {} targets",
            notification.title,
            targets.len()
        );
        Ok(PushReport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_every_target_as_delivered() {
        let notification = PushNotification {
            title: "Stretch".into(),
            body: "Ten minutes".into(),
            data: Default::default(),
        };
        let targets = vec!["a".to_string(), "b".to_string()];
        let report = LoggingPushSender.send(&targets, &notification).await.unwrap();
        assert!(report.failed_targets.is_empty());
    }
}
