use super::{IPushSender, PushNotification, PushReport};
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::info;

/// Records every send instead of reaching a real device. Targets added
/// with `reject_target` are reported as failed.
pub struct InMemoryPushSender {
    sent: Mutex<Vec<(Vec<String>, PushNotification)>>,
    rejected: Mutex<HashSet<String>>,
    unavailable: Mutex<bool>,
}

impl InMemoryPushSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            rejected: Mutex::new(HashSet::new()),
            unavailable: Mutex::new(false),
        }
    }

    pub fn reject_target(&self, target: &str) {
        self.rejected.lock().unwrap().insert(target.to_string());
    }

    /// Makes every send fail as a transport error
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn sent(&self) -> Vec<(Vec<String>, PushNotification)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for InMemoryPushSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IPushSender for InMemoryPushSender {
    async fn send(
        &self,
        targets: &[String],
        notification: &PushNotification,
    ) -> anyhow::Result<PushReport> {
        if *self.unavailable.lock().unwrap() {
            return Err(anyhow::anyhow!("Push transport unavailable"));
        }
        info!(
            "Push notification: {} to {} targets",
            notification.title,
            targets.len()
        );
        self.sent
            .lock()
            .unwrap()
            .push((targets.to_vec(), notification.clone()));

        let rejected = self.rejected.lock().unwrap();
        Ok(PushReport {
            failed_targets: targets
                .iter()
                .filter(|t| rejected.contains(*t))
                .cloned()
                .collect(),
        })
    }
}
