use super::{Delivery, INearHorizonChannel};
use crate::system::ISys;
use reminder_scheduler_domain::{ReminderPayload, ID};
use std::sync::{Arc, Mutex};

struct Message {
    tag: String,
    payload: ReminderPayload,
    visible_at: i64,
}

pub struct InMemoryNearHorizonChannel {
    messages: Mutex<Vec<Message>>,
    sys: Arc<dyn ISys>,
    visibility_timeout: i64,
}

impl InMemoryNearHorizonChannel {
    pub fn new(sys: Arc<dyn ISys>, visibility_timeout: i64) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            sys,
            visibility_timeout,
        }
    }

    /// Number of messages not yet acknowledged
    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payloads of unacknowledged messages with the millis they become visible at
    pub fn pending(&self) -> Vec<(ReminderPayload, i64)> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| (m.payload.clone(), m.visible_at))
            .collect()
    }
}

#[async_trait::async_trait]
impl INearHorizonChannel for InMemoryNearHorizonChannel {
    async fn publish(&self, payload: &ReminderPayload, delay: i64) -> anyhow::Result<()> {
        let now = self.sys.get_timestamp_millis();
        self.messages.lock().unwrap().push(Message {
            tag: ID::default().as_string(),
            payload: payload.clone(),
            visible_at: now + std::cmp::max(delay, 0),
        });
        Ok(())
    }

    async fn receive(&self, max: usize) -> anyhow::Result<Vec<Delivery>> {
        let now = self.sys.get_timestamp_millis();
        let mut messages = self.messages.lock().unwrap();
        messages.sort_by_key(|m| m.visible_at);

        let mut deliveries = Vec::new();
        for message in messages.iter_mut() {
            if deliveries.len() == max || message.visible_at > now {
                break;
            }
            message.visible_at = now + self.visibility_timeout;
            deliveries.push(Delivery {
                tag: message.tag.clone(),
                payload: message.payload.clone(),
            });
        }
        Ok(deliveries)
    }

    async fn ack(&self, delivery: &Delivery) -> anyhow::Result<()> {
        self.messages
            .lock()
            .unwrap()
            .retain(|m| m.tag != delivery.tag);
        Ok(())
    }
}
