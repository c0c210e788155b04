use super::IMidHorizonStore;
use crate::system::ISys;
use reminder_scheduler_domain::{ReminderPayload, ID};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Default)]
struct MidHorizonState {
    /// Reminder id -> due time in millis
    index: HashMap<ID, i64>,
    /// The same entries ordered by due time
    queue: BTreeSet<(i64, ID)>,
    payloads: HashMap<ID, ReminderPayload>,
    /// Reminder id -> expiry in millis
    tombstones: HashMap<ID, i64>,
}

impl MidHorizonState {
    fn unindex(&mut self, reminder_id: &ID) -> bool {
        match self.index.remove(reminder_id) {
            Some(due_at) => {
                self.queue.remove(&(due_at, reminder_id.clone()));
                true
            }
            None => false,
        }
    }

    fn tombstoned(&self, reminder_id: &ID, now: i64) -> bool {
        matches!(self.tombstones.get(reminder_id), Some(expiry) if *expiry > now)
    }
}

/// Every operation runs under a single lock, which gives the same atomicity
/// the scripts give on Redis
pub struct InMemoryMidHorizonStore {
    state: Mutex<MidHorizonState>,
    sys: Arc<dyn ISys>,
}

impl InMemoryMidHorizonStore {
    pub fn new(sys: Arc<dyn ISys>) -> Self {
        Self {
            state: Mutex::new(Default::default()),
            sys,
        }
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, reminder_id: &ID) -> bool {
        self.state.lock().unwrap().index.contains_key(reminder_id)
    }

    pub fn has_tombstone(&self, reminder_id: &ID) -> bool {
        let now = self.sys.get_timestamp_millis();
        self.state.lock().unwrap().tombstoned(reminder_id, now)
    }

    /// Tombstones held in memory, expired ones included
    pub fn tombstone_count(&self) -> usize {
        self.state.lock().unwrap().tombstones.len()
    }
}

#[async_trait::async_trait]
impl IMidHorizonStore for InMemoryMidHorizonStore {
    async fn now_millis(&self) -> anyhow::Result<i64> {
        Ok(self.sys.get_timestamp_millis())
    }

    async fn insert(&self, payload: &ReminderPayload, due_at: i64) -> anyhow::Result<bool> {
        let now = self.sys.get_timestamp_millis();
        let mut state = self.state.lock().unwrap();
        if state.tombstoned(&payload.id, now) {
            return Ok(false);
        }
        state.unindex(&payload.id);
        state.index.insert(payload.id.clone(), due_at);
        state.queue.insert((due_at, payload.id.clone()));
        state.payloads.insert(payload.id.clone(), payload.clone());
        Ok(true)
    }

    async fn claim_due(
        &self,
        until: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<(ReminderPayload, i64)>> {
        let mut state = self.state.lock().unwrap();
        let due = state
            .queue
            .iter()
            .take_while(|(due_at, _)| *due_at <= until)
            .take(limit)
            .cloned()
            .collect::<Vec<_>>();

        let mut claimed = Vec::with_capacity(due.len());
        let mut dropped = 0;
        for (due_at, id) in due {
            state.unindex(&id);
            match state.payloads.get(&id) {
                Some(payload) => claimed.push((payload.clone(), due_at)),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!("Dropped {} mid horizon entries without a payload", dropped);
        }
        Ok(claimed)
    }

    async fn restore(&self, payload: &ReminderPayload, due_at: i64) -> anyhow::Result<()> {
        self.insert(payload, due_at).await.map(|_| ())
    }

    async fn forget_payload(&self, reminder_id: &ID) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.index.contains_key(reminder_id) {
            state.payloads.remove(reminder_id);
        }
        Ok(())
    }

    async fn remove(&self, reminder_id: &ID) -> anyhow::Result<bool> {
        let mut state = self.state.lock().unwrap();
        let removed = state.unindex(reminder_id);
        if removed {
            state.payloads.remove(reminder_id);
        }
        Ok(removed)
    }

    async fn set_tombstone(&self, reminder_id: &ID, ttl: i64) -> anyhow::Result<bool> {
        let now = self.sys.get_timestamp_millis();
        let mut state = self.state.lock().unwrap();
        if state.tombstoned(reminder_id, now) {
            return Ok(false);
        }
        state.tombstones.retain(|_, expiry| *expiry > now);
        state.tombstones.insert(reminder_id.clone(), now + ttl);
        Ok(true)
    }

    async fn take_tombstone(&self, reminder_id: &ID) -> anyhow::Result<bool> {
        let now = self.sys.get_timestamp_millis();
        let mut state = self.state.lock().unwrap();
        Ok(matches!(state.tombstones.remove(reminder_id), Some(expiry) if expiry > now))
    }
}
