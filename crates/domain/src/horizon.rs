/// Where a `Reminder` should live given how far away its due time is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    /// Hand to the delay capable channel with this exact delay in millis
    Near { delay: i64 },
    /// Buffer in the shared sorted index
    Mid,
    /// Leave it resting in the database until it gets closer
    Rest,
}

impl Horizon {
    /// Whether a `Reminder` placed here has a live transient entry
    pub fn is_scheduled(&self) -> bool {
        !matches!(self, Self::Rest)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HorizonPolicy {
    /// Longest delay the near horizon channel supports, in millis
    pub max_near_delay: i64,
    /// Farthest ahead anything is buffered in the mid horizon store, in millis
    pub max_mid_delay: i64,
}

impl HorizonPolicy {
    pub fn new(max_near_delay: i64, max_mid_delay: i64) -> Self {
        Self {
            max_near_delay,
            max_mid_delay,
        }
    }

    /// A negative delay means the due time already passed, e.g. after an
    /// outage, and is delivered right away.
    pub fn classify(&self, delay: i64) -> Horizon {
        let delay = std::cmp::max(delay, 0);
        if delay <= self.max_near_delay {
            Horizon::Near { delay }
        } else if delay <= self.max_mid_delay {
            Horizon::Mid
        } else {
            Horizon::Rest
        }
    }

    pub fn classify_due(&self, due_at: i64, now: i64) -> Horizon {
        self.classify(due_at - now)
    }
}
