pub mod cancel_reminder;
pub mod consume_near_horizon;
pub mod deliver_reminder;
pub mod dispatch_reminder;
pub mod poll_cold_store;
pub mod promote_mid_horizon;

#[cfg(test)]
mod scenarios;
