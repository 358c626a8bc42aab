//! Appointment lookups offered to the patient during a follow-up call
//!
//! Not connected to a scheduling backend: availability and confirmation are
//! static answers. `AppointmentBook` is where a real calendar would plug in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Slots offered for any requested date
pub const AVAILABLE_TIMES: [&str; 3] = ["1pm", "2pm", "3pm"];

/// Acknowledgement returned for any confirmed appointment
pub const CONFIRMATION: &str = "reservation confirmed";

/// Simulated latency of the availability lookup
pub const DEFAULT_LOOKUP_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available_times: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentBook: Send + Sync {
    /// Open slots on the given date
    async fn availability(&self, date: &str) -> Availability;

    /// Book the slot and return the acknowledgement read back to the patient
    async fn confirm(&self, date: &str, time: &str) -> String;
}

/// Answers every request with the fixed slots and acknowledgement.
#[derive(Debug, Clone)]
pub struct StaticAppointmentBook {
    lookup_delay: Duration,
}

impl StaticAppointmentBook {
    pub fn new(lookup_delay: Duration) -> Self {
        Self { lookup_delay }
    }
}

impl Default for StaticAppointmentBook {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_DELAY)
    }
}

#[async_trait]
impl AppointmentBook for StaticAppointmentBook {
    async fn availability(&self, _date: &str) -> Availability {
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        Availability {
            available_times: AVAILABLE_TIMES.iter().map(|t| t.to_string()).collect(),
        }
    }

    async fn confirm(&self, _date: &str, _time: &str) -> String {
        CONFIRMATION.to_string()
    }
}
