//! Timestamped event envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payload stamped with its creation time (milliseconds since epoch).
///
/// Created once, when the payload enters a [`Bloc`](crate::Bloc); never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<T> {
    timestamp: i64,
    payload: T,
}

impl<T> Event<T> {
    pub fn new(payload: T) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            payload,
        }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp
    }

    /// Creation time as a UTC datetime.
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}
