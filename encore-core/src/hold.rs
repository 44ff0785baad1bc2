use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short-lived claim on one table or seat by one user for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hold {
    pub resource_id: String,
    pub holder_id: String,
    pub event_id: String, // Scoped queries only, conflicts key on resource_id
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    pub fn new(
        resource_id: &str,
        holder_id: &str,
        event_id: &str,
        acquired_at: DateTime<Utc>,
        duration: chrono::Duration,
    ) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            holder_id: holder_id.to_string(),
            event_id: event_id.to_string(),
            acquired_at,
            expires_at: acquired_at + duration,
        }
    }

    /// A hold whose expiry is at or before `now` is logically absent
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn is_held_by(&self, holder_id: &str) -> bool {
        self.holder_id == holder_id
    }
}
