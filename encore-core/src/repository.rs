use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// A ticket that has been issued (sold) against a table or seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTicket {
    pub ticket_id: String,
    pub event_id: String,
    pub resource_id: String,
}

/// Read access to persisted tickets.
///
/// Implementations own their retry policy. Callers in this crate treat any
/// error as "sold".
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_issued_ticket(
        &self,
        event_id: &str,
        resource_id: &str,
    ) -> Result<Option<IssuedTicket>, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, thiserror::Error)]
#[error("Ticket lookup unavailable")]
pub struct LookupUnavailable;

/// Ticket repository backed by a map, for tests and local runs.
///
/// `set_failing(true)` makes every lookup error, to exercise fail-closed paths.
#[derive(Debug, Default)]
pub struct InMemoryTicketRepository {
    tickets: RwLock<HashMap<(String, String), IssuedTicket>>,
    failing: AtomicBool,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, ticket_id: &str, event_id: &str, resource_id: &str) {
        let ticket = IssuedTicket {
            ticket_id: ticket_id.to_string(),
            event_id: event_id.to_string(),
            resource_id: resource_id.to_string(),
        };
        self.tickets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((event_id.to_string(), resource_id.to_string()), ticket);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn find_issued_ticket(
        &self,
        event_id: &str,
        resource_id: &str,
    ) -> Result<Option<IssuedTicket>, Box<dyn std::error::Error + Send + Sync>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Box::new(LookupUnavailable));
        }

        let tickets = self.tickets.read().unwrap_or_else(|e| e.into_inner());
        Ok(tickets.get(&(event_id.to_string(), resource_id.to_string())).cloned())
    }
}
