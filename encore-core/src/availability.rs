use crate::hold_store::HoldStore;
use crate::repository::TicketRepository;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Candidate resources split by whether the requester may claim them now
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub available: Vec<String>,
    pub unavailable: Vec<String>,
}

/// Combines live holds with persisted sold-state.
///
/// Ticket lookups happen outside the hold store lock.
#[derive(Clone)]
pub struct AvailabilityResolver {
    holds: Arc<HoldStore>,
    tickets: Arc<dyn TicketRepository>,
}

impl AvailabilityResolver {
    pub fn new(holds: Arc<HoldStore>, tickets: Arc<dyn TicketRepository>) -> Self {
        Self { holds, tickets }
    }

    /// Classify each distinct resource, in first-seen order.
    ///
    /// Held by someone else, or sold, or lookup failed: unavailable.
    pub async fn partition(
        &self,
        resource_ids: &[String],
        event_id: &str,
        requester_id: Option<&str>,
    ) -> Partition {
        let mut partition = Partition::default();

        for resource_id in unique_in_order(resource_ids) {
            if self.holds.is_held_by_other(resource_id, requester_id)
                || self.is_sold(event_id, resource_id).await
            {
                partition.unavailable.push(resource_id.to_string());
            } else {
                partition.available.push(resource_id.to_string());
            }
        }

        partition
    }

    /// Whether a ticket has been issued for the resource. Lookup errors
    /// count as sold.
    pub async fn is_sold(&self, event_id: &str, resource_id: &str) -> bool {
        match self.tickets.find_issued_ticket(event_id, resource_id).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!("Ticket lookup for {}/{} failed, treating as sold: {}", event_id, resource_id, e);
                true
            }
        }
    }
}

pub(crate) fn unique_in_order(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}
