use crate::availability::{unique_in_order, AvailabilityResolver, Partition};
use crate::hold_store::HoldStore;
use crate::repository::TicketRepository;
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Result of a batch reservation. Partial success is normal and is not
/// rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationOutcome {
    pub reserved: Vec<String>,
    pub conflicts: Vec<String>,
}

impl ReservationOutcome {
    pub fn is_complete(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Entry point for the HTTP layer: availability checks, batch reservation,
/// listing and release over one shared [`HoldStore`].
#[derive(Clone)]
pub struct ReservationService {
    holds: Arc<HoldStore>,
    resolver: AvailabilityResolver,
    max_batch_size: usize,
}

impl ReservationService {
    pub fn new(holds: Arc<HoldStore>, tickets: Arc<dyn TicketRepository>) -> Self {
        let resolver = AvailabilityResolver::new(holds.clone(), tickets);
        Self {
            holds,
            resolver,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn holds(&self) -> &Arc<HoldStore> {
        &self.holds
    }

    pub async fn check_availability(
        &self,
        table_ids: &[String],
        event_id: &str,
        user_id: Option<&str>,
    ) -> CoreResult<Partition> {
        self.validate_batch(table_ids)?;
        require("eventId", event_id)?;
        if let Some(user_id) = user_id {
            require("userId", user_id)?;
        }

        Ok(self.resolver.partition(table_ids, event_id, user_id).await)
    }

    /// Claim every table in input order, re-checking sold-state first.
    ///
    /// Sold tables and tables held by another user land in `conflicts`.
    /// Tables already reserved in this call stay reserved regardless.
    pub async fn reserve(
        &self,
        table_ids: &[String],
        user_id: &str,
        event_id: &str,
    ) -> CoreResult<ReservationOutcome> {
        self.validate_batch(table_ids)?;
        require("userId", user_id)?;
        require("eventId", event_id)?;

        let mut outcome = ReservationOutcome::default();

        for table_id in unique_in_order(table_ids) {
            // Lookup stays outside the store lock; a sale completing between
            // here and the claim is caught by ticket issuance at commit.
            if self.resolver.is_sold(event_id, table_id).await {
                outcome.conflicts.push(table_id.to_string());
                continue;
            }

            if self.holds.claim(table_id, user_id, event_id) {
                outcome.reserved.push(table_id.to_string());
            } else {
                outcome.conflicts.push(table_id.to_string());
            }
        }

        if outcome.is_complete() {
            info!("User {} reserved {} table(s) for event {}", user_id, outcome.reserved.len(), event_id);
        } else {
            info!(
                "User {} reserved {} table(s) for event {} with {} conflict(s)",
                user_id,
                outcome.reserved.len(),
                event_id,
                outcome.conflicts.len()
            );
        }

        Ok(outcome)
    }

    /// Tables held for `event_id` by anyone other than `user_id`
    pub fn list_reserved_for_event(&self, event_id: &str, user_id: Option<&str>) -> CoreResult<Vec<String>> {
        require("eventId", event_id)?;
        if let Some(user_id) = user_id {
            require("userId", user_id)?;
        }

        Ok(self.holds.list_live_for_event(event_id, user_id).into_iter().collect())
    }

    /// Release the caller's own holds. Returns the tables actually released.
    pub fn release(&self, table_ids: &[String], user_id: &str) -> CoreResult<Vec<String>> {
        self.validate_batch(table_ids)?;
        require("userId", user_id)?;

        let released: Vec<String> = unique_in_order(table_ids)
            .into_iter()
            .filter(|table_id| self.holds.release(table_id, user_id))
            .map(str::to_string)
            .collect();

        debug!("User {} released {:?}", user_id, released);
        Ok(released)
    }

    fn validate_batch(&self, table_ids: &[String]) -> CoreResult<()> {
        if table_ids.is_empty() {
            return Err(CoreError::ValidationError("tableIds must not be empty".to_string()));
        }
        if table_ids.len() > self.max_batch_size {
            return Err(CoreError::ValidationError(format!(
                "tableIds exceeds batch limit: {} > {}",
                table_ids.len(),
                self.max_batch_size
            )));
        }
        for table_id in table_ids {
            require("tableIds", table_id)?;
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{} must not be blank", field)));
    }
    Ok(())
}
