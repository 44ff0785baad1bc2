use crate::clock::{Clock, SystemClock};
use crate::hold::Hold;
use chrono::Duration;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// In-process map of held tables/seats.
///
/// Every read and write goes through one mutex, so the check-then-set in
/// [`HoldStore::claim`] is atomic: two different holders can never both win
/// the same live resource. Expired holds are treated as absent and evicted
/// whenever an operation observes them. Construct one per process and share
/// it behind an `Arc`.
pub struct HoldStore {
    holds: Mutex<HashMap<String, Hold>>,
    hold_duration: Duration,
    clock: Arc<dyn Clock>,
}

impl HoldStore {
    pub fn new(hold_duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            holds: Mutex::new(HashMap::new()),
            hold_duration,
            clock,
        }
    }

    pub fn with_system_clock(hold_duration: Duration) -> Self {
        Self::new(hold_duration, Arc::new(SystemClock))
    }

    /// True iff a live hold exists on `resource_id` owned by someone other
    /// than `requester_id`. With no requester, any live hold counts.
    pub fn is_held_by_other(&self, resource_id: &str, requester_id: Option<&str>) -> bool {
        let mut holds = self.lock();
        let now = self.clock.now();

        let Some(hold) = holds.get(resource_id) else {
            return false;
        };
        if hold.is_live(now) {
            return requester_id.map_or(true, |requester| !hold.is_held_by(requester));
        }

        holds.remove(resource_id);
        false
    }

    /// Try to take (or refresh) the hold on `resource_id`.
    ///
    /// Returns false only when a live hold by a different holder exists.
    /// A re-claim by the current holder restarts the hold window.
    pub fn claim(&self, resource_id: &str, holder_id: &str, event_id: &str) -> bool {
        let mut holds = self.lock();
        let now = self.clock.now();

        if let Some(existing) = holds.get(resource_id) {
            if existing.is_live(now) && !existing.is_held_by(holder_id) {
                debug!("Claim on {} by {} rejected, held by {}", resource_id, holder_id, existing.holder_id);
                return false;
            }
        }

        let hold = Hold::new(resource_id, holder_id, event_id, now, self.hold_duration);
        debug!("Hold on {} granted to {} until {}", resource_id, holder_id, hold.expires_at);
        holds.insert(resource_id.to_string(), hold);
        true
    }

    /// Resource IDs with a live hold for `event_id`, optionally skipping
    /// holds owned by `exclude_holder_id`.
    pub fn list_live_for_event(&self, event_id: &str, exclude_holder_id: Option<&str>) -> BTreeSet<String> {
        let mut holds = self.lock();
        let now = self.clock.now();
        holds.retain(|_, hold| hold.is_live(now));

        holds
            .values()
            .filter(|hold| hold.event_id == event_id)
            .filter(|hold| exclude_holder_id.map_or(true, |holder| !hold.is_held_by(holder)))
            .map(|hold| hold.resource_id.clone())
            .collect()
    }

    /// Drop the hold on `resource_id` if `holder_id` owns it and it is live.
    pub fn release(&self, resource_id: &str, holder_id: &str) -> bool {
        let mut holds = self.lock();
        let now = self.clock.now();

        let owned = match holds.get(resource_id) {
            Some(hold) if hold.is_live(now) => hold.is_held_by(holder_id),
            Some(_) => {
                holds.remove(resource_id);
                return false;
            }
            None => return false,
        };

        if owned {
            holds.remove(resource_id);
            debug!("Hold on {} released by {}", resource_id, holder_id);
        }
        owned
    }

    /// Live snapshot of the hold on `resource_id`
    pub fn get(&self, resource_id: &str) -> Option<Hold> {
        let mut holds = self.lock();
        let now = self.clock.now();

        let hold = holds.get(resource_id)?.clone();
        if hold.is_live(now) {
            return Some(hold);
        }

        holds.remove(resource_id);
        None
    }

    pub fn live_count(&self) -> usize {
        let now = self.clock.now();
        self.lock().values().filter(|hold| hold.is_live(now)).count()
    }

    /// Remove every expired hold. Returns the number evicted.
    pub fn sweep_expired(&self) -> usize {
        let mut holds = self.lock();
        let now = self.clock.now();
        let initial_count = holds.len();

        holds.retain(|_, hold| hold.is_live(now));

        initial_count - holds.len()
    }

    // Nothing in the map spans more than one insert/remove, so a panic while
    // holding the lock cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Hold>> {
        self.holds.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    fn raw_len(&self) -> usize {
        self.lock().len()
    }
}
