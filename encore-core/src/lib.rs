pub mod clock;
pub mod hold;
pub mod hold_store;
pub mod repository;
pub mod availability;
pub mod reservation;
pub mod sweep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use hold::Hold;
pub use hold_store::HoldStore;
pub use repository::{InMemoryTicketRepository, IssuedTicket, TicketRepository};
pub use availability::{AvailabilityResolver, Partition};
pub use reservation::{ReservationOutcome, ReservationService};
pub use sweep::spawn_sweeper;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
