use std::sync::Arc;
use encore_core::ReservationService;

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationService>,
}

impl AppState {
    pub fn new(reservations: ReservationService) -> Self {
        Self {
            reservations: Arc::new(reservations),
        }
    }
}
