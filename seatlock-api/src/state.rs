use seatlock_store::SeatRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: SeatRegistry,
}

impl AppState {
    pub fn new(registry: SeatRegistry) -> Self {
        Self { registry }
    }
}
