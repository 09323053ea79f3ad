// --- File: crates/slotwise_gcal/src/routes.rs ---

use crate::handlers::{book_handler, get_slots_handler, health_handler, GcalState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing the public booking routes.
pub fn routes(state: Arc<GcalState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/{slug}/slots", get(get_slots_handler))
        .route("/{slug}/book", post(book_handler))
        .with_state(state)
}
