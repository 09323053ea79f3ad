// File: crates/slotwise_gcal/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use slotwise_common::models::{BookingRecord, TimeSlot};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::booking::{BookingEngine, BookingRequest};
use crate::error::BookingError;

// Define shared state needed by the booking handlers
#[derive(Clone)]
pub struct GcalState {
    pub engine: Arc<BookingEngine>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SlotsQuery {
    /// Civil date in the tenant's timezone, YYYY-MM-DD
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2025-03-12"))]
    pub date: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SlotsResponse {
    pub date: String,
    pub timezone: String,
    pub slots: Vec<TimeSlot>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub success: bool,
    pub event_id: String,
    pub booking: BookingRecord,
}

fn log_failure(slug: &str, err: &BookingError) {
    if err.is_client_error() {
        warn!(slug, error = %err, "Request rejected");
    } else {
        error!(slug, error = %err, "Request failed");
    }
}

/// Liveness probe.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Handler listing the slots of one day for a tenant page.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/{slug}/slots",
    params(("slug" = String, Path, description = "Public page slug"), SlotsQuery),
    responses(
        (status = 200, description = "Slots of the day", body = SlotsResponse),
        (status = 400, description = "Invalid date"),
        (status = 404, description = "Unknown page"),
        (status = 502, description = "Calendar unavailable"),
        (status = 503, description = "Calendar must be reconnected")
    ),
    tag = "Booking"
))]
pub async fn get_slots_handler(
    State(state): State<Arc<GcalState>>,
    Path(slug): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, BookingError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d").map_err(|_| {
        BookingError::Validation("date must be formatted as YYYY-MM-DD".to_string())
    })?;

    let result = async {
        let settings = state.engine.tenant_by_slug(&slug).await?;
        let slots = state
            .engine
            .slots_for_date(&settings, date, Utc::now())
            .await?;
        Ok::<_, BookingError>(SlotsResponse {
            date: date.to_string(),
            timezone: settings.timezone,
            slots,
        })
    }
    .await;

    result.map(Json).inspect_err(|e| log_failure(&slug, e))
}

/// Handler running the booking transaction for a tenant page.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/{slug}/book",
    params(("slug" = String, Path, description = "Public page slug")),
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Booking confirmed", body = BookResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 404, description = "Unknown page"),
        (status = 409, description = "Slot no longer available"),
        (status = 422, description = "Start time is in the past"),
        (status = 502, description = "Calendar unavailable"),
        (status = 503, description = "Calendar must be reconnected")
    ),
    tag = "Booking"
))]
pub async fn book_handler(
    State(state): State<Arc<GcalState>>,
    Path(slug): Path<String>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<BookResponse>, BookingError> {
    let settings = state
        .engine
        .tenant_by_slug(&slug)
        .await
        .inspect_err(|e| log_failure(&slug, e))?;

    // the engine logs its own failures with the transaction state
    let outcome = state.engine.book(&settings, request, Utc::now()).await?;
    info!(slug, event_id = %outcome.event_id, "Booked");

    Ok(Json(BookResponse {
        success: true,
        event_id: outcome.event_id,
        booking: outcome.record,
    }))
}
