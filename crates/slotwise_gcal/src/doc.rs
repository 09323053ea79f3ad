// File: crates/slotwise_gcal/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::booking::BookingRequest;
use crate::handlers::{BookResponse, SlotsResponse};
use slotwise_common::models::{BookingRecord, TimeSlot};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::get_slots_handler,
        crate::handlers::book_handler,
    ),
    components(
        schemas(SlotsResponse, TimeSlot, BookingRequest, BookResponse, BookingRecord)
    ),
    tags(
        (name = "Booking", description = "Public slot listing and booking")
    )
)]
pub struct GcalApiDoc;
