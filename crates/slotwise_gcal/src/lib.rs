// --- File: crates/slotwise_gcal/src/lib.rs ---
// Declare modules within this crate
pub mod booking;
#[cfg(test)]
mod booking_test;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod oauth;
pub mod routes;
pub mod service;
pub mod timezone;
pub mod vault;
#[cfg(test)]
mod vault_test;

pub use booking::{BookingEngine, BookingRequest, BookingState};
pub use error::BookingError;
