//! Domain layer for the RSVP backend.
//!
//! This crate contains:
//! - Domain models (invitations, the registration form, confirmations)
//! - Business logic services (submission gateway, dashboard aggregation)
//! - The confirmation store boundary and domain error types

pub mod models;
pub mod services;
