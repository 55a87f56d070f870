//! Shared utilities for the RSVP backend.
//!
//! This crate provides the field validators shared by the registration form
//! engine and the submission gateway.

pub mod validation;
