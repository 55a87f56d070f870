//! Persistence layer for the RSVP backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - The PostgreSQL confirmation store

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

/// Embedded SQL migrations for the confirmations schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./src/migrations");
