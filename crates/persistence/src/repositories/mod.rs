//! Repository implementations for database operations.

pub mod confirmation;

pub use confirmation::{ConfirmationRepository, PgConfirmationStore, CHANGE_CHANNEL};
