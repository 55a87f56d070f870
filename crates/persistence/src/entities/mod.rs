//! Database entity definitions.

pub mod confirmation;

pub use confirmation::ConfirmationEntity;
