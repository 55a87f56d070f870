//! Domain services for the RSVP service.
//!
//! Services contain business logic that operates on domain models.

pub mod aggregation;
pub mod gateway;
pub mod store;

pub use aggregation::{summarize, AggregationView};
pub use gateway::{ConfirmationGateway, SubmissionFailed, REQUIRED_FIELDS};
pub use store::{ConfirmationStore, InMemoryConfirmationStore, StoreError};
