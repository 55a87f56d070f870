//! Domain models for the RSVP service.

pub mod confirmation;
pub mod dashboard;
pub mod invitation;
pub mod registration;

pub use confirmation::{
    AttendanceAnswer, AttendanceValue, ConfirmationPayload, ConfirmationRecord, RequiredField,
    StoredConfirmation,
};
pub use dashboard::DashboardSummary;
pub use invitation::{resolve, InvitationKind, ResolvedInvitation};
pub use registration::{FormField, FormInvalid, FormView, RegistrationForm};
