//! Registration form state and its conditional validation rules.
//!
//! The form is rebuilt for every visit. Resolving the invitation code decides
//! which attendance field is mandatory, and a listener on that field keeps the
//! two-day attendance requirement in sync with the answer.

use std::collections::BTreeMap;

use serde::Serialize;
use shared::validation::{validate_not_blank, validate_phone};
use thiserror::Error;

use super::confirmation::{ConfirmationPayload, ANSWER_NO};
use super::invitation::{InvitationKind, ResolvedInvitation};

/// Every control on the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    Phone,
    SeafoodPreference,
    Attending,
    CompanionAttending,
    TwoDayAttendance,
    InvitationCode,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Name,
        FormField::Phone,
        FormField::SeafoodPreference,
        FormField::Attending,
        FormField::CompanionAttending,
        FormField::TwoDayAttendance,
        FormField::InvitationCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Phone => "phone",
            FormField::SeafoodPreference => "seafoodPreference",
            FormField::Attending => "attending",
            FormField::CompanionAttending => "companionAttending",
            FormField::TwoDayAttendance => "twoDayAttendance",
            FormField::InvitationCode => "invitationCode",
        }
    }

    /// The attendance field that is mandatory for an invitation kind.
    pub fn active_attendance(kind: InvitationKind) -> FormField {
        match kind {
            InvitationKind::Couple => FormField::CompanionAttending,
            InvitationKind::Individual | InvitationKind::Undefined => FormField::Attending,
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Validator {
    Required,
    Phone,
}

impl Validator {
    fn check(&self, value: &str) -> bool {
        match self {
            Validator::Required => validate_not_blank(value).is_ok(),
            // Pattern validators let empty values through; Required covers those.
            Validator::Phone => value.is_empty() || validate_phone(value).is_ok(),
        }
    }
}

/// A single form control: its value, active validators and UI flags.
#[derive(Debug, Clone)]
pub struct FieldControl {
    value: String,
    validators: Vec<Validator>,
    valid: bool,
    touched: bool,
}

impl FieldControl {
    fn new(validators: Vec<Validator>) -> Self {
        let mut control = Self {
            value: String::new(),
            validators,
            valid: true,
            touched: false,
        };
        control.update_validity();
        control
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_required(&self) -> bool {
        self.validators.contains(&Validator::Required)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    fn set_validators(&mut self, validators: Vec<Validator>) {
        self.validators = validators;
    }

    fn clear_validators(&mut self) {
        self.validators.clear();
    }

    fn update_validity(&mut self) {
        self.valid = self.validators.iter().all(|v| v.check(&self.value));
    }

    fn reset(&mut self) {
        self.value.clear();
        self.touched = false;
        self.update_validity();
    }

    fn mark_as_touched(&mut self) {
        self.touched = true;
    }
}

/// Instruction returned by a field listener and applied by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Clear the control's value.
    Reset(FormField),
    /// Make the control mandatory.
    Require(FormField),
    /// Drop every validator from the control.
    Release(FormField),
}

impl ControlCommand {
    fn field(&self) -> FormField {
        match *self {
            ControlCommand::Reset(f) | ControlCommand::Require(f) | ControlCommand::Release(f) => f,
        }
    }
}

/// Callback invoked with the new value of the field it is registered on.
pub type FieldListener = Box<dyn Fn(&str) -> Vec<ControlCommand> + Send + Sync>;

/// Handle returned by [`ValueChanges::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Subject that fans value changes of a field out to its listeners.
#[derive(Default)]
pub struct ValueChanges {
    next_id: u64,
    listeners: Vec<(SubscriptionId, FormField, FieldListener)>,
}

impl ValueChanges {
    pub fn subscribe(&mut self, field: FormField, listener: FieldListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, field, listener));
        id
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn is_observed(&self, field: FormField) -> bool {
        self.listeners.iter().any(|(_, f, _)| *f == field)
    }

    /// Notifies every listener of `field` and collects their commands in order.
    pub fn emit(&self, field: FormField, value: &str) -> Vec<ControlCommand> {
        self.listeners
            .iter()
            .filter(|(_, f, _)| *f == field)
            .flat_map(|(_, _, listener)| listener(value))
            .collect()
    }
}

impl std::fmt::Debug for ValueChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<FormField> = self.listeners.iter().map(|(_, field, _)| *field).collect();
        f.debug_struct("ValueChanges")
            .field("next_id", &self.next_id)
            .field("observed", &fields)
            .finish()
    }
}

/// Two-day attendance follows the active attendance answer: a "no" releases
/// it, anything else makes it mandatory. Either way the previous choice is cleared.
fn two_day_attendance_rule(answer: &str) -> Vec<ControlCommand> {
    if answer == ANSWER_NO {
        vec![
            ControlCommand::Reset(FormField::TwoDayAttendance),
            ControlCommand::Release(FormField::TwoDayAttendance),
        ]
    } else {
        vec![
            ControlCommand::Reset(FormField::TwoDayAttendance),
            ControlCommand::Require(FormField::TwoDayAttendance),
        ]
    }
}

/// Submission blocked by local validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} form field(s) failed validation", .invalid.len())]
pub struct FormInvalid {
    pub invalid: Vec<FormField>,
}

/// Mutable draft of a registration.
#[derive(Debug)]
pub struct RegistrationForm {
    controls: BTreeMap<FormField, FieldControl>,
    invitation: ResolvedInvitation,
    value_changes: ValueChanges,
    attendance_subscription: Option<SubscriptionId>,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationForm {
    /// Builds an empty form. Only the identity fields are mandatory until an
    /// invitation is applied.
    pub fn new() -> Self {
        let controls = FormField::ALL
            .iter()
            .map(|&field| {
                let validators = match field {
                    FormField::Name | FormField::SeafoodPreference => vec![Validator::Required],
                    FormField::Phone => vec![Validator::Required, Validator::Phone],
                    _ => Vec::new(),
                };
                (field, FieldControl::new(validators))
            })
            .collect();

        Self {
            controls,
            invitation: ResolvedInvitation::default(),
            value_changes: ValueChanges::default(),
            attendance_subscription: None,
        }
    }

    /// Resolves the invitation code and reconfigures the attendance rules.
    pub fn apply_invitation(&mut self, code: Option<&str>) -> InvitationKind {
        self.invitation = ResolvedInvitation::from_code(code);
        let invitation_code = self.invitation.code.clone();
        self.control_mut(FormField::InvitationCode).value = invitation_code;

        tracing::debug!(
            code = code.unwrap_or_default(),
            kind = %self.invitation.kind,
            valid = self.invitation.is_valid_code(),
            "Invitation code resolved"
        );

        self.configure_validations();
        self.invitation.kind
    }

    /// Requires the attendance field that matches the current kind, releases
    /// the other one, and moves the two-day listener onto the active field.
    fn configure_validations(&mut self) {
        let active = FormField::active_attendance(self.invitation.kind);
        let inactive = match active {
            FormField::CompanionAttending => FormField::Attending,
            _ => FormField::CompanionAttending,
        };

        self.control_mut(active).set_validators(vec![Validator::Required]);
        self.control_mut(inactive).clear_validators();
        self.control_mut(FormField::Attending).update_validity();
        self.control_mut(FormField::CompanionAttending).update_validity();

        if let Some(previous) = self.attendance_subscription.take() {
            self.value_changes.unsubscribe(previous);
        }
        self.attendance_subscription = Some(
            self.value_changes
                .subscribe(active, Box::new(two_day_attendance_rule)),
        );

        tracing::debug!(
            kind = %self.invitation.kind,
            required = %active,
            optional = %inactive,
            "Attendance validation configured"
        );
    }

    /// Sets a control's value and notifies whatever listens on that field.
    pub fn set_value(&mut self, field: FormField, value: impl Into<String>) {
        let control = self.control_mut(field);
        control.value = value.into();
        control.update_validity();

        let value = self.controls[&field].value.clone();
        let commands = self.value_changes.emit(field, &value);
        self.apply_commands(&commands);
    }

    fn apply_commands(&mut self, commands: &[ControlCommand]) {
        for command in commands {
            let control = self.control_mut(command.field());
            match command {
                ControlCommand::Reset(_) => control.reset(),
                ControlCommand::Require(_) => control.set_validators(vec![Validator::Required]),
                ControlCommand::Release(_) => control.clear_validators(),
            }
        }
        for command in commands {
            self.control_mut(command.field()).update_validity();
        }
    }

    fn control_mut(&mut self, field: FormField) -> &mut FieldControl {
        // Every field is inserted in `new`, so the entry always exists.
        self.controls
            .entry(field)
            .or_insert_with(|| FieldControl::new(Vec::new()))
    }

    pub fn control(&self, field: FormField) -> &FieldControl {
        &self.controls[&field]
    }

    pub fn invitation(&self) -> &ResolvedInvitation {
        &self.invitation
    }

    pub fn kind(&self) -> InvitationKind {
        self.invitation.kind
    }

    /// Fields that currently carry a required constraint.
    pub fn required_fields(&self) -> Vec<FormField> {
        self.controls
            .iter()
            .filter(|(_, c)| c.is_required())
            .map(|(f, _)| *f)
            .collect()
    }

    pub fn invalid_fields(&self) -> Vec<FormField> {
        self.controls
            .iter()
            .filter(|(_, c)| !c.is_valid())
            .map(|(f, _)| *f)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.controls.values().all(FieldControl::is_valid)
    }

    /// Validates the whole form and builds the gateway payload.
    ///
    /// On failure every invalid control is marked touched so its error shows.
    pub fn submit(&mut self) -> Result<ConfirmationPayload, FormInvalid> {
        let invalid = self.invalid_fields();
        if !invalid.is_empty() {
            for field in &invalid {
                self.control_mut(*field).mark_as_touched();
            }
            tracing::debug!(
                invalid = ?invalid.iter().map(FormField::as_str).collect::<Vec<_>>(),
                "Registration blocked by validation"
            );
            return Err(FormInvalid { invalid });
        }

        Ok(ConfirmationPayload {
            name: Some(self.value_of(FormField::Name)),
            phone: Some(self.value_of(FormField::Phone)),
            seafood_preference: Some(self.value_of(FormField::SeafoodPreference)),
            attending: self.optional_value(FormField::Attending).map(Into::into),
            companion_attending: self
                .optional_value(FormField::CompanionAttending)
                .map(Into::into),
            two_day_attendance: self.optional_value(FormField::TwoDayAttendance),
            invitation_kind: self.invitation.kind,
            invitation_code: self.invitation.code.clone(),
        })
    }

    fn value_of(&self, field: FormField) -> String {
        self.control(field).value().to_string()
    }

    fn optional_value(&self, field: FormField) -> Option<String> {
        let value = self.control(field).value();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Snapshot of the form for rendering.
    pub fn view(&self) -> FormView {
        FormView {
            invitation_kind: self.invitation.kind,
            invitation_code: self.invitation.code.clone(),
            valid_code: self.invitation.is_valid_code(),
            title: self.invitation.kind.title(),
            subtitle: self.invitation.kind.subtitle(),
            valid: self.is_valid(),
            controls: self
                .controls
                .iter()
                .map(|(field, c)| {
                    (
                        *field,
                        ControlView {
                            value: c.value.clone(),
                            required: c.is_required(),
                            valid: c.valid,
                            touched: c.touched,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Rendering state of one control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlView {
    pub value: String,
    pub required: bool,
    pub valid: bool,
    pub touched: bool,
}

/// Rendering state of the whole form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub invitation_kind: InvitationKind,
    pub invitation_code: String,
    pub valid_code: bool,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub valid: bool,
    pub controls: BTreeMap<FormField, ControlView>,
}
