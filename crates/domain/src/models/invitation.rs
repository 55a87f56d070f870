//! Invitation codes and the kinds they resolve to.

use serde::{Deserialize, Serialize};

/// Category of an invitation, controlling which attendance field is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InvitationKind {
    #[serde(rename = "individual")]
    Individual,
    #[serde(rename = "pareja")]
    Couple,
    /// No code was supplied, or the code is not in the table.
    #[default]
    #[serde(rename = "indefinido", other)]
    Undefined,
}

impl InvitationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationKind::Individual => "individual",
            InvitationKind::Couple => "pareja",
            InvitationKind::Undefined => "indefinido",
        }
    }

    /// Heading shown above the form.
    pub fn title(&self) -> &'static str {
        match self {
            InvitationKind::Individual => "Invitación Individual",
            InvitationKind::Couple => "Invitación para Pareja",
            InvitationKind::Undefined => "Confirmar Asistencia",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            InvitationKind::Individual => "Confirmación para 1 persona",
            InvitationKind::Couple => "Confirmación para 2 personas",
            InvitationKind::Undefined => "Por favor confirma tu asistencia",
        }
    }
}

impl std::fmt::Display for InvitationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvitationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(InvitationKind::Individual),
            "pareja" => Ok(InvitationKind::Couple),
            "indefinido" => Ok(InvitationKind::Undefined),
            other => Err(format!("Unknown invitation kind: {}", other)),
        }
    }
}

/// Compiled-in code table. Read-only for the lifetime of the process.
static INVITATION_CODES: &[(&str, InvitationKind)] = &[
    ("j8", InvitationKind::Individual),
    ("k5", InvitationKind::Couple),
    ("x3", InvitationKind::Individual),
    ("m9", InvitationKind::Couple),
];

/// Looks up a code in the table without collapsing misses.
fn lookup(code: &str) -> Option<InvitationKind> {
    INVITATION_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, kind)| *kind)
}

/// Resolves an invitation code to its kind.
///
/// Absent, empty and unknown codes all resolve to [`InvitationKind::Undefined`].
pub fn resolve(code: Option<&str>) -> InvitationKind {
    code.and_then(lookup).unwrap_or_default()
}

/// A code together with the kind it resolved to.
///
/// The code is kept only when it is a key of the table, so an unrecognised
/// code leaves an empty string behind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedInvitation {
    pub code: String,
    pub kind: InvitationKind,
}

impl ResolvedInvitation {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.and_then(|c| lookup(c).map(|kind| (c, kind))) {
            Some((code, kind)) => Self {
                code: code.to_string(),
                kind,
            },
            None => Self::default(),
        }
    }

    pub fn is_valid_code(&self) -> bool {
        self.kind != InvitationKind::Undefined
    }
}
