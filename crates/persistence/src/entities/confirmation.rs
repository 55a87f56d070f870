//! Confirmation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{AttendanceValue, ConfirmationRecord, InvitationKind, StoredConfirmation};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the confirmations table.
#[derive(Debug, Clone, FromRow)]
pub struct ConfirmationEntity {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub seafood_preference: String,
    pub attending: Option<Json<AttendanceValue>>,
    pub companion_attending: Option<Json<AttendanceValue>>,
    pub two_day_attendance: Option<String>,
    pub invitation_kind: String,
    pub invitation_code: String,
    pub submitted_at: DateTime<Utc>,
    pub submitted_timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ConfirmationEntity> for StoredConfirmation {
    fn from(entity: ConfirmationEntity) -> Self {
        let invitation_kind = entity.invitation_kind.parse().unwrap_or_else(|_| {
            tracing::warn!(
                confirmation_id = %entity.id,
                invitation_kind = %entity.invitation_kind,
                "Unknown invitation kind in database, treating as undefined"
            );
            InvitationKind::Undefined
        });

        StoredConfirmation {
            id: entity.id,
            created_at: entity.created_at,
            record: ConfirmationRecord {
                name: entity.name,
                phone: entity.phone,
                seafood_preference: entity.seafood_preference,
                attending: entity.attending.map(|Json(v)| v),
                companion_attending: entity.companion_attending.map(|Json(v)| v),
                two_day_attendance: entity.two_day_attendance,
                invitation_kind,
                invitation_code: entity.invitation_code,
                submitted_at: entity.submitted_at,
                timestamp: entity.submitted_timestamp,
            },
        }
    }
}
