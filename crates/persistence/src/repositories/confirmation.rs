//! Confirmation repository backed by PostgreSQL.
//!
//! Inserts fire a `pg_notify` trigger; a background listener reloads the
//! collection and publishes it to every dashboard subscriber.

use async_trait::async_trait;
use domain::models::{ConfirmationRecord, StoredConfirmation};
use domain::services::{ConfirmationStore, StoreError};
use sqlx::postgres::PgListener;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::entities::ConfirmationEntity;
use crate::metrics::{record_pool_metrics, QueryTimer};

/// Notification channel raised by the confirmations insert trigger.
pub const CHANGE_CHANNEL: &str = "confirmations_changed";

const SELECT_COLUMNS: &str = r#"
    id, name, phone, seafood_preference, attending, companion_attending,
    two_day_attendance, invitation_kind, invitation_code, submitted_at,
    submitted_timestamp, created_at
"#;

/// Repository for confirmation database operations.
#[derive(Clone)]
pub struct ConfirmationRepository {
    pool: PgPool,
}

impl ConfirmationRepository {
    /// Creates a new ConfirmationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a confirmation. The database assigns `id` and `created_at`.
    pub async fn insert(
        &self,
        record: &ConfirmationRecord,
    ) -> Result<ConfirmationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_confirmation");
        let result = sqlx::query_as::<_, ConfirmationEntity>(&format!(
            r#"
            INSERT INTO confirmations (
                name, phone, seafood_preference, attending, companion_attending,
                two_day_attendance, invitation_kind, invitation_code, submitted_at,
                submitted_timestamp
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(&record.name)
        .bind(&record.phone)
        .bind(&record.seafood_preference)
        .bind(record.attending.as_ref().map(Json))
        .bind(record.companion_attending.as_ref().map(Json))
        .bind(&record.two_day_attendance)
        .bind(record.invitation_kind.as_str())
        .bind(&record.invitation_code)
        .bind(record.submitted_at)
        .bind(record.timestamp)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Load every confirmation, most recent submission first.
    pub async fn find_all(&self) -> Result<Vec<ConfirmationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_all_confirmations");
        let result = sqlx::query_as::<_, ConfirmationEntity>(&format!(
            "SELECT {} FROM confirmations ORDER BY submitted_timestamp DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    async fn snapshot(&self) -> Result<Vec<StoredConfirmation>, sqlx::Error> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .map(StoredConfirmation::from)
            .collect())
    }
}

/// [`ConfirmationStore`] over PostgreSQL with LISTEN/NOTIFY change feed.
pub struct PgConfirmationStore {
    repo: ConfirmationRepository,
    feed: watch::Receiver<Vec<StoredConfirmation>>,
}

impl PgConfirmationStore {
    /// Loads the current collection and starts the change listener.
    pub async fn connect(pool: PgPool) -> Result<Self, sqlx::Error> {
        let repo = ConfirmationRepository::new(pool);
        let initial = repo.snapshot().await?;
        info!(count = initial.len(), "Loaded confirmations");

        let mut listener = PgListener::connect_with(repo.pool()).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let (sender, feed) = watch::channel(initial);
        tokio::spawn(run_change_listener(repo.clone(), listener, sender));

        Ok(Self { repo, feed })
    }
}

/// Reloads and republishes the collection on every notification.
///
/// A dropped connection loses the notifications raised while it was down, so
/// the listener reconnects at once and republishes a fresh snapshot. The task
/// exits, closing every subscription, only when it cannot reconnect.
async fn run_change_listener(
    repo: ConfirmationRepository,
    mut listener: PgListener,
    sender: watch::Sender<Vec<StoredConfirmation>>,
) {
    loop {
        match listener.try_recv().await {
            Ok(Some(notification)) => {
                debug!(payload = notification.payload(), "Confirmations changed");
            }
            Ok(None) => {
                warn!("Confirmation change listener lost its connection, reconnecting");
                if let Err(e) = relisten(&mut listener).await {
                    error!(error = %e, "Confirmation change listener could not reconnect");
                    break;
                }
                info!("Confirmation change listener reconnected");
            }
            Err(e) => {
                error!(error = %e, "Confirmation change listener stopped");
                break;
            }
        }
        publish_snapshot(&repo, &sender).await;
    }
}

/// Re-establishes the listener connection, which re-issues LISTEN for every
/// subscribed channel.
async fn relisten(listener: &mut PgListener) -> Result<(), sqlx::Error> {
    listener.listen_all(std::iter::empty::<&str>()).await
}

async fn publish_snapshot(
    repo: &ConfirmationRepository,
    sender: &watch::Sender<Vec<StoredConfirmation>>,
) {
    match repo.snapshot().await {
        Ok(all) => {
            // Keep publishing even with no viewers; new subscribers read the latest value.
            sender.send_replace(all);
        }
        Err(e) => warn!(error = %e, "Failed to reload confirmations"),
    }
}

#[async_trait]
impl ConfirmationStore for PgConfirmationStore {
    async fn append(&self, record: ConfirmationRecord) -> Result<StoredConfirmation, StoreError> {
        self.repo
            .insert(&record)
            .await
            .map(StoredConfirmation::from)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    async fn subscribe_all(
        &self,
    ) -> Result<watch::Receiver<Vec<StoredConfirmation>>, StoreError> {
        if self.feed.has_changed().is_err() {
            return Err(StoreError::Unavailable(
                "change listener is not running".to_string(),
            ));
        }
        Ok(self.feed.clone())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        record_pool_metrics(self.repo.pool());
        sqlx::query("SELECT 1")
            .execute(self.repo.pool())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::ReadFailed(e.to_string()))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
