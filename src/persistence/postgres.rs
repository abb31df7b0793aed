//! PostgreSQL implementation of the persistence gateway.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, QueryBuilder};

use crate::config::AppConfig;
use crate::domain::{Ad, ClickEvent};
use crate::error::TrackerError;
use crate::service::batcher::ClickWriter;

/// PostgreSQL-backed persistence gateway using `sqlx::PgPool`.
///
/// All time parameters are UTC instants passed through to the store
/// unchanged. The gateway never retries; retry policy lives with the
/// callers that need it (the batcher).
#[derive(Debug, Clone)]
pub struct ClickStore {
    pool: PgPool,
}

impl ClickStore {
    /// Creates a new gateway over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool using the pool settings in `config`.
    ///
    /// Establishes at least one connection eagerly, so an unreachable
    /// database fails startup instead of the first request.
    ///
    /// # Errors
    ///
    /// Returns a [`sqlx::Error`] if the database cannot be reached.
    pub async fn connect(config: &AppConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .max_lifetime(Duration::from_secs(config.database_max_lifetime_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Returns all ads currently flagged active.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::StorageUnavailable`] on database failure.
    pub async fn list_active_ads(&self) -> Result<Vec<Ad>, TrackerError> {
        sqlx::query_as::<_, Ad>(
            "SELECT id, image_url, target_url, title, active, created_at, updated_at \
             FROM ads WHERE active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(TrackerError::from_db)
    }

    /// Fetches a single ad by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::AdNotFound`] when no row exists, or
    /// [`TrackerError::StorageUnavailable`] on database failure.
    pub async fn lookup_ad(&self, id: i64) -> Result<Ad, TrackerError> {
        sqlx::query_as::<_, Ad>(
            "SELECT id, image_url, target_url, title, active, created_at, updated_at \
             FROM ads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(TrackerError::from_db)?
        .ok_or(TrackerError::AdNotFound(id))
    }

    /// Inserts a single click event. Used only on the overflow fallback
    /// path; the batch path goes through [`ClickWriter::insert_clicks_batch`].
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Conflict`] on constraint violation or
    /// [`TrackerError::StorageUnavailable`] on database failure.
    pub async fn insert_click(&self, event: &ClickEvent) -> Result<(), TrackerError> {
        sqlx::query(
            "INSERT INTO click_events \
             (ad_id, timestamp, ip_address, video_playback_time, user_agent, processed, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.ad_id)
        .bind(event.timestamp)
        .bind(&event.ip_address)
        .bind(event.video_playback_time)
        .bind(&event.user_agent)
        .bind(event.processed)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(TrackerError::from_db)?;
        Ok(())
    }

    /// Counts click events with `timestamp >= since`, optionally scoped
    /// to a single ad.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::StorageUnavailable`] on database failure.
    pub async fn count_clicks(
        &self,
        ad_id: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        let count = if let Some(ad_id) = ad_id {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM click_events WHERE ad_id = $1 AND timestamp >= $2",
            )
            .bind(ad_id)
            .bind(since)
            .fetch_one(&self.pool)
            .await
        } else {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM click_events WHERE timestamp >= $1",
            )
            .bind(since)
            .fetch_one(&self.pool)
            .await
        }
        .map_err(TrackerError::from_db)?;

        Ok(count)
    }

    /// Returns the distinct ad IDs with at least one click in the window.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::StorageUnavailable`] on database failure.
    pub async fn distinct_ad_ids_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<i64>, TrackerError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT ad_id FROM click_events WHERE timestamp >= $1 ORDER BY ad_id",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(TrackerError::from_db)
    }
}

#[async_trait]
impl ClickWriter for ClickStore {
    /// Inserts a batch of click events as one multi-row `INSERT` statement.
    ///
    /// All-or-nothing within the single statement; no transaction is
    /// opened across statements.
    async fn insert_clicks_batch(&self, events: &[ClickEvent]) -> Result<(), TrackerError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::new(
            "INSERT INTO click_events \
             (ad_id, timestamp, ip_address, video_playback_time, user_agent, processed, created_at) ",
        );
        builder.push_values(events, |mut row, event| {
            row.push_bind(event.ad_id)
                .push_bind(event.timestamp)
                .push_bind(&event.ip_address)
                .push_bind(event.video_playback_time)
                .push_bind(&event.user_agent)
                .push_bind(event.processed)
                .push_bind(event.created_at);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(TrackerError::from_db)?;
        Ok(())
    }
}
