// Repository layer for database operations

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::*;

const EVENT_COLUMNS: &str =
    "id, user_id, lock_id, campaign_name, event_type, sent_at, batch_id, clicked";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Create a bounded connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Release every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ============================================
    // Campaign analytics (notification lifecycle)
    // ============================================

    pub async fn insert_sent_event(&self, input: CreateSentEventRow) -> Result<NotificationEventRow> {
        let row = sqlx::query_as::<_, NotificationEventRow>(&format!(
            r#"
            INSERT INTO campaign_analytics
                (id, user_id, lock_id, campaign_name, event_type, sent_at, batch_id, clicked)
            VALUES ($1, $2, $3, $4, 'sent', clock_timestamp(), $5, false)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&input.user_id)
        .bind(&input.lock_id)
        .bind(&input.campaign_name)
        .bind(&input.batch_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Mark the newest unclicked send for the key as clicked
    ///
    /// Single statement: the row lock taken by FOR UPDATE serialises racing
    /// correlations, and the outer `clicked = false` re-check makes the loser
    /// update nothing instead of falling through to an older row.
    pub async fn mark_latest_clicked(
        &self,
        user_id: &str,
        lock_id: &str,
        campaign_name: &str,
    ) -> Result<Option<NotificationEventRow>> {
        let row = sqlx::query_as::<_, NotificationEventRow>(
            r#"
            WITH newest AS (
                SELECT id
                FROM campaign_analytics
                WHERE user_id = $1
                  AND lock_id = $2
                  AND campaign_name = $3
                  AND event_type = 'sent'
                  AND clicked = false
                ORDER BY sent_at DESC, id DESC
                LIMIT 1
                FOR UPDATE
            )
            UPDATE campaign_analytics c
            SET clicked = true
            FROM newest n
            WHERE c.id = n.id AND c.clicked = false
            RETURNING c.id, c.user_id, c.lock_id, c.campaign_name, c.event_type,
                      c.sent_at, c.batch_id, c.clicked
            "#,
        )
        .bind(user_id)
        .bind(lock_id)
        .bind(campaign_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn campaign_counts(&self, campaign_name: &str) -> Result<Option<CampaignCountsRow>> {
        let row = sqlx::query_as::<_, CampaignCountsRow>(
            r#"
            SELECT
                campaign_name,
                COUNT(*) AS sent_count,
                COUNT(*) FILTER (WHERE clicked) AS clicked_count,
                COUNT(DISTINCT user_id) AS unique_users_sent,
                COUNT(DISTINCT user_id) FILTER (WHERE clicked) AS unique_users_clicked,
                MIN(sent_at) AS first_sent_at,
                MAX(sent_at) FILTER (WHERE clicked) AS last_clicked_at,
                MAX(sent_at) AS last_activity
            FROM campaign_analytics
            WHERE campaign_name = $1 AND event_type = 'sent'
            GROUP BY campaign_name
            "#,
        )
        .bind(campaign_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn all_campaign_counts(&self) -> Result<Vec<CampaignCountsRow>> {
        let rows = sqlx::query_as::<_, CampaignCountsRow>(
            r#"
            SELECT
                campaign_name,
                COUNT(*) AS sent_count,
                COUNT(*) FILTER (WHERE clicked) AS clicked_count,
                COUNT(DISTINCT user_id) AS unique_users_sent,
                COUNT(DISTINCT user_id) FILTER (WHERE clicked) AS unique_users_clicked,
                MIN(sent_at) AS first_sent_at,
                MAX(sent_at) FILTER (WHERE clicked) AS last_clicked_at,
                MAX(sent_at) AS last_activity
            FROM campaign_analytics
            WHERE event_type = 'sent'
            GROUP BY campaign_name
            ORDER BY last_activity DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_user_events(&self, user_id: &str) -> Result<Vec<NotificationEventRow>> {
        let rows = sqlx::query_as::<_, NotificationEventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM campaign_analytics
            WHERE user_id = $1
            ORDER BY sent_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Lock subscriptions
    // ============================================

    pub async fn list_subscriptions(&self, lock_ids: &[String]) -> Result<Vec<SubscriptionRow>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT user_id, lock_id, fcm_id
            FROM lock_user_mapping
            WHERE lock_id = ANY($1::text[])
            ORDER BY lock_id, user_id
            "#,
        )
        .bind(lock_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn upsert_subscription(&self, user_id: &str, lock_id: &str, fcm_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO lock_user_mapping (user_id, lock_id, fcm_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (lock_id, user_id) DO UPDATE SET fcm_id = EXCLUDED.fcm_id
            "#,
        )
        .bind(user_id)
        .bind(lock_id)
        .bind(fcm_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_subscription(&self, user_id: &str, lock_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lock_user_mapping WHERE user_id = $1 AND lock_id = $2")
            .bind(user_id)
            .bind(lock_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
