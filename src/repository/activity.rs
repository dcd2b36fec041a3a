//! Per-tenant activity counters (assessments and feed)

use crate::domain::{TenantActivity, TenantId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Counters for exactly one tenant; implementations must filter by `tenant_id`.
    async fn tenant_activity(&self, tenant_id: &TenantId) -> Result<TenantActivity>;
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    assessments_started: i64,
    assessments_completed: i64,
    posts: i64,
    last_assessment_at: Option<DateTime<Utc>>,
    last_post_at: Option<DateTime<Utc>>,
}

pub struct ActivityRepositoryImpl {
    pool: MySqlPool,
}

impl ActivityRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for ActivityRepositoryImpl {
    async fn tenant_activity(&self, tenant_id: &TenantId) -> Result<TenantActivity> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM assessment_attempts WHERE tenant_id = ?) AS assessments_started,
                (SELECT COUNT(*) FROM assessment_attempts
                    WHERE tenant_id = ? AND completed_at IS NOT NULL) AS assessments_completed,
                (SELECT COUNT(*) FROM feed_posts WHERE tenant_id = ?) AS posts,
                (SELECT MAX(started_at) FROM assessment_attempts WHERE tenant_id = ?) AS last_assessment_at,
                (SELECT MAX(created_at) FROM feed_posts WHERE tenant_id = ?) AS last_post_at
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(tenant_id.as_str())
        .bind(tenant_id.as_str())
        .bind(tenant_id.as_str())
        .bind(tenant_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(TenantActivity {
            assessments_started: row.assessments_started.max(0) as u64,
            assessments_completed: row.assessments_completed.max(0) as u64,
            posts: row.posts.max(0) as u64,
            last_activity_at: row.last_assessment_at.max(row.last_post_at),
        })
    }
}
