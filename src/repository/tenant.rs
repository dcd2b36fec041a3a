//! Tenant repository

use crate::domain::{Tenant, TenantId, TenantStatus};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn get_tenant_by_id(&self, id: &TenantId) -> Result<Option<Tenant>>;
    async fn list_tenants(&self) -> Result<Vec<Tenant>>;
    async fn update_tenant_status(&self, id: &TenantId, status: TenantStatus) -> Result<Tenant>;
}

#[derive(Debug, FromRow)]
struct TenantRow {
    id: String,
    name: String,
    slug: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = AppError;

    fn try_from(row: TenantRow) -> Result<Self> {
        let status: TenantStatus = row
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;

        Ok(Tenant {
            id: TenantId::new(row.id),
            name: row.name,
            slug: row.slug,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct TenantRepositoryImpl {
    pool: MySqlPool,
}

impl TenantRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for TenantRepositoryImpl {
    async fn get_tenant_by_id(&self, id: &TenantId) -> Result<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, slug, status, created_at, updated_at
            FROM tenants
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Tenant::try_from).transpose()
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, slug, status, created_at, updated_at
            FROM tenants
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Tenant::try_from).collect()
    }

    async fn update_tenant_status(&self, id: &TenantId, status: TenantStatus) -> Result<Tenant> {
        let result = sqlx::query("UPDATE tenants SET status = ?, updated_at = NOW() WHERE id = ?")
            .bind(status.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tenant {} not found", id)));
        }

        self.get_tenant_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", id)))
    }
}
