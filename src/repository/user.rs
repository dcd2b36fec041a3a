//! User repository

use crate::domain::{Role, TenantId, User, UserId, UserStatus};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>>;
    async fn get_users_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<User>>;
    async fn update_user_role(&self, id: &UserId, role: Role) -> Result<User>;
    async fn update_user_tenant(&self, id: &UserId, tenant_id: &TenantId) -> Result<User>;
    async fn update_user_status(&self, id: &UserId, status: UserStatus) -> Result<User>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    display_name: Option<String>,
    role: String,
    tenant_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        // An unrecognized role token in storage fails the lookup closed
        let role: Role = row.role.parse()?;
        let status: UserStatus = row
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;

        Ok(User {
            id: UserId::new(row.id),
            email: row.email,
            display_name: row.display_name,
            role,
            tenant_id: row.tenant_id.map(TenantId::new),
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn require(&self, id: &UserId) -> Result<User> {
        self.get_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name, role, tenant_id, status, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_users_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name, role, tenant_id, status, created_at, updated_at
            FROM users
            WHERE tenant_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_user_role(&self, id: &UserId, role: Role) -> Result<User> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = NOW() WHERE id = ?")
            .bind(role.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        self.require(id).await
    }

    async fn update_user_tenant(&self, id: &UserId, tenant_id: &TenantId) -> Result<User> {
        let result =
            sqlx::query("UPDATE users SET tenant_id = ?, updated_at = NOW() WHERE id = ?")
                .bind(tenant_id.as_str())
                .bind(id.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        self.require(id).await
    }

    async fn update_user_status(&self, id: &UserId, status: UserStatus) -> Result<User> {
        let result = sqlx::query("UPDATE users SET status = ?, updated_at = NOW() WHERE id = ?")
            .bind(status.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        self.require(id).await
    }
}
