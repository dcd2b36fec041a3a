//! User domain model

use super::common::{TenantId, UserId};
use super::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Soft lifecycle state; users are never physically removed while data references them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "INACTIVE" => Ok(UserStatus::Inactive),
            other => Err(format!("Invalid user status: {}", other)),
        }
    }
}

/// Canonical user record owned by the identity store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    /// Only the top role may be unassigned
    pub tenant_id: Option<TenantId>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Every non-top user belongs to exactly one tenant.
    pub fn has_valid_tenancy(&self) -> bool {
        self.role.is_top() || self.tenant_id.is_some()
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new("user-default"),
            email: String::new(),
            display_name: None,
            role: Role::Participant,
            tenant_id: None,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a user returned by membership endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub status: UserStatus,
}

impl From<User> for MemberSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            status: user.status,
        }
    }
}
