//! Tenant (church) domain model

use super::common::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tenant status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    #[default]
    Active,
    Inactive,
}

impl TenantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TenantStatus::Active => "ACTIVE",
            TenantStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(TenantStatus::Active),
            "INACTIVE" => Ok(TenantStatus::Inactive),
            other => Err(format!("Invalid tenant status: {}", other)),
        }
    }
}

/// An isolated data partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

impl Default for Tenant {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: TenantId::new("church-default"),
            name: String::new(),
            slug: String::new(),
            status: TenantStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}
