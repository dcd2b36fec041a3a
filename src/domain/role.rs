//! Role hierarchy
//!
//! Roles form a strict total order fixed at compile time:
//! `PARTICIPANT < ORG_LEADER < ORG_ADMIN < ORG_OWNER < SUPER_ADMIN`.
//! A role's level only ever feeds `>=` comparisons.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Church member taking assessments and using the feed
    Participant,
    /// Small-group or ministry leader
    OrgLeader,
    /// Church staff administering members
    OrgAdmin,
    /// Owner of the church account
    OrgOwner,
    /// Platform operator; the top of the hierarchy
    SuperAdmin,
}

impl Role {
    /// The top of the hierarchy
    pub const TOP: Role = Role::SuperAdmin;

    /// Every role, lowest first
    pub const ALL: [Role; 5] = [
        Role::Participant,
        Role::OrgLeader,
        Role::OrgAdmin,
        Role::OrgOwner,
        Role::SuperAdmin,
    ];

    pub fn level(self) -> u8 {
        match self {
            Role::Participant => 1,
            Role::OrgLeader => 2,
            Role::OrgAdmin => 3,
            Role::OrgOwner => 4,
            Role::SuperAdmin => 5,
        }
    }

    /// `level(self) >= level(other)`
    pub fn at_least(self, other: Role) -> bool {
        self.level() >= other.level()
    }

    /// Strictly higher than `other`
    pub fn exceeds(self, other: Role) -> bool {
        self.level() > other.level()
    }

    pub fn is_top(self) -> bool {
        self == Role::TOP
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Participant => "PARTICIPANT",
            Role::OrgLeader => "ORG_LEADER",
            Role::OrgAdmin => "ORG_ADMIN",
            Role::OrgOwner => "ORG_OWNER",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::UnknownRole(s.to_string()))
    }
}

/// Compare two raw role tokens; unknown tokens are rejected rather than ordered.
pub fn compare_tokens(a: &str, b: &str) -> Result<bool> {
    let a: Role = a.parse()?;
    let b: Role = b.parse()?;
    Ok(a.at_least(b))
}
