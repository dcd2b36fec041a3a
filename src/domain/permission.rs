//! Named capabilities
//!
//! A permission carries no structure of its own; it only means something
//! through the permission table in [`crate::policy::table`].

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Participant
    ViewFeed,
    CreatePost,
    TakeAssessment,
    ViewOwnResults,
    // Leader
    ViewDashboard,
    ViewTeamResults,
    ModerateFeed,
    ViewMembers,
    // Admin
    ManageMembers,
    InviteMembers,
    ViewReports,
    ManageAssessments,
    // Owner
    ManageChurchSettings,
    ManageBilling,
    // Platform
    ViewPlatformMetrics,
    ManageTenants,
    ViewAs,
    /// Wildcard meaning "every permission"; reserved for the top role
    All,
}

impl Permission {
    pub const ALL_TOKENS: [Permission; 18] = [
        Permission::ViewFeed,
        Permission::CreatePost,
        Permission::TakeAssessment,
        Permission::ViewOwnResults,
        Permission::ViewDashboard,
        Permission::ViewTeamResults,
        Permission::ModerateFeed,
        Permission::ViewMembers,
        Permission::ManageMembers,
        Permission::InviteMembers,
        Permission::ViewReports,
        Permission::ManageAssessments,
        Permission::ManageChurchSettings,
        Permission::ManageBilling,
        Permission::ViewPlatformMetrics,
        Permission::ManageTenants,
        Permission::ViewAs,
        Permission::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewFeed => "view_feed",
            Permission::CreatePost => "create_post",
            Permission::TakeAssessment => "take_assessment",
            Permission::ViewOwnResults => "view_own_results",
            Permission::ViewDashboard => "view_dashboard",
            Permission::ViewTeamResults => "view_team_results",
            Permission::ModerateFeed => "moderate_feed",
            Permission::ViewMembers => "view_members",
            Permission::ManageMembers => "manage_members",
            Permission::InviteMembers => "invite_members",
            Permission::ViewReports => "view_reports",
            Permission::ManageAssessments => "manage_assessments",
            Permission::ManageChurchSettings => "manage_church_settings",
            Permission::ManageBilling => "manage_billing",
            Permission::ViewPlatformMetrics => "view_platform_metrics",
            Permission::ManageTenants => "manage_tenants",
            Permission::ViewAs => "view_as",
            Permission::All => "all",
        }
    }

    pub fn is_wildcard(self) -> bool {
        self == Permission::All
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Permission::ALL_TOKENS
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::UnknownPermission(s.to_string()))
    }
}
