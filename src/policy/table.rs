//! Static role → permission table
//!
//! The table is the only source of truth for what a role may do. Each role
//! holds its own grants plus everything held by the roles below it; the top
//! role holds only the `all` wildcard.

use crate::domain::{Permission, Role};
use crate::error::{AppError, Result};
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

pub type PermissionTable = HashMap<Role, HashSet<Permission>>;

/// Grants introduced at each level, lowest role first
const GRANTS: &[(Role, &[Permission])] = &[
    (
        Role::Participant,
        &[
            Permission::ViewFeed,
            Permission::CreatePost,
            Permission::TakeAssessment,
            Permission::ViewOwnResults,
        ],
    ),
    (
        Role::OrgLeader,
        &[
            Permission::ViewDashboard,
            Permission::ViewTeamResults,
            Permission::ModerateFeed,
            Permission::ViewMembers,
        ],
    ),
    (
        Role::OrgAdmin,
        &[
            Permission::ManageMembers,
            Permission::InviteMembers,
            Permission::ViewReports,
            Permission::ManageAssessments,
        ],
    ),
    (
        Role::OrgOwner,
        &[Permission::ManageChurchSettings, Permission::ManageBilling],
    ),
];

lazy_static! {
    static ref TABLE: PermissionTable = build_table();
    static ref EMPTY: HashSet<Permission> = HashSet::new();
}

fn build_table() -> PermissionTable {
    let mut table = PermissionTable::new();
    let mut inherited: HashSet<Permission> = HashSet::new();

    for (role, grants) in GRANTS {
        inherited.extend(grants.iter().copied());
        table.insert(*role, inherited.clone());
    }

    table.insert(Role::TOP, HashSet::from([Permission::All]));
    table
}

/// Permissions held by `role`; a role missing from the table holds nothing.
pub fn permissions_for(role: Role) -> &'static HashSet<Permission> {
    TABLE.get(&role).unwrap_or(&EMPTY)
}

/// Lookup by raw role token. Unknown tokens fail closed to the empty set.
pub fn permissions_for_token(token: &str) -> &'static HashSet<Permission> {
    match token.parse::<Role>() {
        Ok(role) => permissions_for(role),
        Err(_) => &EMPTY,
    }
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    let held = permissions_for(role);
    held.contains(&permission) || held.contains(&Permission::All)
}

/// Startup check of the built-in table
pub fn validate_tables() -> Result<()> {
    validate(&TABLE)
}

/// Every role must be covered and only the top role may hold the wildcard.
pub fn validate(table: &PermissionTable) -> Result<()> {
    for role in Role::ALL {
        let Some(permissions) = table.get(&role) else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Permission table does not cover role {}",
                role
            )));
        };
        if permissions.contains(&Permission::All) && !role.is_top() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Role {} may not hold the wildcard permission",
                role
            )));
        }
    }
    Ok(())
}
