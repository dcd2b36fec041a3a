//! Tenant membership administration
//!
//! Every read and write goes through the [`TenantGate`], so a tenant-scoped
//! caller can neither see nor touch users of another tenant.

use super::gate::TenantGate;
use crate::domain::{
    EffectiveIdentity, MemberSummary, Permission, Role, Tenant, TenantId, TenantStatus, User,
    UserId, UserStatus,
};
use crate::error::{AppError, Result};
use crate::policy;
use crate::repository::{TenantRepository, UserRepository};
use std::sync::Arc;
use tracing::info;

pub struct MembershipService<U: UserRepository, T: TenantRepository> {
    users: Arc<U>,
    tenants: Arc<T>,
    gate: TenantGate<T>,
}

impl<U: UserRepository, T: TenantRepository> MembershipService<U, T> {
    pub fn new(users: Arc<U>, tenants: Arc<T>) -> Self {
        Self {
            users,
            gate: TenantGate::new(tenants.clone()),
            tenants,
        }
    }

    /// Members of the caller's scoped tenant
    pub async fn list_members(
        &self,
        identity: &EffectiveIdentity,
        explicit_tenant_id: Option<&TenantId>,
    ) -> Result<Vec<MemberSummary>> {
        policy::enforce_permission(identity, Permission::ViewMembers)?;
        let tenant_id = self.gate.resolve(identity, explicit_tenant_id).await?;

        let members = self
            .users
            .get_users_by_tenant(&tenant_id)
            .await?
            .into_iter()
            .filter(|user| user.tenant_id.as_ref() == Some(&tenant_id))
            .map(MemberSummary::from)
            .collect();
        Ok(members)
    }

    pub async fn change_role(
        &self,
        actor: &EffectiveIdentity,
        target_id: &UserId,
        new_role: Role,
    ) -> Result<MemberSummary> {
        policy::enforce_permission(actor, Permission::ManageMembers)?;
        let target = self.managed_user(actor, target_id).await?;
        if !actor.role.exceeds(new_role) {
            return Err(AppError::Forbidden(format!(
                "Role {} cannot assign role {}",
                actor.role, new_role
            )));
        }

        let updated = self.users.update_user_role(&target.id, new_role).await?;
        info!(
            user_id = %actor.user_id(),
            effective_role = %actor.role,
            view_as = actor.is_impersonating(),
            target_user_id = %target.id,
            from_role = %target.role,
            to_role = %new_role,
            "User role changed"
        );
        Ok(updated.into())
    }

    /// Move a user to another tenant. The actor must be able to scope both
    /// the source and the destination, which in practice means the top role.
    pub async fn transfer_tenant(
        &self,
        actor: &EffectiveIdentity,
        target_id: &UserId,
        destination: &TenantId,
    ) -> Result<MemberSummary> {
        policy::enforce_permission(actor, Permission::ManageMembers)?;
        let target = self.managed_user(actor, target_id).await?;
        if target.tenant_id.as_ref() == Some(destination) {
            return Err(AppError::BadRequest(format!(
                "User {} already belongs to tenant {}",
                target.id, destination
            )));
        }

        let scoped = self.gate.resolve(actor, Some(destination)).await?;
        if &scoped != destination {
            return Err(AppError::Forbidden(format!(
                "Cannot transfer users into tenant {}",
                destination
            )));
        }
        let tenant = self.tenant(destination).await?;
        if !tenant.is_active() {
            return Err(AppError::BadRequest(format!(
                "Tenant {} is not active",
                destination
            )));
        }

        let updated = self.users.update_user_tenant(&target.id, destination).await?;
        info!(
            user_id = %actor.user_id(),
            effective_role = %actor.role,
            view_as = actor.is_impersonating(),
            target_user_id = %target.id,
            from_tenant = ?target.tenant_id,
            to_tenant = %destination,
            "User transferred"
        );
        Ok(updated.into())
    }

    /// Soft (de)activation; users are never deleted here.
    pub async fn set_user_status(
        &self,
        actor: &EffectiveIdentity,
        target_id: &UserId,
        status: UserStatus,
    ) -> Result<MemberSummary> {
        policy::enforce_permission(actor, Permission::ManageMembers)?;
        let target = self.managed_user(actor, target_id).await?;

        let updated = self.users.update_user_status(&target.id, status).await?;
        info!(
            user_id = %actor.user_id(),
            effective_role = %actor.role,
            target_user_id = %target.id,
            status = status.as_str(),
            "User status changed"
        );
        Ok(updated.into())
    }

    pub async fn set_tenant_status(
        &self,
        actor: &EffectiveIdentity,
        tenant_id: &TenantId,
        status: TenantStatus,
    ) -> Result<Tenant> {
        policy::enforce_permission(actor, Permission::ManageTenants)?;
        policy::gate::platform_scope(actor)?;
        self.tenant(tenant_id).await?;

        let updated = self.tenants.update_tenant_status(tenant_id, status).await?;
        info!(
            user_id = %actor.user_id(),
            tenant_id = %tenant_id,
            status = status.as_str(),
            "Tenant status changed"
        );
        Ok(updated)
    }

    /// A user the actor may manage: inside the actor's scope and strictly
    /// below the actor's effective role. Users outside the scope read as
    /// missing.
    async fn managed_user(&self, actor: &EffectiveIdentity, target_id: &UserId) -> Result<User> {
        let not_found = || AppError::NotFound(format!("User {} not found", target_id));

        let target = self
            .users
            .get_user_by_id(target_id)
            .await?
            .ok_or_else(not_found)?;

        if let Some(target_tenant) = &target.tenant_id {
            let scoped = self.gate.resolve(actor, Some(target_tenant)).await?;
            if &scoped != target_tenant {
                return Err(not_found());
            }
        } else if !actor.is_top() {
            return Err(not_found());
        }

        if !actor.role.exceeds(target.role) {
            return Err(AppError::Forbidden(format!(
                "Role {} cannot manage a user with role {}",
                actor.role, target.role
            )));
        }
        Ok(target)
    }

    async fn tenant(&self, tenant_id: &TenantId) -> Result<Tenant> {
        self.tenants
            .get_tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))
    }
}
