//! Identity resolution

use crate::domain::{User, UserId};
use crate::error::{AppError, Result};
use crate::repository::UserRepository;
use std::sync::Arc;

/// Loads the canonical user record for an authenticated principal id.
pub struct IdentityResolver<U: UserRepository> {
    users: Arc<U>,
}

impl<U: UserRepository> IdentityResolver<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    /// Pure lookup. Callers must treat `NotFound` as unauthenticated.
    pub async fn resolve(&self, principal_id: &UserId) -> Result<User> {
        self.users
            .get_user_by_id(principal_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", principal_id)))
    }
}
