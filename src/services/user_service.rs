//! Account service: registration, login, profile and password changes.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::auth::password::{self, CredentialError};
use crate::database::models::User;
use crate::database::repository::{NewUser, StoreError, UserRepository};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("username already exists")]
    UsernameTaken,
    #[error("email already exists")]
    EmailTaken,
    #[error("user not found")]
    NotFound,
    #[error("invalid old password")]
    InvalidOldPassword,
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register a new active account. The display name defaults to the
    /// username; the password is stored only as a digest.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserError> {
        if self.users.username_exists(username).await? {
            return Err(UserError::UsernameTaken);
        }
        if self.users.email_exists(email).await? {
            return Err(UserError::EmailTaken);
        }

        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password::hash_password(password)?,
                display_name: Some(username.to_string()),
            })
            .await?;

        info!(user_id = user.id, "account registered");
        Ok(user)
    }

    /// Verify credentials against an active account. `None` covers every
    /// failure cause - unknown name, deactivated account, wrong password -
    /// so callers cannot distinguish them. Updates the last-login
    /// timestamp on success.
    pub async fn authenticate(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        let Some(user) = self.users.find_by_username_or_email(username_or_email).await? else {
            return Ok(None);
        };

        if !user.is_active || !password::verify_password(password, &user.password_hash) {
            return Ok(None);
        }

        self.users.touch_last_login(user.id).await?;
        Ok(Some(user))
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<User, UserError> {
        self.users
            .find_active_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Partial profile update. A missing or blank display name keeps the
    /// stored value; an avatar URL is applied whenever present.
    pub async fn update_profile(
        &self,
        user_id: i64,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<User, UserError> {
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty());

        self.users
            .update_profile(user_id, display_name, avatar_url)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        let user = self
            .users
            .find_active_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;

        if !password::verify_password(old_password, &user.password_hash) {
            return Err(UserError::InvalidOldPassword);
        }

        let digest = password::hash_password(new_password)?;
        self.users.set_password_hash(user_id, &digest).await?;
        info!(user_id, "password changed");
        Ok(())
    }

    pub async fn is_username_available(&self, username: &str) -> Result<bool, UserError> {
        Ok(!self.users.username_exists(username).await?)
    }

    pub async fn is_email_available(&self, email: &str) -> Result<bool, UserError> {
        Ok(!self.users.email_exists(email).await?)
    }

    /// Soft delete. Notes cascade only on hard removal, which this API
    /// never performs; a deactivated account simply authenticates to
    /// nothing.
    pub async fn deactivate(&self, user_id: i64) -> Result<(), UserError> {
        self.users.deactivate(user_id).await?;
        info!(user_id, "account deactivated");
        Ok(())
    }
}
