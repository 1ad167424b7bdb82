use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::{
    is_plausible_email, normalize_email, NewUser, PasswordHasher, RegisterRequest, User,
    UserRepositoryTrait,
};
use crate::errors::{AuthError, DatabaseError, Error, Result};
use crate::settings::SettingsServiceTrait;

pub const MIN_PASSWORD_LEN: usize = 8;

#[async_trait]
pub trait AuthServiceTrait: Send + Sync {
    /// Creates the account and signs it in.
    async fn register(&self, request: RegisterRequest) -> Result<User>;
    async fn login(&self, email: &str, password: &str) -> Result<User>;
    async fn logout(&self) -> Result<()>;

    /// The signed-in user, or `None`. A session pointing at a deleted
    /// account reads as signed out.
    fn current_user(&self) -> Result<Option<User>>;
    fn require_user(&self) -> Result<User>;

    async fn update_display_name(&self, user_id: &str, display_name: &str) -> Result<User>;
    async fn delete_account(&self, user_id: &str) -> Result<()>;
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepositoryTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl AuthService {
    pub fn new(
        user_repository: Arc<dyn UserRepositoryTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            user_repository,
            settings_service,
            password_hasher,
        }
    }

    fn validate_display_name(display_name: &str) -> Result<String> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("Display name must not be blank"));
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl AuthServiceTrait for AuthService {
    async fn register(&self, request: RegisterRequest) -> Result<User> {
        let email = normalize_email(&request.email);
        if !is_plausible_email(&email) {
            return Err(Error::invalid_input(format!(
                "'{}' is not a valid email address",
                request.email.trim()
            )));
        }
        let display_name = Self::validate_display_name(&request.display_name)?;
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::invalid_input(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self
            .user_repository
            .find_credentials_by_email(&email)?
            .is_some()
        {
            return Err(AuthError::EmailTaken.into());
        }

        let password_hash = self.password_hasher.hash(&request.password)?;
        let user = self
            .user_repository
            .create_user(NewUser {
                email,
                display_name,
                password_hash,
                is_admin: false,
            })
            .await
            .map_err(|err| match err {
                Error::Database(DatabaseError::UniqueViolation(_)) => AuthError::EmailTaken.into(),
                other => other,
            })?;

        self.settings_service
            .set_session_user_id(Some(user.id.clone()))
            .await?;
        info!("[Auth] Registered user {}", user.id);
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<User> {
        let credentials = self
            .user_repository
            .find_credentials_by_email(&normalize_email(email))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .password_hasher
            .verify(password, &credentials.password_hash)?
        {
            debug!("[Auth] Password mismatch for user {}", credentials.user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        self.settings_service
            .set_session_user_id(Some(credentials.user.id.clone()))
            .await?;
        Ok(credentials.user)
    }

    async fn logout(&self) -> Result<()> {
        self.settings_service.set_session_user_id(None).await
    }

    fn current_user(&self) -> Result<Option<User>> {
        match self.settings_service.session_user_id()? {
            Some(user_id) => self.user_repository.get_user(&user_id),
            None => Ok(None),
        }
    }

    fn require_user(&self) -> Result<User> {
        self.current_user()?
            .ok_or_else(|| AuthError::NotSignedIn.into())
    }

    async fn update_display_name(&self, user_id: &str, display_name: &str) -> Result<User> {
        let display_name = Self::validate_display_name(display_name)?;
        self.user_repository
            .update_display_name(user_id.to_string(), display_name)
            .await
    }

    async fn delete_account(&self, user_id: &str) -> Result<()> {
        let deleted = self.user_repository.delete_user(user_id.to_string()).await?;
        if deleted == 0 {
            return Err(Error::not_found(format!("User '{}'", user_id)));
        }
        if self.settings_service.session_user_id()?.as_deref() == Some(user_id) {
            self.settings_service.set_session_user_id(None).await?;
        }
        info!("[Auth] Deleted user {}", user_id);
        Ok(())
    }
}
