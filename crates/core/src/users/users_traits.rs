use async_trait::async_trait;

use super::{NewUser, User, UserCredentials};
use crate::errors::Result;

#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Looks up by normalized (lowercase) email.
    fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;

    async fn create_user(&self, new_user: NewUser) -> Result<User>;
    async fn update_display_name(&self, user_id: String, display_name: String) -> Result<User>;

    /// Removes the user; cart lines, favorites and orders go with it.
    async fn delete_user(&self, user_id: String) -> Result<usize>;
}
