use async_trait::async_trait;
use std::collections::HashMap;

use super::{Settings, SettingsUpdate};
use crate::errors::Result;

#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    fn get_setting(&self, key: &str) -> Result<Option<String>>;
    fn list_settings(&self) -> Result<HashMap<String, String>>;
    async fn set_setting(&self, key: String, value: String) -> Result<()>;
    async fn delete_setting(&self, key: String) -> Result<usize>;
}

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    fn get_settings(&self) -> Result<Settings>;
    async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings>;
    fn session_user_id(&self) -> Result<Option<String>>;
    async fn set_session_user_id(&self, user_id: Option<String>) -> Result<()>;
}
