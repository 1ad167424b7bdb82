use async_trait::async_trait;

use super::MirrorStatus;
use crate::errors::Result;

/// Persistence for the mirror's health record, one row per process.
#[async_trait]
pub trait MirrorStatusRepositoryTrait: Send + Sync {
    fn get_mirror_status(&self) -> Result<Option<MirrorStatus>>;
    async fn save_mirror_status(&self, status: MirrorStatus) -> Result<()>;
}
