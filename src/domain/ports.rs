use crate::domain::model::{
    BindRequest, InstanceRecord, ProvisionRequest, Reply, UnbindRequest, UnprovisionRequest,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 持久化協作者。交易與鎖由實作自行負責
#[async_trait]
pub trait Store: Send + Sync {
    async fn provision(&self, request: &ProvisionRequest, reply: &Reply) -> StoreResult<()>;
    async fn unprovision(&self, request: &UnprovisionRequest, reply: &Reply) -> StoreResult<()>;
    async fn bind(&self, request: &BindRequest, reply: &Reply) -> StoreResult<()>;
    async fn unbind(&self, request: &UnbindRequest, reply: &Reply) -> StoreResult<()>;
    async fn get_all_instances(&self) -> StoreResult<Vec<InstanceRecord>>;

    fn backend_name(&self) -> &'static str;
}
