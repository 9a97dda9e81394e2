use crate::domain::model::{
    BindRequest, DatabaseSettings, InstanceRecord, ProvisionRequest, Reply, UnbindRequest,
    UnprovisionRequest,
};
use crate::domain::ports::{Store, StoreError, StoreResult};
use crate::utils::error::{BrokerError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const MEMORY_BACKEND: &str = "memory";

/// 依照 `database.backend` 建立 Store，未指定時使用記憶體
pub fn store_from_settings(settings: &DatabaseSettings) -> Result<Arc<dyn Store>> {
    match settings.backend.as_deref() {
        None | Some(MEMORY_BACKEND) => Ok(Arc::new(MemoryStore::new())),
        Some(other) => Err(BrokerError::UnknownStoreBackend {
            backend: other.to_string(),
        }),
    }
}

/// 行程內的 Store，重啟後資料消失
#[derive(Debug, Default)]
pub struct MemoryStore {
    instances: RwLock<HashMap<String, InstanceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn provision(&self, request: &ProvisionRequest, reply: &Reply) -> StoreResult<()> {
        let mut instances = self.instances.write().await;
        if instances.contains_key(&request.instance_id) {
            return Err(StoreError::Conflict(format!(
                "instance {} already recorded",
                request.instance_id
            )));
        }
        instances.insert(
            request.instance_id.clone(),
            InstanceRecord {
                instance_id: request.instance_id.clone(),
                service_id: request.service_id.clone(),
                plan_id: request.plan_id.clone(),
                organization_guid: request.organization_guid.clone(),
                space_guid: request.space_guid.clone(),
                dashboard_url: reply.dashboard_url.clone(),
                bindings: Vec::new(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn unprovision(&self, request: &UnprovisionRequest, _reply: &Reply) -> StoreResult<()> {
        let removed = self.instances.write().await.remove(&request.instance_id);
        if removed.is_none() {
            tracing::debug!("Instance {} was not recorded", request.instance_id);
        }
        Ok(())
    }

    async fn bind(&self, request: &BindRequest, _reply: &Reply) -> StoreResult<()> {
        let mut instances = self.instances.write().await;
        let instance = instances
            .get_mut(&request.instance_id)
            .ok_or_else(|| StoreError::NotFound(format!("instance {}", request.instance_id)))?;
        if !instance.bindings.contains(&request.binding_id) {
            instance.bindings.push(request.binding_id.clone());
        }
        Ok(())
    }

    async fn unbind(&self, request: &UnbindRequest, _reply: &Reply) -> StoreResult<()> {
        if let Some(instance) = self.instances.write().await.get_mut(&request.instance_id) {
            instance.bindings.retain(|id| id != &request.binding_id);
        }
        Ok(())
    }

    async fn get_all_instances(&self) -> StoreResult<Vec<InstanceRecord>> {
        let mut instances: Vec<InstanceRecord> =
            self.instances.read().await.values().cloned().collect();
        instances.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.instance_id.cmp(&b.instance_id))
        });
        Ok(instances)
    }

    fn backend_name(&self) -> &'static str {
        MEMORY_BACKEND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provision_request(id: &str) -> ProvisionRequest {
        ProvisionRequest {
            instance_id: id.to_string(),
            service_id: "s1".to_string(),
            organization_guid: "o1".to_string(),
            space_guid: "sp1".to_string(),
            plan_id: Some("p1".to_string()),
            parameters: None,
        }
    }

    fn bind_request(instance: &str, binding: &str) -> BindRequest {
        BindRequest {
            instance_id: instance.to_string(),
            binding_id: binding.to_string(),
            service_id: None,
            plan_id: None,
            app_guid: None,
            parameters: None,
        }
    }

    #[tokio::test]
    async fn test_provision_and_unprovision() {
        let store = MemoryStore::new();
        let reply = Reply::new().with_dashboard_url("http://dash");
        store.provision(&provision_request("i1"), &reply).await.unwrap();
        store.provision(&provision_request("i2"), &Reply::default()).await.unwrap();

        let instances = store.get_all_instances().await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].dashboard_url.as_deref(), Some("http://dash"));

        let unprovision = UnprovisionRequest {
            instance_id: "i1".to_string(),
            service_id: None,
            plan_id: None,
        };
        store.unprovision(&unprovision, &Reply::default()).await.unwrap();
        assert_eq!(store.get_all_instances().await.unwrap().len(), 1);

        // 已經不存在也不算錯誤
        store.unprovision(&unprovision, &Reply::does_not_exist()).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_provision_conflicts() {
        let store = MemoryStore::new();
        store.provision(&provision_request("i1"), &Reply::default()).await.unwrap();
        let err = store
            .provision(&provision_request("i1"), &Reply::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bind_and_unbind() {
        let store = MemoryStore::new();
        store.provision(&provision_request("i1"), &Reply::default()).await.unwrap();
        store.bind(&bind_request("i1", "b1"), &Reply::default()).await.unwrap();
        store.bind(&bind_request("i1", "b1"), &Reply::default()).await.unwrap();
        assert_eq!(store.get_all_instances().await.unwrap()[0].bindings, vec!["b1"]);

        let unbind = UnbindRequest {
            instance_id: "i1".to_string(),
            binding_id: "b1".to_string(),
            service_id: None,
            plan_id: None,
        };
        store.unbind(&unbind, &Reply::default()).await.unwrap();
        assert!(store.get_all_instances().await.unwrap()[0].bindings.is_empty());
    }

    #[tokio::test]
    async fn test_bind_unknown_instance_not_found() {
        let store = MemoryStore::new();
        let err = store
            .bind(&bind_request("missing", "b1"), &Reply::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_store_from_settings() {
        let store = store_from_settings(&DatabaseSettings::default()).unwrap();
        assert_eq!(store.backend_name(), "memory");

        let settings = DatabaseSettings {
            backend: Some("mongodb".to_string()),
            ..DatabaseSettings::default()
        };
        assert!(store_from_settings(&settings).is_err());
    }
}
