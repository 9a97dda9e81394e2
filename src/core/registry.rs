use crate::core::completion::Completion;
use crate::domain::model::{BrokerRequest, Operation, Reply};
use crate::utils::error::{BrokerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// 外部提供的 provision/bind 邏輯。
///
/// 處理器必須剛好呼叫一次 `completion.complete(..)`（或 `complete_empty()`）。
/// 可以在回傳前完成，也可以把 `completion` 交給其他 task 稍後完成。
#[async_trait]
pub trait ExtensionHandler: Send + Sync {
    async fn handle(&self, request: BrokerRequest, completion: Completion);
}

#[async_trait]
impl<F> ExtensionHandler for F
where
    F: Fn(BrokerRequest, Completion) + Send + Sync,
{
    async fn handle(&self, request: BrokerRequest, completion: Completion) {
        (self)(request, completion)
    }
}

/// 操作名稱 → 處理器。每個操作最多一個處理器
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    handlers: HashMap<Operation, Arc<dyn ExtensionHandler>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler<H>(&mut self, operation: Operation, handler: H) -> Result<()>
    where
        H: ExtensionHandler + 'static,
    {
        if self.handlers.contains_key(&operation) {
            return Err(BrokerError::HandlerAlreadyRegistered { operation });
        }
        tracing::debug!("Registered extension handler for the \"{}\" event", operation);
        self.handlers.insert(operation, Arc::new(handler));
        Ok(())
    }

    pub fn has_handler(&self, operation: Operation) -> bool {
        self.handlers.contains_key(&operation)
    }

    pub fn registered_operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.has_handler(*op))
            .collect()
    }

    /// 把請求交給已註冊的處理器，等待它完成。
    ///
    /// 處理器在獨立的 task 上執行，panic 只會讓這個請求失敗。
    pub async fn dispatch(&self, request: BrokerRequest, version: &str) -> Result<Reply> {
        let operation = request.operation();
        let Some(handler) = self.handlers.get(&operation).cloned() else {
            tracing::error!("No listeners attached for the \"{}\" event", operation);
            return Err(BrokerError::NotImplemented {
                operation,
                version: version.to_string(),
            });
        };

        let (completion, pending) = Completion::channel(operation);
        tokio::spawn(async move {
            handler.handle(request, completion).await;
        });

        pending.wait().await.inspect_err(|err| {
            tracing::error!("Extension handler for \"{}\" failed: {}", operation, err);
        })
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("operations", &self.registered_operations())
            .finish()
    }
}
