use crate::domain::model::{BrokerRequest, Operation, Reply};
use crate::domain::ports::Store;
use crate::utils::error::{BrokerError, Result};
use axum::http::StatusCode;
use serde_json::Value;

/// 擴充處理器完成後要依序執行的步驟
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 呼叫 Store 記錄這次的狀態變更
    Persist,
    /// 重新查詢實例總數，只用於日誌
    CountInstances,
    /// 寫出回應；`with_body` 為 false 時只有狀態碼
    Respond { status: StatusCode, with_body: bool },
}

/// 寫出去的回應
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

/// 只能寫一次的回應槽
#[derive(Debug, Default)]
pub struct ResponseSlot {
    written: Option<BrokerResponse>,
}

impl ResponseSlot {
    pub fn write(&mut self, response: BrokerResponse) -> Result<()> {
        if self.written.is_some() {
            return Err(BrokerError::ResponseAlreadyWritten);
        }
        self.written = Some(response);
        Ok(())
    }

    pub fn is_written(&self) -> bool {
        self.written.is_some()
    }

    pub fn take(self) -> Option<BrokerResponse> {
        self.written
    }
}

/// 執行結果。回應寫出之後才失敗的步驟記在 `deferred_error`，
/// 已寫出的回應不會被取代
#[derive(Debug)]
pub struct Orchestrated {
    pub response: BrokerResponse,
    pub deferred_error: Option<BrokerError>,
}

/// 依照操作與回覆決定步驟順序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPlan {
    operation: Operation,
    steps: Vec<Step>,
}

impl StepPlan {
    pub fn for_reply(operation: Operation, reply: &Reply) -> Result<Self> {
        let respond = |status| Step::Respond {
            status,
            with_body: true,
        };
        let steps = match operation {
            Operation::Provision if reply.exists => vec![Step::Respond {
                status: StatusCode::CONFLICT,
                with_body: false,
            }],
            Operation::Provision => vec![
                Step::Persist,
                Step::CountInstances,
                respond(StatusCode::CREATED),
            ],
            Operation::Unprovision => {
                let status = if reply.does_not_exist {
                    StatusCode::GONE
                } else {
                    StatusCode::OK
                };
                vec![Step::Persist, Step::CountInstances, respond(status)]
            }
            Operation::Bind => {
                if !reply.has_credentials() {
                    tracing::error!(
                        "Cannot reply to bind request without the \"credentials\" field supplied"
                    );
                    return Err(BrokerError::InternalReply {
                        message: "bind reply is missing credentials".to_string(),
                    });
                }
                vec![respond(StatusCode::CREATED), Step::Persist]
            }
            Operation::Unbind => vec![respond(StatusCode::OK), Step::Persist],
        };
        Ok(Self { operation, steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// 依序執行每個步驟，遇到第一個失敗就停止
    pub async fn execute(
        &self,
        store: &dyn Store,
        request: &BrokerRequest,
        reply: &Reply,
    ) -> Result<Orchestrated> {
        let mut slot = ResponseSlot::default();

        for step in &self.steps {
            if let Err(err) = self.run_step(*step, store, request, reply, &mut slot).await {
                return match slot.take() {
                    Some(response) => Ok(Orchestrated {
                        response,
                        deferred_error: Some(err),
                    }),
                    None => Err(err),
                };
            }
        }

        let response = slot.take().ok_or_else(|| BrokerError::InternalReply {
            message: format!("{} finished without writing a response", self.operation),
        })?;
        Ok(Orchestrated {
            response,
            deferred_error: None,
        })
    }

    async fn run_step(
        &self,
        step: Step,
        store: &dyn Store,
        request: &BrokerRequest,
        reply: &Reply,
        slot: &mut ResponseSlot,
    ) -> Result<()> {
        match step {
            Step::Persist => persist(store, request, reply).await,
            Step::CountInstances => {
                let instances = store
                    .get_all_instances()
                    .await
                    .map_err(|e| BrokerError::persist("getAllInstances", e))?;
                tracing::info!(
                    "There are now {} services registered to this node",
                    instances.len()
                );
                Ok(())
            }
            Step::Respond { status, with_body } => {
                let body = with_body.then(|| reply.to_body(self.operation));
                slot.write(BrokerResponse { status, body })
            }
        }
    }
}

async fn persist(store: &dyn Store, request: &BrokerRequest, reply: &Reply) -> Result<()> {
    let result = match request {
        BrokerRequest::Provision(r) => store.provision(r, reply).await,
        BrokerRequest::Unprovision(r) => store.unprovision(r, reply).await,
        BrokerRequest::Bind(r) => store.bind(r, reply).await,
        BrokerRequest::Unbind(r) => store.unbind(r, reply).await,
    };
    result.map_err(|e| BrokerError::persist(request.operation().as_str(), e))
}

/// 擴充處理器完成後的進入點：決定步驟並執行
pub async fn complete(store: &dyn Store, request: &BrokerRequest, reply: Reply) -> Result<Orchestrated> {
    let plan = StepPlan::for_reply(request.operation(), &reply)?;
    tracing::debug!("{} steps: {:?}", request.operation(), plan.steps());
    plan.execute(store, request, &reply).await
}
