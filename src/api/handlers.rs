use crate::api::error::ApiError;
use crate::api::AppState;
use crate::core::orchestrator::{self, BrokerResponse};
use crate::domain::model::{
    BindRequest, BrokerRequest, Operation, ProvisionRequest, UnbindRequest, UnprovisionRequest,
};
use crate::utils::error::BrokerError;
use crate::utils::validation::missing_fields;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// 必填欄位先收成 `Value`，類型不對時才能照欄位名稱回報
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProvisionBody {
    service_id: Option<Value>,
    plan_id: Option<String>,
    organization_guid: Option<Value>,
    space_guid: Option<Value>,
    parameters: Option<Value>,
}

/// 不是字串就當成沒給
fn text(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BindBody {
    service_id: Option<String>,
    plan_id: Option<String>,
    app_guid: Option<String>,
    parameters: Option<Value>,
}

/// DELETE 請求透過 query string 帶 service_id / plan_id
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlanQuery {
    service_id: Option<String>,
    plan_id: Option<String>,
}

impl IntoResponse for BrokerResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// 空的 body 視為 `{}`
fn parse_body<T>(operation: Operation, body: &Bytes) -> Result<T, BrokerError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| BrokerError::MalformedBody {
        operation,
        message: e.to_string(),
    })
}

/// 欄位都檢查過才會走到這裡：先派給擴充處理器，再跑後續步驟
async fn run_operation(state: &AppState, request: BrokerRequest) -> Result<Response, ApiError> {
    let reply = state
        .registry
        .dispatch(request.clone(), state.protocol.label())
        .await?;
    let outcome = orchestrator::complete(state.store.as_ref(), &request, reply).await?;
    if let Some(err) = outcome.deferred_error {
        tracing::error!(
            error = ?err,
            "{} for instance {} failed after the response was written",
            request.operation(),
            request.instance_id()
        );
    }
    Ok(outcome.response.into_response())
}

pub(crate) async fn catalog(State(state): State<AppState>) -> Json<Value> {
    tracing::debug!("Catalog request for broker '{}'", state.config.name);
    Json(json!({ "services": state.config.services }))
}

pub(crate) async fn provision(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    tracing::info!("Processing provision request {}", instance_id);
    let body: ProvisionBody = parse_body(Operation::Provision, &body)?;
    tracing::debug!(?body, "provision params");

    let missing = missing_fields(&[
        ("instance_id", Some(instance_id.as_str())),
        ("space_guid", text(&body.space_guid)),
        ("organization_guid", text(&body.organization_guid)),
        ("service_id", text(&body.service_id)),
    ]);
    if !missing.is_empty() {
        return Err(BrokerError::Validation {
            operation: Operation::Provision,
            missing,
        }
        .into());
    }

    let request = BrokerRequest::Provision(ProvisionRequest {
        service_id: text(&body.service_id).unwrap_or_default().to_string(),
        organization_guid: text(&body.organization_guid)
            .unwrap_or_default()
            .to_string(),
        space_guid: text(&body.space_guid).unwrap_or_default().to_string(),
        instance_id,
        plan_id: body.plan_id,
        parameters: body.parameters,
    });
    run_operation(&state, request).await
}

pub(crate) async fn unprovision(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<PlanQuery>,
) -> Result<Response, ApiError> {
    let missing = missing_fields(&[("instance_id", Some(instance_id.as_str()))]);
    if !missing.is_empty() {
        tracing::warn!(
            "Discarding unprovision request from the cloud controller - missing \"id\" parameter"
        );
        return Err(BrokerError::Validation {
            operation: Operation::Unprovision,
            missing,
        }
        .into());
    }

    tracing::info!("Unprovision request for service instance {}", instance_id);
    let request = BrokerRequest::Unprovision(UnprovisionRequest {
        instance_id,
        service_id: query.service_id,
        plan_id: query.plan_id,
    });
    run_operation(&state, request).await
}

pub(crate) async fn bind(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    tracing::info!(
        "Bind request {} for service instance {}",
        binding_id,
        instance_id
    );
    let body: BindBody = parse_body(Operation::Bind, &body)?;

    let request = BrokerRequest::Bind(BindRequest {
        instance_id,
        binding_id,
        service_id: body.service_id,
        plan_id: body.plan_id,
        app_guid: body.app_guid,
        parameters: body.parameters,
    });
    run_operation(&state, request).await
}

pub(crate) async fn unbind(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Query(query): Query<PlanQuery>,
) -> Result<Response, ApiError> {
    tracing::info!(
        "Unbind request {} for service instance {}",
        binding_id,
        instance_id
    );
    let request = BrokerRequest::Unbind(UnbindRequest {
        instance_id,
        binding_id,
        service_id: query.service_id,
        plan_id: query.plan_id,
    });
    run_operation(&state, request).await
}
