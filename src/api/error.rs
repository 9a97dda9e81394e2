use crate::utils::error::BrokerError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub description: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
    pub close_connection: bool,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, description: String) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: code.to_string(),
                description,
            },
            close_connection: false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if self.close_connection {
            let headers = response.headers_mut();
            headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
            headers.insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"service-broker\""),
            );
        }
        response
    }
}

/// 請求層級的錯誤在這裡轉成狀態碼和 `{"error", "description"}`
impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        match &err {
            BrokerError::Validation { .. } | BrokerError::MalformedBody { .. } => {
                tracing::warn!("{}", err);
                ApiError::new(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
            }
            BrokerError::Unauthorized => {
                let mut api = ApiError::new(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    err.to_string(),
                );
                api.close_connection = true;
                api
            }
            BrokerError::NotImplemented { operation, version } => {
                tracing::error!(
                    operation = %operation,
                    version = %version,
                    "no extension handler registered"
                );
                ApiError::new(StatusCode::NOT_IMPLEMENTED, "not_implemented", err.to_string())
            }
            BrokerError::InternalReply { .. } | BrokerError::ExtensionAbandoned { .. } => {
                tracing::error!(error = %err, "extension reply rejected");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal error".to_string(),
                )
            }
            BrokerError::Persist { .. } => {
                tracing::error!(error = ?err, "broker storage error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal error".to_string(),
                )
            }
            _ => {
                tracing::error!(error = %err, "unexpected broker error");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal error".to_string(),
                )
            }
        }
    }
}
