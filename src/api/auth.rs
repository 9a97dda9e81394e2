use crate::api::error::ApiError;
use crate::api::AppState;
use crate::utils::error::BrokerError;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// 每個路由都要先通過固定的 Basic 帳密檢查
pub(crate) async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.auth_required() {
        return next.run(request).await;
    }

    let authorized = basic_credentials(request.headers())
        .map(|(user, password)| {
            user == state.config.auth_user && password == state.config.auth_password
        })
        .unwrap_or(false);

    if authorized {
        next.run(request).await
    } else {
        tracing::error!(
            "Invalid auth credentials for {} {}",
            request.method(),
            request.uri()
        );
        ApiError::from(BrokerError::Unauthorized).into_response()
    }
}

/// 解析 `Authorization: Basic ...`，格式不對就回傳 None
pub(crate) fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}
