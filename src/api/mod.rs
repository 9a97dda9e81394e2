pub mod auth;
pub mod error;
pub mod handlers;

use crate::core::broker::ProtocolVersion;
use crate::core::registry::ExtensionRegistry;
use crate::domain::model::BrokerConfig;
use crate::domain::ports::Store;
use axum::routing::{get, put};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// handler 共用的狀態
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BrokerConfig>,
    pub protocol: ProtocolVersion,
    pub registry: Arc<ExtensionRegistry>,
    pub store: Arc<dyn Store>,
}

pub fn build_router(state: AppState) -> Router {
    let routes = match state.protocol {
        ProtocolVersion::V2 => v2_routes(),
    };

    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
            )
        });

    routes
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ))
        .layer(trace_layer)
        .with_state(state)
}

fn v2_routes() -> Router<AppState> {
    Router::new()
        .route("/v2/catalog", get(handlers::catalog))
        .route(
            "/v2/service_instances/:instance_id",
            put(handlers::provision).delete(handlers::unprovision),
        )
        .route(
            "/v2/service_instances/:instance_id/service_bindings/:binding_id",
            put(handlers::bind).delete(handlers::unbind),
        )
}

/// 在 listener 上提供服務直到 `shutdown` 完成
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "service broker listening");
    }
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}
