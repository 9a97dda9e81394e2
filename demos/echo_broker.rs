//! A broker whose extension handlers answer every lifecycle request locally.
//!
//! ```text
//! cargo run --example echo_broker
//! curl -u admin:secret -X PUT localhost:3000/v2/service_instances/i1 \
//!      -d '{"service_id":"echo","plan_id":"free","organization_guid":"o","space_guid":"s"}'
//! ```
use serde_json::json;
use service_broker::utils::logger;
use service_broker::{Broker, BrokerRequest, Completion, EnvSnapshot, Operation, Reply};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_cli_logger(true);

    let options = json!({
        "apiVersion": "2.0.0",
        "authUser": "admin",
        "authPassword": "secret",
        "database": { "backend": "memory" },
        "name": "echo-broker",
        "port": 3000,
        "services": [{
            "id": "echo",
            "name": "echo",
            "description": "Hands out fake credentials",
            "bindable": true,
            "plans": [{ "id": "free", "name": "free", "description": "Free plan" }]
        }]
    });

    let env = EnvSnapshot::from_process();
    let mut broker = Broker::from_options(&options, &env)?;

    broker.register_handler(Operation::Provision, |request: BrokerRequest, done: Completion| {
        let url = format!("http://localhost:3000/dashboard/{}", request.instance_id());
        done.complete(Reply::new().with_dashboard_url(url));
    })?;

    broker.register_handler(Operation::Unprovision, |_: BrokerRequest, done: Completion| {
        done.complete_empty();
    })?;

    broker.register_handler(Operation::Bind, |request: BrokerRequest, done: Completion| {
        // 模擬非同步的憑證產生
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            done.complete(Reply::new().with_credentials(json!({
                "instance": request.instance_id(),
                "username": "echo",
                "password": "echo",
            }))
            .with_field("syslog_drain_url", json!("syslog://localhost:514")));
        });
    })?;

    broker.register_handler(Operation::Unbind, |_: BrokerRequest, done: Completion| {
        done.complete_empty();
    })?;

    let addr = SocketAddr::from(([127, 0, 0, 1], broker.config().port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    service_broker::api::serve(listener, broker.into_router(), async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}
