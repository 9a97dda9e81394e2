use serde_json::json;
use service_broker::{Broker, BrokerRequest, Completion, EnvSnapshot, Operation, Reply};
use tokio::sync::oneshot;

/// 真的開一個 socket，用 reqwest 走完整個生命週期
#[tokio::test]
async fn test_full_lifecycle_over_http() {
    let options = json!({
        "apiVersion": "2.0.0",
        "authUser": "admin",
        "authPassword": "secret",
        "database": { "backend": "memory" },
        "name": "e2e",
        "port": 0,
        "services": [{ "id": "s1", "name": "svc", "plans": [{ "id": "p1" }] }]
    });
    let mut broker = Broker::from_options(&options, &EnvSnapshot::empty()).unwrap();
    broker
        .register_handler(Operation::Provision, |request: BrokerRequest, done: Completion| {
            done.complete(
                Reply::new().with_dashboard_url(format!("http://dash/{}", request.instance_id())),
            );
        })
        .unwrap();
    broker
        .register_handler(Operation::Bind, |_: BrokerRequest, done: Completion| {
            done.complete(Reply::new().with_credentials(json!({ "user": "x" })));
        })
        .unwrap();
    broker
        .register_handler(Operation::Unbind, |_: BrokerRequest, done: Completion| {
            done.complete_empty();
        })
        .unwrap();
    broker
        .register_handler(Operation::Unprovision, |_: BrokerRequest, done: Completion| {
            done.complete_empty();
        })
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(service_broker::api::serve(
        listener,
        broker.into_router(),
        async move {
            let _ = stop_rx.await;
        },
    ));

    let client = reqwest::Client::new();

    let catalog = client
        .get(format!("{}/v2/catalog", base))
        .basic_auth("admin", Some("secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(catalog.status(), 200);
    let catalog: serde_json::Value = catalog.json().await.unwrap();
    assert_eq!(catalog["services"][0]["id"], "s1");

    let provision = client
        .put(format!("{}/v2/service_instances/i1", base))
        .basic_auth("admin", Some("secret"))
        .json(&json!({
            "service_id": "s1",
            "plan_id": "p1",
            "organization_guid": "o1",
            "space_guid": "sp1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(provision.status(), 201);
    let provision: serde_json::Value = provision.json().await.unwrap();
    assert_eq!(provision["dashboard_url"], "http://dash/i1");

    let bind = client
        .put(format!("{}/v2/service_instances/i1/service_bindings/b1", base))
        .basic_auth("admin", Some("secret"))
        .json(&json!({ "app_guid": "app" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bind.status(), 201);

    let unbind = client
        .delete(format!("{}/v2/service_instances/i1/service_bindings/b1", base))
        .basic_auth("admin", Some("secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(unbind.status(), 200);

    let unprovision = client
        .delete(format!("{}/v2/service_instances/i1", base))
        .basic_auth("admin", Some("secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(unprovision.status(), 200);

    let anonymous = client
        .get(format!("{}/v2/catalog", base))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 401);

    drop(client);
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
