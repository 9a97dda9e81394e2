#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use service_broker::{
    BindRequest, Broker, EnvSnapshot, InstanceRecord, ProvisionRequest, Reply, Store, StoreError,
    StoreResult, UnbindRequest, UnprovisionRequest,
};
use std::sync::{Arc, Mutex};

pub const USER: &str = "u";
pub const PASSWORD: &str = "p";

pub fn sample_options() -> Value {
    json!({
        "apiVersion": "2.0.0",
        "authUser": USER,
        "authPassword": PASSWORD,
        "database": {},
        "name": "b",
        "port": 3000,
        "services": [{
            "id": "s1",
            "name": "svc",
            "description": "sample service",
            "bindable": true,
            "plans": [{ "id": "p1", "name": "free" }]
        }]
    })
}

/// 記錄每一次 Store 呼叫，可以指定某個呼叫失敗
#[derive(Clone, Default)]
pub struct RecordingStore {
    calls: Arc<Mutex<Vec<String>>>,
    fail_on: Option<&'static str>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: &'static str) -> Self {
        Self {
            calls: Arc::default(),
            fail_on: Some(call),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.fail_on == Some(call) {
            return Err(StoreError::Unexpected(anyhow::anyhow!("{} exploded", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn provision(&self, _: &ProvisionRequest, _: &Reply) -> StoreResult<()> {
        self.record("provision")
    }

    async fn unprovision(&self, _: &UnprovisionRequest, _: &Reply) -> StoreResult<()> {
        self.record("unprovision")
    }

    async fn bind(&self, _: &BindRequest, _: &Reply) -> StoreResult<()> {
        self.record("bind")
    }

    async fn unbind(&self, _: &UnbindRequest, _: &Reply) -> StoreResult<()> {
        self.record("unbind")
    }

    async fn get_all_instances(&self) -> StoreResult<Vec<InstanceRecord>> {
        self.record("getAllInstances")?;
        Ok(Vec::new())
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

pub fn broker_with(store: &RecordingStore) -> Broker {
    Broker::new(&sample_options(), &EnvSnapshot::empty(), Arc::new(store.clone()))
        .expect("sample options are valid")
}

pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
}

pub fn authed_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(USER, PASSWORD));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn read_body(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = read_body(response).await;
    serde_json::from_slice(&bytes).expect("json")
}
