mod common;

use common::sample_options;
use service_broker::config::file::load_options;
use service_broker::config::REQUIRED_OPTIONS;
use service_broker::{Broker, BrokerError, EnvSnapshot, MemoryStore, ProtocolVersion};
use std::io::Write;
use std::sync::Arc;

fn build(options: &serde_json::Value, env: &EnvSnapshot) -> service_broker::Result<Broker> {
    Broker::new(options, env, Arc::new(MemoryStore::new()))
}

#[test]
fn test_sample_configuration_selects_v2() {
    let broker = build(&sample_options(), &EnvSnapshot::empty()).unwrap();
    assert_eq!(broker.protocol(), ProtocolVersion::V2);
    assert_eq!(broker.config().port, 3000);
    assert_eq!(broker.config().services[0].id.as_deref(), Some("s1"));
}

#[test]
fn test_every_subset_of_missing_keys_is_reported_in_full() {
    let keys: Vec<&str> = REQUIRED_OPTIONS.iter().map(|(key, _)| *key).collect();

    // 每一種缺少欄位的組合都要完整列出
    for mask in 1u32..(1 << keys.len()) {
        let mut options = sample_options();
        let object = options.as_object_mut().unwrap();
        let mut expected = Vec::new();
        for (bit, key) in keys.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                object.remove(*key);
                expected.push(key.to_string());
            }
        }

        match build(&options, &EnvSnapshot::empty()) {
            Err(BrokerError::MissingOptions { keys }) => assert_eq!(keys, expected),
            Err(other) => panic!("mask {:b}: unexpected error {}", mask, other),
            Ok(_) => panic!("mask {:b}: broker should not be constructed", mask),
        }
    }
}

#[test]
fn test_service_errors_reported_after_top_level_is_complete() {
    let mut options = sample_options();
    options["services"] = serde_json::json!([{ "id": "a" }, { "id": "b" }]);
    let err = build(&options, &EnvSnapshot::empty()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing service options: services[0].plans, services[1].plans"
    );
}

#[test]
fn test_unsupported_major_version() {
    let mut options = sample_options();
    options["apiVersion"] = "1.9.0".into();
    let err = build(&options, &EnvSnapshot::empty()).unwrap_err();
    assert_eq!(err.to_string(), "Unsupported service API version: 1.9.0");
}

#[test]
fn test_port_comes_from_injected_environment() {
    let env = EnvSnapshot::from_pairs([("PORT", "9090")]);
    let broker = build(&sample_options(), &env).unwrap();
    assert_eq!(broker.config().port, 9090);
}

#[test]
fn test_broker_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
apiVersion = "2.1.0"
authUser = "admin"
authPassword = "${{BROKER_PASSWORD}}"
name = "file-broker"
port = 4000

[database]
backend = "memory"

[[services]]
id = "mysql"
name = "mysql"

[[services.plans]]
id = "small"
"#
    )
    .unwrap();

    let env = EnvSnapshot::from_pairs([("BROKER_PASSWORD", "hunter2")]);
    let options = load_options(file.path(), &env).unwrap();
    let broker = Broker::from_options(&options, &env).unwrap();

    assert_eq!(broker.config().auth_password, "hunter2");
    assert_eq!(broker.api_version().minor, 1);
    assert_eq!(broker.config().services[0].plans[0].id, "small");
}
