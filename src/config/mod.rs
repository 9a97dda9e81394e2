#[cfg(feature = "cli")]
pub mod cli;
pub mod file;

use crate::domain::model::BrokerConfig;
use crate::utils::error::{BrokerError, Result};
use crate::utils::validation::{check_schema, describe_kind, OptionKind, Schema, SchemaReport};
use serde_json::Value;
use std::collections::HashMap;

/// 頂層必要設定
pub const REQUIRED_OPTIONS: Schema = &[
    ("apiVersion", OptionKind::String),
    ("authUser", OptionKind::String),
    ("authPassword", OptionKind::String),
    ("database", OptionKind::Object),
    ("name", OptionKind::String),
    ("port", OptionKind::Number),
    ("services", OptionKind::Array),
];

/// 每個 service 的必要設定
pub const REQUIRED_SERVICE_OPTIONS: Schema = &[("plans", OptionKind::Array)];

/// 每個 plan 的必要設定
pub const REQUIRED_PLAN_OPTIONS: Schema = &[("id", OptionKind::String)];

pub const PORT_ENV: &str = "PORT";

/// 啟動時擷取的環境變數快照，明確傳入而不是在建構過程中讀取全域狀態
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// PORT 有設定時優先於設定檔
    pub fn port_override(&self) -> Result<Option<u16>> {
        match self.get(PORT_ENV).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<u16>()
                .map(Some)
                .map_err(|_| BrokerError::InvalidPortOverride {
                    value: raw.to_string(),
                }),
        }
    }
}

/// 檢查設定文件是否符合 schema。
///
/// 缺少的頂層欄位優先回報；頂層完整時才回報 service/plan 層級缺少的欄位，
/// 最後才是類型不符的欄位。每一類錯誤都會列出全部的欄位。
pub fn validate_options(options: &Value) -> Result<()> {
    let object = options.as_object().ok_or_else(|| BrokerError::NotAnObject {
        found: describe_kind(options).to_string(),
    })?;

    let top = check_schema(object, REQUIRED_OPTIONS, "");
    if !top.missing.is_empty() {
        return Err(BrokerError::MissingOptions { keys: top.missing });
    }

    let mut nested = SchemaReport::default();
    if let Some(services) = object.get("services").and_then(Value::as_array) {
        for (index, service) in services.iter().enumerate() {
            nested.merge(check_service(index, service));
        }
    }
    if !nested.missing.is_empty() {
        return Err(BrokerError::MissingServiceOptions {
            keys: nested.missing,
        });
    }

    let mut mismatched = top.mismatched;
    mismatched.extend(nested.mismatched);
    if !mismatched.is_empty() {
        return Err(BrokerError::MismatchedOptions { keys: mismatched });
    }

    Ok(())
}

fn check_service(index: usize, service: &Value) -> SchemaReport {
    let prefix = format!("services[{}].", index);
    let Some(object) = service.as_object() else {
        return SchemaReport {
            missing: Vec::new(),
            mismatched: vec![format!("services[{}] (expected object)", index)],
        };
    };

    let mut report = check_schema(object, REQUIRED_SERVICE_OPTIONS, &prefix);
    if let Some(plans) = object.get("plans").and_then(Value::as_array) {
        for (plan_index, plan) in plans.iter().enumerate() {
            let plan_prefix = format!("{}plans[{}].", prefix, plan_index);
            match plan.as_object() {
                Some(plan) => report.merge(check_schema(plan, REQUIRED_PLAN_OPTIONS, &plan_prefix)),
                None => report.mismatched.push(format!(
                    "{}plans[{}] (expected object)",
                    prefix, plan_index
                )),
            }
        }
    }
    report
}

/// 驗證設定並套用環境變數覆寫，得到最終的 `BrokerConfig`
pub fn resolve_config(options: &Value, env: &EnvSnapshot) -> Result<BrokerConfig> {
    validate_options(options)?;

    let mut config: BrokerConfig =
        serde_json::from_value(options.clone()).map_err(|e| BrokerError::InvalidOptions {
            message: e.to_string(),
        })?;

    if let Some(port) = env.port_override()? {
        tracing::debug!(configured = config.port, port, "PORT environment overrides configured port");
        config.port = port;
    }

    Ok(config)
}
