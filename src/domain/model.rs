use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 可以註冊擴充處理器的四種生命週期操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Provision,
    Unprovision,
    Bind,
    Unbind,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Provision,
        Operation::Unprovision,
        Operation::Bind,
        Operation::Unbind,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Provision => "provision",
            Operation::Unprovision => "unprovision",
            Operation::Bind => "bind",
            Operation::Unbind => "unbind",
        }
    }

    pub fn gerund(self) -> &'static str {
        match self {
            Operation::Provision => "Provisioning",
            Operation::Unprovision => "Unprovisioning",
            Operation::Bind => "Binding",
            Operation::Unbind => "Unbinding",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 啟動後不可變的 broker 設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConfig {
    pub api_version: String,
    pub auth_user: String,
    pub auth_password: String,
    pub database: DatabaseSettings,
    pub name: String,
    pub port: u16,
    pub services: Vec<ServiceDefinition>,
}

impl BrokerConfig {
    /// 帳號與密碼都是空字串時不做驗證
    pub fn auth_required(&self) -> bool {
        !self.auth_user.is_empty() || !self.auth_password.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Catalog 的一個服務。未知欄位原樣保留，catalog 回應時照樣輸出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub plans: Vec<Plan>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionRequest {
    pub instance_id: String,
    pub service_id: String,
    pub organization_guid: String,
    pub space_guid: String,
    pub plan_id: Option<String>,
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnprovisionRequest {
    pub instance_id: String,
    pub service_id: Option<String>,
    pub plan_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindRequest {
    pub instance_id: String,
    pub binding_id: String,
    pub service_id: Option<String>,
    pub plan_id: Option<String>,
    pub app_guid: Option<String>,
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnbindRequest {
    pub instance_id: String,
    pub binding_id: String,
    pub service_id: Option<String>,
    pub plan_id: Option<String>,
}

/// 交給擴充處理器的請求
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerRequest {
    Provision(ProvisionRequest),
    Unprovision(UnprovisionRequest),
    Bind(BindRequest),
    Unbind(UnbindRequest),
}

impl BrokerRequest {
    pub fn operation(&self) -> Operation {
        match self {
            BrokerRequest::Provision(_) => Operation::Provision,
            BrokerRequest::Unprovision(_) => Operation::Unprovision,
            BrokerRequest::Bind(_) => Operation::Bind,
            BrokerRequest::Unbind(_) => Operation::Unbind,
        }
    }

    pub fn instance_id(&self) -> &str {
        match self {
            BrokerRequest::Provision(r) => &r.instance_id,
            BrokerRequest::Unprovision(r) => &r.instance_id,
            BrokerRequest::Bind(r) => &r.instance_id,
            BrokerRequest::Unbind(r) => &r.instance_id,
        }
    }
}

/// 擴充處理器回傳給 broker 的結果
///
/// `exists` 只對 provision 有意義（回 409），`does_not_exist` 只對
/// unprovision 有意義（回 410）。兩個旗標不會出現在回應內容裡。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub exists: bool,
    #[serde(default, rename = "doesNotExist", skip_serializing)]
    pub does_not_exist: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, credentials: Value) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_url = Some(url.into());
        self
    }

    pub fn already_exists() -> Self {
        Self {
            exists: true,
            ..Self::default()
        }
    }

    pub fn does_not_exist() -> Self {
        Self {
            does_not_exist: true,
            ..Self::default()
        }
    }

    /// 額外欄位會原封不動放進回應內容
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// `null` 的 credentials 跟沒給一樣
    pub fn has_credentials(&self) -> bool {
        !matches!(self.credentials, None | Some(Value::Null))
    }

    /// 擴充處理器沒有給結果時使用的預設值
    pub fn default_for(_operation: Operation) -> Self {
        Self::default()
    }

    /// 轉成回應內容。provision 一律帶 `dashboard_url`（沒有就是 null）
    pub fn to_body(&self, operation: Operation) -> Value {
        let mut body = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if operation == Operation::Provision && !body.contains_key("dashboard_url") {
            body.insert("dashboard_url".to_string(), Value::Null);
        }
        Value::Object(body)
    }
}

/// Store 回報的實例狀態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance_id: String,
    pub service_id: String,
    pub plan_id: Option<String>,
    pub organization_guid: String,
    pub space_guid: String,
    pub dashboard_url: Option<String>,
    pub bindings: Vec<String>,
    pub created_at: DateTime<Utc>,
}
