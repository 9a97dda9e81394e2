use crate::adapters::storage::store_from_settings;
use crate::config::{resolve_config, EnvSnapshot};
use crate::core::registry::{ExtensionHandler, ExtensionRegistry};
use crate::domain::model::{BrokerConfig, Operation};
use crate::domain::ports::Store;
use crate::utils::error::{BrokerError, Result};
use semver::Version;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// 已實作的協定版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V2,
}

impl ProtocolVersion {
    pub fn label(self) -> &'static str {
        match self {
            ProtocolVersion::V2 => "v2",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// major 版本 → 協定實作
const SUPPORTED_PROTOCOLS: &[(u64, ProtocolVersion)] = &[(2, ProtocolVersion::V2)];

pub fn select_protocol(api_version: &str) -> Result<(Version, ProtocolVersion)> {
    let version = Version::parse(api_version).map_err(|e| BrokerError::InvalidApiVersion {
        version: api_version.to_string(),
        reason: e.to_string(),
    })?;

    SUPPORTED_PROTOCOLS
        .iter()
        .find(|(major, _)| *major == version.major)
        .map(|(_, protocol)| (version.clone(), *protocol))
        .ok_or_else(|| BrokerError::UnsupportedVersion {
            version: api_version.to_string(),
        })
}

/// 一個已驗證設定、已選定協定版本的 broker。
///
/// 擴充處理器必須在 `into_router` 之前註冊，之後 registry 不能再修改。
pub struct Broker {
    config: Arc<BrokerConfig>,
    api_version: Version,
    protocol: ProtocolVersion,
    registry: ExtensionRegistry,
    store: Arc<dyn Store>,
}

impl Broker {
    /// 唯一的建構入口。任何設定錯誤都不會產生 broker
    pub fn new(options: &Value, env: &EnvSnapshot, store: Arc<dyn Store>) -> Result<Self> {
        let config = resolve_config(options, env)?;
        Self::from_config(config, store)
    }

    /// 與 `new` 相同，但依照 `database` 設定建立 Store
    pub fn from_options(options: &Value, env: &EnvSnapshot) -> Result<Self> {
        let config = resolve_config(options, env)?;
        let store = store_from_settings(&config.database)?;
        Self::from_config(config, store)
    }

    fn from_config(config: BrokerConfig, store: Arc<dyn Store>) -> Result<Self> {
        let (api_version, protocol) = select_protocol(&config.api_version)?;
        tracing::info!(
            "Broker '{}' using service API {} (apiVersion {}), store backend '{}'",
            config.name,
            protocol,
            api_version,
            store.backend_name()
        );
        Ok(Self {
            config: Arc::new(config),
            api_version,
            protocol,
            registry: ExtensionRegistry::new(),
            store,
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn api_version(&self) -> &Version {
        &self.api_version
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn register_handler<H>(&mut self, operation: Operation, handler: H) -> Result<()>
    where
        H: ExtensionHandler + 'static,
    {
        self.registry.register_handler(operation, handler)
    }

    pub fn into_router(self) -> axum::Router {
        for operation in Operation::ALL {
            if !self.registry.has_handler(operation) {
                tracing::warn!(
                    "No handler registered for \"{}\"; those requests will be rejected",
                    operation
                );
            }
        }
        crate::api::build_router(crate::api::AppState {
            config: self.config,
            protocol: self.protocol,
            registry: Arc::new(self.registry),
            store: self.store,
        })
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("name", &self.config.name)
            .field("api_version", &self.api_version)
            .field("protocol", &self.protocol)
            .field("registry", &self.registry)
            .finish()
    }
}
