pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;

pub use crate::adapters::storage::MemoryStore;
pub use crate::config::EnvSnapshot;
pub use crate::core::broker::{Broker, ProtocolVersion};
pub use crate::core::completion::Completion;
pub use crate::core::registry::{ExtensionHandler, ExtensionRegistry};
pub use crate::domain::model::{
    BindRequest, BrokerConfig, BrokerRequest, InstanceRecord, Operation, Plan, ProvisionRequest,
    Reply, ServiceDefinition, UnbindRequest, UnprovisionRequest,
};
pub use crate::domain::ports::{Store, StoreError, StoreResult};
pub use crate::utils::error::{BrokerError, Result};
