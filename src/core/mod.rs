pub mod broker;
pub mod completion;
pub mod orchestrator;
pub mod registry;

pub use crate::domain::model::{BrokerRequest, Operation, Reply};
pub use crate::domain::ports::Store;
pub use crate::utils::error::Result;
