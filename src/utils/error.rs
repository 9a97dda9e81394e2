use crate::domain::model::Operation;
use crate::domain::ports::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Options not supplied to the broker: expected an object, found {found}")]
    NotAnObject { found: String },

    #[error("Missing options: {}", .keys.join(", "))]
    MissingOptions { keys: Vec<String> },

    #[error("Missing service options: {}", .keys.join(", "))]
    MissingServiceOptions { keys: Vec<String> },

    #[error("Mismatched options: {}", .keys.join(", "))]
    MismatchedOptions { keys: Vec<String> },

    #[error("Invalid apiVersion '{version}': {reason}")]
    InvalidApiVersion { version: String, reason: String },

    #[error("Unsupported service API version: {version}")]
    UnsupportedVersion { version: String },

    #[error("Invalid PORT override '{value}'")]
    InvalidPortOverride { value: String },

    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },

    #[error("Unknown store backend: {backend}")]
    UnknownStoreBackend { backend: String },

    #[error("A handler is already registered for the \"{operation}\" event")]
    HandlerAlreadyRegistered { operation: Operation },

    #[error("{operation} request is missing the options: {}", .missing.join(", "))]
    Validation {
        operation: Operation,
        missing: Vec<String>,
    },

    #[error("Malformed {operation} request body: {message}")]
    MalformedBody {
        operation: Operation,
        message: String,
    },

    #[error("Invalid auth credentials")]
    Unauthorized,

    #[error("{} not implemented on this broker. {version}", .operation.gerund())]
    NotImplemented { operation: Operation, version: String },

    #[error("Internal error: {message}")]
    InternalReply { message: String },

    #[error("The {operation} handler finished without completing the request")]
    ExtensionAbandoned { operation: Operation },

    #[error("Store {operation} failed: {source}")]
    Persist {
        operation: String,
        #[source]
        source: StoreError,
    },

    #[error("Response already written")]
    ResponseAlreadyWritten,
}

impl BrokerError {
    /// 啟動階段的致命錯誤，broker 不會被建立
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BrokerError::NotAnObject { .. }
                | BrokerError::MissingOptions { .. }
                | BrokerError::MissingServiceOptions { .. }
                | BrokerError::MismatchedOptions { .. }
                | BrokerError::InvalidApiVersion { .. }
                | BrokerError::UnsupportedVersion { .. }
                | BrokerError::InvalidPortOverride { .. }
                | BrokerError::InvalidOptions { .. }
                | BrokerError::UnknownStoreBackend { .. }
                | BrokerError::TomlError(_)
        )
    }

    pub(crate) fn persist(operation: &str, source: StoreError) -> Self {
        BrokerError::Persist {
            operation: operation.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_options_lists_every_key() {
        let err = BrokerError::MissingOptions {
            keys: vec!["name".to_string(), "port".to_string()],
        };
        assert_eq!(err.to_string(), "Missing options: name, port");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_not_implemented_mentions_version() {
        let err = BrokerError::NotImplemented {
            operation: Operation::Provision,
            version: "v2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Provisioning not implemented on this broker. v2"
        );
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_validation_message() {
        let err = BrokerError::Validation {
            operation: Operation::Provision,
            missing: vec!["space_guid".to_string(), "service_id".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "provision request is missing the options: space_guid, service_id"
        );
    }
}
