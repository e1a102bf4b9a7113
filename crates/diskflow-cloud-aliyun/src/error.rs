//! Alibaba Cloud adapter error types

use diskflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AliyunError {
    #[error("aliyun CLI not found. Please install: brew install aliyun-cli")]
    CliNotFound,

    #[error("aliyun authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("aliyun command failed: {0}")]
    CommandFailed(String),

    #[error("Unexpected response from {action}: {message}")]
    UnexpectedResponse { action: String, message: String },

    #[error("More than one instance found for id {0}")]
    AmbiguousInstance(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<AliyunError> for CloudError {
    fn from(err: AliyunError) -> Self {
        match err {
            AliyunError::AuthenticationFailed(message) => CloudError::AuthenticationFailed(message),
            other => CloudError::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AliyunError>;
