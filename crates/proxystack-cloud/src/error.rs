//! Stack declaration and deployment error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Boot script unavailable: {}: {source}", path.display())]
    ResourceFileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Boot script template error: {}: {message}", path.display())]
    UserDataTemplate { path: PathBuf, message: String },

    #[error("Access policy scope violation: {0}")]
    PolicyScope(String),

    #[error("Cloud assembly error: {}: {message}", path.display())]
    Assembly { path: PathBuf, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Change set failed: {0}")]
    ChangeSetFailed(String),

    #[error("Deployment failed: {0}")]
    DeployFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
