//! AWS error classification
//!
//! SDK errors are classified by their `.code()` / `.message()` metadata
//! rather than by matching on Debug output.

use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use proxystack_cloud::CloudError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AwsError {
    /// The named stack does not exist
    #[error("Stack not found: {0}")]
    StackNotFound(String),

    /// The account has no default VPC in this region
    #[error("No default VPC found in {0}")]
    NoDefaultVpc(String),

    /// Generic AWS SDK error with code and message
    #[error("AWS error ({operation}): {message}")]
    Sdk {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Classify an SDK error from `operation`
    pub fn from_sdk<E>(operation: &'static str, err: &E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        classify(
            operation,
            err.code(),
            err.message(),
            || DisplayErrorContext(err).to_string(),
        )
    }

    pub fn is_stack_not_found(&self) -> bool {
        matches!(self, AwsError::StackNotFound(_))
    }
}

/// CloudFormation reports a missing stack as a generic ValidationError
pub(crate) fn classify(
    operation: &'static str,
    code: Option<&str>,
    message: Option<&str>,
    fallback: impl FnOnce() -> String,
) -> AwsError {
    match (code, message) {
        (Some("ValidationError"), Some(m)) if m.contains("does not exist") => {
            AwsError::StackNotFound(m.to_string())
        }
        _ => AwsError::Sdk {
            operation,
            code: code.map(str::to_string),
            message: message.map(str::to_string).unwrap_or_else(fallback),
        },
    }
}

impl From<AwsError> for CloudError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::StackNotFound(message) => CloudError::StackNotFound(message),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
