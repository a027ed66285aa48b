//! Errors raised by the AWS service adapters

use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// The AWS API rejected the call
    #[error("{operation} failed ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Api {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },

    /// The call succeeded but a field we rely on was absent
    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    /// Request could not be built
    #[error("invalid {operation} request: {message}")]
    InvalidRequest {
        operation: &'static str,
        message: String,
    },

    /// Raw HTTP failure (OpenSearch Serverless)
    #[error("{operation} returned HTTP {status}: {body}")]
    Http {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Transport failure before a response arrived
    #[error("{operation} request failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// SigV4 signing failed
    #[error("failed to sign {operation} request: {message}")]
    Signing {
        operation: &'static str,
        message: String,
    },

    /// No usable AWS credentials
    #[error("AWS credentials unavailable: {0}")]
    Credentials(String),
}

impl ServiceError {
    /// Build a ServiceError from an SDK error of any operation
    pub fn from_sdk<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let code = match &err {
            SdkError::ServiceError(service_err) => service_err.err().code().map(str::to_string),
            _ => None,
        };
        let message = DisplayErrorContext(&err).to_string();

        tracing::debug!(operation, code = ?code, error = %message, "AWS API call failed");

        ServiceError::Api {
            operation,
            code,
            message,
        }
    }

    /// The API error code, if AWS returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            ServiceError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether the target resource does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::Api { code, .. } => matches!(
                code.as_deref(),
                Some("ResourceNotFoundException") | Some("EntityNotFoundException")
            ),
            ServiceError::Http { status, .. } => *status == 404,
            _ => false,
        }
    }
}
