//! CloudFormation custom resource plumbing shared by the Lambda handlers
//!
//! A handler turns the request into a [`HandlerOutput`] or an error;
//! [`complete`] reports either to CloudFormation and builds the value returned
//! to the Lambda runtime. A response is sent on every path, otherwise the
//! stack waits for the resource until CloudFormation's own timeout.

pub mod event;
pub mod response;

use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::ProvisionError;
use crate::waiter::OperationKind;

pub use event::{CustomResourceRequest, RequestType};
pub use response::{CustomResourceResponse, HttpResponseSender, ResponseSender, ResponseStatus};

/// Longest a Lambda invocation may run
pub const LAMBDA_TIME_LIMIT: Duration = Duration::from_secs(15 * 60);

/// Kept free at the end of an invocation for sending the response
pub const RESPONSE_MARGIN: Duration = Duration::from_secs(10);

/// Per-invocation facts taken from the Lambda context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub log_stream_name: String,

    /// When the runtime will stop the invocation
    pub deadline: Option<SystemTime>,
}

impl InvocationContext {
    pub fn from_lambda(context: &lambda_runtime::Context) -> Self {
        Self {
            request_id: context.request_id.clone(),
            log_stream_name: context.env_config.log_stream.clone(),
            deadline: Some(UNIX_EPOCH + Duration::from_millis(context.deadline)),
        }
    }

    /// Context for runs outside Lambda (no deadline)
    pub fn local(log_stream_name: impl Into<String>) -> Self {
        Self {
            request_id: String::new(),
            log_stream_name: log_stream_name.into(),
            deadline: None,
        }
    }

    /// Time left before the deadline, `None` if unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| {
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO)
        })
    }

    /// Time work may still take while leaving [`RESPONSE_MARGIN`] to respond
    pub fn work_budget(&self) -> Option<Duration> {
        self.remaining()
            .map(|remaining| remaining.saturating_sub(RESPONSE_MARGIN))
    }

    fn log_stream_reason(&self) -> String {
        format!(
            "See the details in CloudWatch Log Stream: {}",
            self.log_stream_name
        )
    }
}

/// What a successful handler reports back in `Data`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerOutput {
    pub data: Map<String, Value>,
}

impl HandlerOutput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Value returned to the Lambda runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl LambdaResponse {
    pub fn success() -> Self {
        Self {
            status_code: 200,
            body: "Success".to_string(),
        }
    }

    pub fn failure() -> Self {
        Self {
            status_code: 500,
            body: "An error occurred during the process.".to_string(),
        }
    }
}

/// Physical id reported for the resource
///
/// Reusing the id CloudFormation already knows keeps an Update from being
/// read as a replacement.
pub fn physical_resource_id(request: &CustomResourceRequest, context: &InvocationContext) -> String {
    request
        .physical_resource_id
        .clone()
        .unwrap_or_else(|| context.log_stream_name.clone())
}

/// Run `work` unless the invocation deadline gets too close
///
/// Nothing is started once the budget is used up. Work still running when it
/// runs out is dropped and reported as [`ProvisionError::DeadlineExceeded`].
pub async fn within_deadline<T, F>(
    context: &InvocationContext,
    operation: OperationKind,
    work: F,
) -> Result<T, ProvisionError>
where
    F: Future<Output = Result<T, ProvisionError>>,
{
    let budget = match context.work_budget() {
        None => return work.await,
        Some(budget) => budget,
    };

    if budget.is_zero() {
        return Err(ProvisionError::DeadlineExceeded { operation, budget });
    }

    match tokio::time::timeout(budget, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation = %operation,
                budget_ms = budget.as_millis() as u64,
                "Abandoning operation before the invocation deadline"
            );
            Err(ProvisionError::DeadlineExceeded { operation, budget })
        }
    }
}

/// Report the handler result to CloudFormation
pub async fn complete<R>(
    sender: &R,
    request: &CustomResourceRequest,
    context: &InvocationContext,
    result: Result<HandlerOutput, ProvisionError>,
) -> LambdaResponse
where
    R: ResponseSender + ?Sized,
{
    let physical_id = physical_resource_id(request, context);

    let (response, lambda_response) = match result {
        Ok(output) => (
            CustomResourceResponse::new(
                request,
                ResponseStatus::Success,
                context.log_stream_reason(),
                physical_id,
                output.data,
            ),
            LambdaResponse::success(),
        ),
        Err(e) => {
            tracing::error!(
                request_type = %request.request_type,
                logical_resource_id = %request.logical_resource_id,
                operation = ?e.operation(),
                error = %e,
                "Custom resource request failed"
            );
            (
                CustomResourceResponse::new(
                    request,
                    ResponseStatus::Failed,
                    format!("{}. {}", e, context.log_stream_reason()),
                    physical_id,
                    Map::new(),
                ),
                LambdaResponse::failure(),
            )
        }
    };

    if let Err(e) = sender.send(&request.response_url, &response).await {
        tracing::error!(error = %e, "Could not notify CloudFormation");
        return LambdaResponse::failure();
    }

    lambda_response
}
