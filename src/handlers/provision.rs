//! Custom resource handler for agent provisioning

use crate::custom_resource::{
    complete, CustomResourceRequest, HandlerOutput, HttpResponseSender, InvocationContext,
    LambdaResponse, RequestType, ResponseSender,
};
use crate::error::ProvisionError;
use crate::provisioner::{requested_steps, Provisioner};
use crate::services::{AgentApi, CrawlerApi};
use crate::waiter::{Sleeper, TokioSleeper};

pub struct ProvisionHandler<G, A, S = TokioSleeper, R = HttpResponseSender> {
    provisioner: Provisioner<G, A, S>,
    sender: R,
}

impl<G, A, S, R> ProvisionHandler<G, A, S, R>
where
    G: CrawlerApi,
    A: AgentApi,
    S: Sleeper,
    R: ResponseSender,
{
    pub fn new(provisioner: Provisioner<G, A, S>, sender: R) -> Self {
        Self {
            provisioner,
            sender,
        }
    }

    pub fn provisioner(&self) -> &Provisioner<G, A, S> {
        &self.provisioner
    }

    pub fn sender(&self) -> &R {
        &self.sender
    }

    /// Handle one request and report the result to CloudFormation
    pub async fn handle(
        &self,
        request: &CustomResourceRequest,
        context: &InvocationContext,
    ) -> LambdaResponse {
        tracing::info!(
            request_type = %request.request_type,
            logical_resource_id = %request.logical_resource_id,
            stack_id = %request.stack_id,
            "Received custom resource request"
        );

        let result = self.dispatch(request, context).await;
        complete(&self.sender, request, context, result).await
    }

    async fn dispatch(
        &self,
        request: &CustomResourceRequest,
        context: &InvocationContext,
    ) -> Result<HandlerOutput, ProvisionError> {
        match request.request_type {
            RequestType::Create => {
                let steps = requested_steps(&request.resource_properties)?
                    .unwrap_or_else(|| self.provisioner.default_steps());
                let summary = self.provisioner.provision(&steps, context).await?;
                Ok(summary.to_output())
            }
            RequestType::Update => {
                tracing::info!("Update requires no action");
                Ok(HandlerOutput::empty())
            }
            RequestType::Delete => {
                let deleted = self.provisioner.teardown().await?;
                Ok(HandlerOutput::empty().with("DeletedAliasCount", deleted.len()))
            }
        }
    }
}
