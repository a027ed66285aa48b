//! Agent provisioning Lambda
//!
//! CloudFormation custom resource that brings the knowledge base and agent
//! to a query-ready state on Create and removes the agent on Delete.

use agent_provisioner::{
    config::{build_aws_config, create_bedrock_agent_client, create_glue_client, AgentResources},
    custom_resource::{
        CustomResourceRequest, HttpResponseSender, InvocationContext, LAMBDA_TIME_LIMIT,
    },
    handlers::ProvisionHandler,
    logging::{init_tracing, LogFormat},
    services::{BedrockAgentService, GlueService},
    AsyncOperationWaiter, Provisioner, Settings,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load configuration first (before logging, so we can use log_level)
    let settings = Settings::load()?;

    init_tracing(&settings.log_level, LogFormat::Json);

    tracing::info!(
        app_name = %settings.app_name,
        version = %settings.app_version,
        region = %settings.aws_region,
        "Starting provisioning Lambda"
    );

    let resources = AgentResources::load()?;
    let prompts = resources.load_prompts()?;

    let sdk_config = build_aws_config(&settings).await;
    let glue = GlueService::new(create_glue_client(&settings, &sdk_config));
    let agents = BedrockAgentService::new(create_bedrock_agent_client(&settings, &sdk_config));

    let provisioner = Provisioner::new(
        glue,
        agents,
        AsyncOperationWaiter::new(),
        settings.polling_policies(),
        resources,
        prompts,
    );

    let worst_case = provisioner.worst_case_wait(&provisioner.default_steps());
    if worst_case > LAMBDA_TIME_LIMIT {
        tracing::warn!(
            worst_case_secs = worst_case.as_secs(),
            limit_secs = LAMBDA_TIME_LIMIT.as_secs(),
            "Create sequence may outlast the Lambda time limit; late steps will be abandoned"
        );
    }

    let handler = ProvisionHandler::new(provisioner, HttpResponseSender::default());
    let handler = &handler;

    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<CustomResourceRequest>| async move {
            let (request, context) = event.into_parts();
            let context = InvocationContext::from_lambda(&context);
            Ok::<_, Error>(handler.handle(&request, &context).await)
        },
    ))
    .await
}
