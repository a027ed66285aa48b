//! Vector index Lambda
//!
//! CloudFormation custom resource that creates the k-NN index a Bedrock
//! knowledge base stores its embeddings in, and deletes it with the stack.

use agent_provisioner::{
    config::{build_aws_config, credentials_provider, VectorIndexConfig},
    custom_resource::{
        CustomResourceRequest, HttpResponseSender, InvocationContext, LAMBDA_TIME_LIMIT,
    },
    handlers::IndexHandler,
    logging::{init_tracing, LogFormat},
    operations::{OperationKind, INDEX_SETTLE_TIME},
    services::OpenSearchIndexService,
    AsyncOperationWaiter, Settings,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Settings::load()?;

    init_tracing(&settings.log_level, LogFormat::Json);

    let config = VectorIndexConfig::load()?;
    tracing::info!(
        collection = %config.collection_host,
        index = %config.index_name,
        region = %config.region,
        "Starting vector index Lambda"
    );

    let sdk_config = build_aws_config(&settings).await;
    let http = reqwest::Client::new();
    let indices = OpenSearchIndexService::new(
        http.clone(),
        config.collection_host.clone(),
        config.region.clone(),
        credentials_provider(&sdk_config)?,
    );

    let policy = settings
        .polling_policies()
        .for_operation(OperationKind::VectorIndexCreation)
        .clone();

    let worst_case = policy.worst_case_wait() + INDEX_SETTLE_TIME;
    if worst_case > LAMBDA_TIME_LIMIT {
        tracing::warn!(
            worst_case_secs = worst_case.as_secs(),
            limit_secs = LAMBDA_TIME_LIMIT.as_secs(),
            "Index creation may outlast the Lambda time limit"
        );
    }

    let handler = IndexHandler::new(
        indices,
        AsyncOperationWaiter::new(),
        policy,
        config,
        HttpResponseSender::new(http),
    );
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
