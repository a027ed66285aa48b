//! CLI tool to run agent provisioning steps from a workstation
//!
//! Usage:
//!   cargo run --bin provision
//!   cargo run --bin provision -- --step prepare-agent --step create-agent-alias
//!   cargo run --bin provision -- --teardown
//!
//! Reads the same environment variables (or .env file) as the Lambda.

use agent_provisioner::{
    config::{build_aws_config, create_bedrock_agent_client, create_glue_client, AgentResources},
    custom_resource::InvocationContext,
    logging::{init_tracing, LogFormat},
    services::{BedrockAgentService, GlueService},
    AsyncOperationWaiter, Provisioner, ProvisioningStep, Settings,
};
use anyhow::Result;
use clap::Parser;

/// Run agent provisioning steps against AWS
#[derive(Parser, Debug)]
#[command(name = "provision")]
#[command(about = "Run agent provisioning steps against AWS")]
struct Args {
    /// Step to run, repeatable (default: the full Create sequence)
    #[arg(long = "step", value_enum)]
    steps: Vec<ProvisioningStep>,

    /// Delete all agent aliases and the agent instead
    #[arg(long, conflicts_with = "steps")]
    teardown: bool,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Maximum status polls per step (overrides POLL_MAX_ATTEMPTS env var)
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load()?;
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(max_attempts) = args.max_attempts {
        settings.polling = settings.polling.clone().with_max_attempts(max_attempts);
        settings.polling.validate().map_err(anyhow::Error::msg)?;
    }

    init_tracing(&settings.log_level, args.log_format);

    let resources = AgentResources::load()?;
    let prompts = resources.load_prompts()?;

    let sdk_config = build_aws_config(&settings).await;
    let provisioner = Provisioner::new(
        GlueService::new(create_glue_client(&settings, &sdk_config)),
        BedrockAgentService::new(create_bedrock_agent_client(&settings, &sdk_config)),
        AsyncOperationWaiter::new(),
        settings.polling_policies(),
        resources,
        prompts,
    );

    if args.teardown {
        let agent_id = provisioner.resources().agent_id.clone();
        println!("\n🧹 Tearing down agent {}...\n", agent_id);

        let deleted = provisioner.teardown().await?;
        for alias_id in &deleted {
            println!("✅ Deleted alias: {}", alias_id);
        }
        println!("✅ Deleted agent: {}\n", agent_id);
        return Ok(());
    }

    let steps = if args.steps.is_empty() {
        provisioner.default_steps()
    } else {
        args.steps
    };

    println!("\n🚀 Running {} provisioning step(s)...\n", steps.len());

    let context = InvocationContext::local("provision-cli");
    let summary = provisioner.provision(&steps, &context).await?;

    for report in &summary.reports {
        println!(
            "✅ {} {} ({} polls, {}s waiting)",
            report.kind,
            report.handle,
            report.outcome.polls,
            report.outcome.total_delay.as_secs()
        );
    }

    println!("\n✅ Provisioning complete!\n");

    Ok(())
}
