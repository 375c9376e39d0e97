use crate::{
    aws_integration::load_sdk_config,
    cli::args::{GateArgs, InvokeArgs},
    core::{
        clock::{Clock, FixedClock, SystemClock},
        gate, ConfigLoader, RelayConfig,
    },
    handler::{build_workflow, handle_invocation},
    logging::{self, config::LoggingConfig, ExecutionContext, LoggingGuard, RunLogSink},
    Result,
};
use anyhow::{anyhow, Context};
use aws_config::SdkConfig;
use aws_lambda_events::event::s3::S3Event;
use aws_sdk_cloudwatchlogs::Client as CloudWatchLogsClient;
use lambda_runtime::{service_fn, LambdaEvent};
use std::fs;
use std::sync::Arc;

/// Serve invocations from the Lambda runtime API until the runtime shuts down.
pub async fn lambda(context: ExecutionContext) -> Result<()> {
    let sdk_config = load_sdk_config().await;
    let logs = Arc::new(init_logging(context, &sdk_config)?);

    let config = ConfigLoader::load()?;
    tracing::info!(
        bucket = %config.bucket,
        prefix = %config.prefix,
        weekend_alert = config.weekend_alert,
        utc_offset_hours = config.utc_offset_hours,
        "Relay configured"
    );
    let workflow = Arc::new(build_workflow(config, &sdk_config, Arc::new(SystemClock))?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<S3Event>| {
        let workflow = Arc::clone(&workflow);
        let logs = Arc::clone(&logs);
        async move {
            handle_invocation(
                &workflow,
                Some(logs.as_ref() as &dyn RunLogSink),
                &event.payload,
                &event.context.request_id,
            )
            .await
            .map(|_| ())
            .map_err(lambda_runtime::Error::from)
        }
    }))
    .await
    .map_err(|err| anyhow!("lambda runtime stopped: {}", err))
}

/// Replay a saved S3 event once and print the outcome.
pub async fn invoke(args: InvokeArgs, context: ExecutionContext) -> Result<()> {
    let sdk_config = load_sdk_config().await;
    let logs = init_logging(context, &sdk_config)?;

    let raw = fs::read_to_string(&args.event)
        .with_context(|| format!("failed to read event file {}", args.event.display()))?;
    let event: S3Event = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not an S3 event notification", args.event.display()))?;

    let config = ConfigLoader::load()?;
    let clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(FixedClock::new(now)),
        None => Arc::new(SystemClock),
    };
    let workflow = build_workflow(config, &sdk_config, clock)?;

    let request_id = format!("local-{}", uuid::Uuid::new_v4());
    let outcome = handle_invocation(
        &workflow,
        Some(&logs as &dyn RunLogSink),
        &event,
        &request_id,
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Print the gate decision for an instant without touching any AWS resource.
pub fn gate(args: GateArgs) -> Result<()> {
    let mut config = RelayConfig::default();
    ConfigLoader::apply_env_overrides(&mut config);
    if let Some(weekend_alert) = args.weekend_alert {
        config.weekend_alert = weekend_alert;
    }
    let offset = config.utc_offset().ok_or_else(|| {
        anyhow!(
            "UTC offset of {} hours is out of range",
            config.utc_offset_hours
        )
    })?;

    let instant = match args.now {
        Some(now) => FixedClock::new(now).now(),
        None => SystemClock.now(),
    };
    let local = instant.with_timezone(&offset);
    let decision = gate::evaluate(&local, config.weekend_alert);

    println!(
        "{} ({}, weekend_alert={}): {:?}",
        local.to_rfc3339(),
        local.format("%A"),
        config.weekend_alert,
        decision
    );
    Ok(())
}

/// Print the supported environment variables.
pub fn env() -> Result<()> {
    for line in ConfigLoader::env_var_documentation() {
        println!("{}", line);
    }
    Ok(())
}

fn init_logging(context: ExecutionContext, sdk_config: &SdkConfig) -> Result<LoggingGuard> {
    let config = LoggingConfig::load()?;
    let cloudwatch_client = config
        .log_group
        .as_ref()
        .map(|_| CloudWatchLogsClient::new(sdk_config));
    logging::init(&config, context, cloudwatch_client)
}
