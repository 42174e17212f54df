use anyhow::Context;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use snapshot_replicator::{ReplicatorConfig, Response, SnapshotEvent, SnapshotReplicatorService};
use std::sync::Arc;

async fn function_handler(
    event: LambdaEvent<SnapshotEvent>,
    config: Arc<ReplicatorConfig>,
) -> Result<Response, Error> {
    let service = SnapshotReplicatorService::new(config, &event.payload.region).await;

    Ok(service.handle_event(&event.payload).await?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = Arc::new(
        ReplicatorConfig::from_env().context("failed to load snapshot replicator configuration")?,
    );

    run(service_fn(move |event| {
        function_handler(event, Arc::clone(&config))
    }))
    .await
}
