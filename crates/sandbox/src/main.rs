//! Sandbox entry point.

use sandbox::{Config, LogFormat, SandboxError, World};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), SandboxError> {
    let config = Config::from_env();

    // 1. Initialize tracing
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| SandboxError::Metrics(e.to_string()))?;

    // 3. Seed the world and wire the coordinator
    let world = World::seeded();
    let coordinator = sandbox::create_coordinator(&config, &world)?;

    // 4. Run the scripted scenarios
    for outcome in sandbox::run_all(&coordinator, &world).await {
        tracing::info!(
            scenario = outcome.scenario,
            outcome = %outcome.outcome,
            detail = %outcome.detail,
            "scenario finished"
        );
    }
    tracing::info!(
        orders = world.repository.record_count(),
        events = world.publisher.event_count(),
        held = world.pool.held_count(),
        "sandbox run complete"
    );

    // 5. Dump the scrape text
    println!("{}", metrics_handle.render());
    Ok(())
}
